//! Directory backed page storage.
//!
//! This is the real resolution path the fixture resolver falls through to.
//! Pages live under `<root>/<Namespace>/<Name>.<ext>`, with spaces in names
//! stored as underscores.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use super::reference::{DocumentRef, Namespace};
use crate::resolver::{ResolveError, TemplateFetch, TemplateSource};

const REDIRECT_MARKER: &str = "#redirect";

pub struct PageStore {
    root: PathBuf,
}

impl PageStore {
    pub fn new(root: &Path) -> Result<Self, ResolveError> {
        if !root.is_dir() {
            return Err(ResolveError::MissingDir(root.display().to_string()));
        }
        Ok(Self { root: root.to_path_buf() })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, reference: &DocumentRef) -> PathBuf {
        let ns = reference.namespace();
        self.root
            .join(ns.dir_name())
            .join(format!("{}.{}", reference.db_key(), ns.extension()))
    }

    /// List every page stored in a namespace, sorted by name.
    pub fn list(&self, namespace: Namespace) -> Result<Vec<DocumentRef>, ResolveError> {
        let dir = self.root.join(namespace.dir_name());
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry =
                entry.map_err(|e| ResolveError::WalkError(dir.display().to_string(), e))?;
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(namespace.extension()) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                out.push(DocumentRef::new(namespace, stem));
            }
        }
        out.sort();
        Ok(out)
    }

    fn read(&self, reference: &DocumentRef) -> Result<Option<String>, ResolveError> {
        let path = self.path_for(reference);
        if !path.is_file() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| ResolveError::Io { path, source: e })
    }
}

impl TemplateSource for PageStore {
    fn fetch(&self, reference: &DocumentRef) -> Result<Option<TemplateFetch>, ResolveError> {
        let Some(text) = self.read(reference)? else {
            debug!(page = %reference, "page not found in store");
            return Ok(None);
        };

        let Some(target) = redirect_target(&text) else {
            return Ok(Some(TemplateFetch {
                text,
                final_ref: reference.clone(),
                deps: Vec::new(),
            }));
        };

        let target = DocumentRef::from(target);
        if target.name().is_empty() {
            return Err(ResolveError::BadRedirect(reference.to_string()));
        }

        // Only one hop is followed; a redirect to a redirect yields its text.
        Ok(self.read(&target)?.map(|text| TemplateFetch {
            text,
            final_ref: target,
            deps: vec![reference.clone()],
        }))
    }
}

/// Extract the target of a `#REDIRECT [[Target]]` first line.
fn redirect_target(text: &str) -> Option<&str> {
    let first = text.lines().next()?.trim_start();
    let head = first.get(..REDIRECT_MARKER.len())?;
    if !head.eq_ignore_ascii_case(REDIRECT_MARKER) {
        return None;
    }
    let rest = &first[REDIRECT_MARKER.len()..];
    let start = rest.find("[[")? + 2;
    let end = rest[start..].find("]]")? + start;
    Some(rest[start..end].trim())
}
