//! Fixture module set.
//!
//! A fixture set maps logical module names to Lua source files. The set is
//! fixed when it is built and every file is read exactly once, so the text
//! handed to the resolver is byte-identical to what is on disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Directory holding the built-in fixture modules.
pub const BUILTIN_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/lua");

/// Built-in fixture modules as (logical name, file name) pairs.
pub const BUILTIN_MODULES: &[(&str, &str)] = &[
    ("TestFramework", "TestFramework.lua"),
    ("CommonTests", "CommonTests.lua"),
    ("UstringTests", "UstringTests.lua"),
    ("UstringNormalizationTests", "UstringNormalizationTests.lua"),
];

/// Built-in modules that declare test cases through the test framework.
pub const BUILTIN_SUITES: &[&str] = &["CommonTests", "UstringTests"];

/// Module implementing the normalization comparison protocol.
pub const NORMALIZATION_MODULE: &str = "UstringNormalizationTests";

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture module {name} from {path}: {source}")]
    Io {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("fixture module {0} is declared twice")]
    Duplicate(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureModule {
    pub name: String,
    pub path: PathBuf,
    pub source: String,
}

#[derive(Debug, Clone, Default)]
pub struct FixtureSet {
    modules: Vec<FixtureModule>,
}

impl FixtureSet {
    /// The built-in fixture modules shipped with this crate.
    pub fn builtin() -> Result<Self, FixtureError> {
        Self::builtin_in(Path::new(BUILTIN_DIR))
    }

    /// The built-in module names read from another directory.
    pub fn builtin_in(dir: &Path) -> Result<Self, FixtureError> {
        BUILTIN_MODULES
            .iter()
            .fold(Self::builder(), |b, (name, file)| b.module(name, dir.join(file)))
            .build()
    }

    pub fn builder() -> FixtureSetBuilder {
        FixtureSetBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&FixtureModule> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|m| m.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct FixtureSetBuilder {
    entries: Vec<(String, PathBuf)>,
}

impl FixtureSetBuilder {
    pub fn module(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.entries.push((name.to_string(), path.into()));
        self
    }

    pub fn build(self) -> Result<FixtureSet, FixtureError> {
        let mut modules: Vec<FixtureModule> = Vec::with_capacity(self.entries.len());
        for (name, path) in self.entries {
            if modules.iter().any(|m| m.name == name) {
                return Err(FixtureError::Duplicate(name));
            }
            let source = fs::read_to_string(&path).map_err(|e| FixtureError::Io {
                name: name.clone(),
                path: path.clone(),
                source: e,
            })?;
            debug!(module = %name, path = %path.display(), "loaded fixture module");
            modules.push(FixtureModule { name, path, source });
        }
        Ok(FixtureSet { modules })
    }
}
