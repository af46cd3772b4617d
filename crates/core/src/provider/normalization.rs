//! Unicode normalization conformance cases.
//!
//! Reads the Unicode `NormalizationTest.txt` data file and checks every line
//! against the sandbox's `mw.ustring.toNFC`/`toNFD` through the
//! `UstringNormalizationTests` module.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use mlua::Value;
use tracing::debug;

use super::module::ModuleHandle;
use super::types::{Availability, NormalizationError, ProviderError};
use crate::fixtures::NORMALIZATION_MODULE;
use crate::scripting::{EngineSession, ScriptValue};

/// One data line: the five columns of the conformance file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizationCase {
    pub name: String,
    pub line: usize,
    pub columns: [String; 5],
}

impl NormalizationCase {
    /// What `run(c1..c5)` must return: the NFC forms of all five columns
    /// followed by their NFD forms, i.e. `[c2,c2,c2,c4,c4,c3,c3,c3,c5,c5]`.
    pub fn expected(&self) -> ScriptValue {
        let [_, c2, c3, c4, c5] = &self.columns;
        ScriptValue::strings([c2, c2, c2, c4, c4, c3, c3, c3, c5, c5].map(String::as_str))
    }
}

pub struct NormalizationTestProvider {
    module: ModuleHandle,
    data_file: PathBuf,
    cases: Vec<NormalizationCase>,
}

impl NormalizationTestProvider {
    /// Check whether the conformance data exists.
    pub fn available(data_file: &Path) -> Availability {
        if data_file.is_file() {
            Availability::Available
        } else {
            Availability::Unavailable(format!(
                "normalization data not found at {}",
                data_file.display()
            ))
        }
    }

    pub fn new(session: Rc<EngineSession>, data_file: &Path) -> Result<Self, ProviderError> {
        let cases = load_cases(data_file)?;
        let module = ModuleHandle::load(session, NORMALIZATION_MODULE)?;
        debug!(path = %data_file.display(), cases = cases.len(), "loaded normalization data");
        Ok(Self { module, data_file: data_file.to_path_buf(), cases })
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn cases(&self) -> std::slice::Iter<'_, NormalizationCase> {
        self.cases.iter()
    }

    /// Run the comparison protocol on five correlated columns.
    pub fn run(
        &self,
        c1: &str,
        c2: &str,
        c3: &str,
        c4: &str,
        c5: &str,
    ) -> Result<ScriptValue, ProviderError> {
        let produced: Value = self.module.call("run", (c1, c2, c3, c4, c5))?;
        ScriptValue::from_lua_value(produced).map_err(|source| ProviderError::Marshal {
            module: self.module.name().to_string(),
            source,
        })
    }

    pub fn run_case(&self, case: &NormalizationCase) -> Result<ScriptValue, ProviderError> {
        let [c1, c2, c3, c4, c5] = &case.columns;
        self.run(c1, c2, c3, c4, c5)
    }

    pub fn destroy(&self) -> Result<(), ProviderError> {
        self.module.release()
    }
}

fn load_cases(path: &Path) -> Result<Vec<NormalizationCase>, NormalizationError> {
    let text = fs::read_to_string(path)
        .map_err(|e| NormalizationError::Io { path: path.to_path_buf(), source: e })?;
    parse_cases(&text).map_err(|(line, message)| NormalizationError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    })
}

/// Parse the data file. Errors carry the 1-based line number.
fn parse_cases(text: &str) -> Result<Vec<NormalizationCase>, (usize, String)> {
    let mut part = String::from("Part0");
    let mut cases = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let (data, comment) = match raw.split_once('#') {
            Some((d, c)) => (d.trim(), c.trim()),
            None => (raw.trim(), ""),
        };
        if data.is_empty() {
            continue;
        }
        if let Some(p) = data.strip_prefix('@') {
            part = p.trim().to_string();
            continue;
        }

        let fields: Vec<&str> = data.split(';').collect();
        if fields.len() < 5 {
            return Err((line, format!("expected 5 columns, found {}", fields.len())));
        }
        let mut columns: [String; 5] = Default::default();
        for (col, field) in columns.iter_mut().zip(&fields[..5]) {
            *col = decode_column(field).map_err(|m| (line, m))?;
        }

        let name = if comment.is_empty() {
            format!("{part} line {line}")
        } else {
            format!("{part} line {line}: {comment}")
        };
        cases.push(NormalizationCase { name, line, columns });
    }

    Ok(cases)
}

/// Decode a column of space separated hex code points.
fn decode_column(field: &str) -> Result<String, String> {
    field
        .split_whitespace()
        .map(|hex| {
            u32::from_str_radix(hex, 16)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| format!("invalid code point '{hex}'"))
        })
        .collect()
}
