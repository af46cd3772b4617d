use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::scripting::{EngineError, MarshalError, ScriptValue};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{module}: case {key} not found ({count} cases declared)")]
    CaseNotFound { module: String, key: usize, count: usize },

    /// A fault inside sandboxed code, with the Lua traceback verbatim.
    #[error("{module}: script error: {message}")]
    Script { module: String, message: String },

    #[error("{module}: cannot marshal result: {source}")]
    Marshal {
        module: String,
        #[source]
        source: MarshalError,
    },

    #[error("{module}: {message}")]
    Protocol { module: String, message: String },

    #[error(transparent)]
    Data(#[from] NormalizationError),

    #[error(transparent)]
    Engine(EngineError),
}

impl ProviderError {
    /// Attribute an engine error to a module.
    pub(crate) fn from_engine(module: &str, err: EngineError) -> Self {
        match err {
            EngineError::Lua(e) => {
                ProviderError::Script { module: module.to_string(), message: e.to_string() }
            }
            EngineError::Marshal(e) => {
                ProviderError::Marshal { module: module.to_string(), source: e }
            }
            other => ProviderError::Engine(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum NormalizationError {
    #[error("failed to read normalization data {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    Parse { path: PathBuf, line: usize, message: String },
}

/// One case declared by a test module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCase {
    /// 1-based position in the module's declaration list.
    pub key: usize,
    pub name: String,
    pub expected: ScriptValue,
}

/// Whether an optional prerequisite of a suite is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable(String),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}
