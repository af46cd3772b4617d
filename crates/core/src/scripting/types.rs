//! Scripting types and error definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::value::MarshalError;

/// Errors raised by an engine session.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No interpreter for the requested language version is linked in.
    #[error("interpreter not available: {requested} requested, {available} linked")]
    InterpreterNotFound { requested: EngineVariant, available: String },

    /// The session was destroyed and can no longer run code.
    #[error("engine session has been destroyed")]
    Destroyed,

    /// Error from the Lua runtime.
    #[error("Lua error: {0}")]
    Lua(#[from] mlua::Error),

    #[error(transparent)]
    Marshal(#[from] MarshalError),
}

impl EngineError {
    /// Whether this error means the run should be skipped rather than failed.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, EngineError::InterpreterNotFound { .. })
    }
}

/// Lua language version an engine run requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineVariant {
    Lua51,
    Lua52,
    Lua53,
    #[default]
    Lua54,
}

impl EngineVariant {
    pub const ALL: [EngineVariant; 4] =
        [EngineVariant::Lua51, EngineVariant::Lua52, EngineVariant::Lua53, EngineVariant::Lua54];

    /// The `_VERSION` string an interpreter of this variant reports.
    pub fn version_string(self) -> &'static str {
        match self {
            EngineVariant::Lua51 => "Lua 5.1",
            EngineVariant::Lua52 => "Lua 5.2",
            EngineVariant::Lua53 => "Lua 5.3",
            EngineVariant::Lua54 => "Lua 5.4",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EngineVariant::Lua51 => "lua51",
            EngineVariant::Lua52 => "lua52",
            EngineVariant::Lua53 => "lua53",
            EngineVariant::Lua54 => "lua54",
        }
    }
}

impl fmt::Display for EngineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EngineVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        EngineVariant::ALL.into_iter().find(|v| v.name() == wanted).ok_or_else(|| {
            format!("unknown engine variant '{s}' (expected lua51, lua52, lua53 or lua54)")
        })
    }
}

/// Configuration for the Lua sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxConfig {
    /// Maximum memory the Lua VM can allocate (in bytes). 0 = unlimited.
    pub memory_limit: usize,

    /// Maximum instructions per entry into the engine. 0 = unlimited.
    pub instruction_limit: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self::restricted()
    }
}

impl SandboxConfig {
    /// A restrictive sandbox suitable for test modules.
    pub fn restricted() -> Self {
        Self {
            memory_limit: 50 * 1024 * 1024, // 50 MB
            instruction_limit: 10_000_000,
        }
    }

    /// An unrestricted configuration (use with caution).
    pub fn unrestricted() -> Self {
        Self { memory_limit: 0, instruction_limit: 0 }
    }
}
