use std::path::PathBuf;

use serde::Deserialize;

use crate::scripting::{EngineVariant, SandboxConfig};

#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    pub version: u32,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub pages: PagesConfig,
    #[serde(default)]
    pub fixtures: FixturesConfig,
    #[serde(default)]
    pub normalization: NormalizationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    #[serde(default)]
    pub variant: EngineVariant,
    /// Bytes the interpreter may allocate. 0 = unlimited.
    #[serde(default = "default_memory_limit")]
    pub memory_limit: usize,
    /// Instructions per entry into the interpreter. 0 = unlimited.
    #[serde(default = "default_instruction_limit")]
    pub instruction_limit: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            variant: EngineVariant::default(),
            memory_limit: default_memory_limit(),
            instruction_limit: default_instruction_limit(),
        }
    }
}

fn default_memory_limit() -> usize {
    SandboxConfig::restricted().memory_limit
}

fn default_instruction_limit() -> u64 {
    SandboxConfig::restricted().instruction_limit
}

/// Real page storage behind the fixture modules.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct PagesConfig {
    #[serde(default)]
    pub root: Option<String>,
}

/// Where the built-in fixture modules are read from.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct FixturesConfig {
    #[serde(default)]
    pub dir: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct NormalizationConfig {
    /// Path to the Unicode `NormalizationTest.txt` data file.
    #[serde(default)]
    pub data_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file_level: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), file_level: None, file: None }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// File the settings came from, `None` when running on defaults.
    pub source: Option<PathBuf>,
    pub variant: EngineVariant,
    pub sandbox: SandboxConfig,
    pub pages_root: Option<PathBuf>,
    pub fixtures_dir: PathBuf,
    pub normalization_data: PathBuf,
    pub logging: LoggingConfig,
}
