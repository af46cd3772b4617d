use std::path::{Path, PathBuf};
use std::{env, fs};

use dirs::{data_dir, home_dir};
use shellexpand::full;
use thiserror::Error;
use tracing::debug;

use crate::config::types::{ConfigFile, ResolvedConfig};
use crate::fixtures::BUILTIN_DIR;
use crate::scripting::SandboxConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found at {0}")]
    NotFound(String),

    #[error("failed to read config file {0}: {1}")]
    ReadError(String, #[source] std::io::Error),

    #[error("failed to parse TOML in {0}: {1}")]
    ParseError(String, #[source] toml::de::Error),

    #[error("version {0} is unsupported (expected 1)")]
    BadVersion(u32),

    #[error("home directory not available to expand '{0}'")]
    NoHome(String),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the configuration.
    ///
    /// An explicit path must exist. Without one the default location is
    /// tried and built-in defaults apply when nothing is there.
    pub fn load(config_path: Option<&Path>) -> Result<ResolvedConfig, ConfigError> {
        let path = match config_path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.display().to_string()));
                }
                p.to_path_buf()
            }
            None => {
                let p = default_config_path();
                if !p.exists() {
                    debug!(path = %p.display(), "no config file, using defaults");
                    return Ok(Self::defaults());
                }
                p
            }
        };

        let s = fs::read_to_string(&path)
            .map_err(|e| ConfigError::ReadError(path.display().to_string(), e))?;

        let cf: ConfigFile = toml::from_str(&s)
            .map_err(|e| ConfigError::ParseError(path.display().to_string(), e))?;

        if cf.version != 1 {
            return Err(ConfigError::BadVersion(cf.version));
        }

        let mut resolved = Self::resolve(&cf)?;
        resolved.source = Some(path);
        Ok(resolved)
    }

    /// Settings used when no config file exists.
    pub fn defaults() -> ResolvedConfig {
        ResolvedConfig {
            source: None,
            variant: Default::default(),
            sandbox: SandboxConfig::restricted(),
            pages_root: None,
            fixtures_dir: PathBuf::from(BUILTIN_DIR),
            normalization_data: default_normalization_data(),
            logging: Default::default(),
        }
    }

    fn resolve(cf: &ConfigFile) -> Result<ResolvedConfig, ConfigError> {
        let pages_root = cf.pages.root.as_deref().map(expand_path).transpose()?;
        let fixtures_dir = match &cf.fixtures.dir {
            Some(dir) => expand_path(dir)?,
            None => PathBuf::from(BUILTIN_DIR),
        };
        let normalization_data = match &cf.normalization.data_file {
            Some(file) => expand_path(file)?,
            None => default_normalization_data(),
        };

        // Resolve log file path if present
        let mut logging = cf.logging.clone();
        if let Some(ref file) = cf.logging.file {
            logging.file = Some(expand_path(&file.to_string_lossy())?);
        }

        Ok(ResolvedConfig {
            source: None,
            variant: cf.engine.variant,
            sandbox: SandboxConfig {
                memory_limit: cf.engine.memory_limit,
                instruction_limit: cf.engine.instruction_limit,
            },
            pages_root,
            fixtures_dir,
            normalization_data,
            logging,
        })
    }
}

pub fn default_config_path() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join("wikiscript").join("config.toml");
    }
    let home = home_dir().unwrap_or_else(|| PathBuf::from("~"));
    home.join(".config").join("wikiscript").join("config.toml")
}

/// Default location of the Unicode normalization data.
/// Global location: ~/.local/share/wikiscript/NormalizationTest.txt
pub fn default_normalization_data() -> PathBuf {
    let base = data_dir()
        .or_else(|| home_dir().map(|h| h.join(".local").join("share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("wikiscript").join("NormalizationTest.txt")
}

fn expand_path(input: &str) -> Result<PathBuf, ConfigError> {
    let expanded = full(input).map_err(|_| ConfigError::NoHome(input.to_string()))?;
    Ok(PathBuf::from(expanded.to_string()))
}
