//! Configuration for the stores and the `chores` binary.
//!
//! Priority (highest first): CLI flags, the TOML config file
//! (`<config_dir>/chores/config.toml`), compiled defaults. A missing default
//! file is not an error; an explicit `--config` path that doesn't exist is.

use crate::domain::CelebrationPolicy;
use crate::ticker::{DEFAULT_COALESCE_MS, DEFAULT_REFRESH_MS};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    storage: StorageFileConfig,
    family: FamilyFileConfig,
    timer: TimerFileConfig,
    board: BoardFileConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StorageFileConfig {
    dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FamilyFileConfig {
    minimum_active: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TimerFileConfig {
    refresh_ms: Option<u64>,
    coalesce_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BoardFileConfig {
    celebration: Option<CelebrationPolicy>,
}

/// Settings the task store needs at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreConfig {
    pub celebration: CelebrationPolicy,
}

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Explicit data directory; `None` means local `.chores` or `~/.chores`
    pub data_dir: Option<PathBuf>,
    /// Active members needed for the family to count as configured
    pub family_minimum_active: usize,
    /// Countdown poll interval
    pub refresh_ms: u64,
    /// Minimum gap between two countdown recomputations
    pub coalesce_ms: u64,
    pub celebration: CelebrationPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            family_minimum_active: 1,
            refresh_ms: DEFAULT_REFRESH_MS,
            coalesce_ms: DEFAULT_COALESCE_MS,
            celebration: CelebrationPolicy::Once,
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("chores").join("config.toml"))
    }

    /// Load from `explicit`, or from the default path if it exists
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::ReadFile {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        let defaults = Self::default();

        let config = Self {
            data_dir: file.storage.dir,
            family_minimum_active: file.family.minimum_active.unwrap_or(defaults.family_minimum_active),
            refresh_ms: file.timer.refresh_ms.unwrap_or(defaults.refresh_ms),
            coalesce_ms: file.timer.coalesce_ms.unwrap_or(defaults.coalesce_ms),
            celebration: file.board.celebration.unwrap_or(defaults.celebration),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.family_minimum_active == 0 {
            return Err(ConfigError::Invalid("family.minimum_active must be at least 1".to_string()));
        }
        if self.refresh_ms == 0 || self.refresh_ms > 1000 {
            return Err(ConfigError::Invalid(format!(
                "timer.refresh_ms must be between 1 and 1000, got {}",
                self.refresh_ms
            )));
        }
        if self.coalesce_ms > self.refresh_ms {
            return Err(ConfigError::Invalid(format!(
                "timer.coalesce_ms ({}) cannot exceed timer.refresh_ms ({})",
                self.coalesce_ms, self.refresh_ms
            )));
        }
        Ok(())
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            celebration: self.celebration,
        }
    }
}
