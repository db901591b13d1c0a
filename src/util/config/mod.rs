//! tasksys configuration
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high → low):
//! 1. CLI arguments
//! 2. Environment variables (TASKSYS_NUM_WORKERS, TASKSYS_LOG)
//! 3. Config file (--config <FILE>, TOML)
//! 4. Default values
//! ```
//!
//! # Example file
//!
//! ```toml
//! [scheduler]
//! num_workers = 8
//! thread_name_prefix = "pool"
//!
//! [log]
//! level = "debug"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runtime::scheduler::SchedulerConfig;
use crate::util::logger::LogLevel;

/// Environment variable overriding the worker count.
pub const ENV_NUM_WORKERS: &str = "TASKSYS_NUM_WORKERS";

/// Environment variable overriding the log level.
pub const ENV_LOG: &str = "TASKSYS_LOG";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Worker pool settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LogConfig {
    #[serde(default)]
    pub level: LogLevel,
}

impl AppConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load the file if given, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    pub fn apply_env_with(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(raw) = lookup(ENV_NUM_WORKERS) {
            self.scheduler.num_workers = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_NUM_WORKERS.to_string(),
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = lookup(ENV_LOG) {
            self.log.level = raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_LOG.to_string(),
                value: raw.clone(),
            })?;
        }
        Ok(())
    }

    /// Serialize to TOML text.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests;
