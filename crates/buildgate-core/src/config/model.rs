use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{BuildgateError, Result};
use crate::lock::default_lock_dir;

/// File name looked up in the working directory when no config path is given
pub const CONFIG_FILE_NAME: &str = "buildgate.toml";

/// buildgate.toml schema
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub gate: GateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GateConfig {
    /// Shared directory for lock files; every contending process must agree on it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_dir: Option<PathBuf>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            lock_dir: None,
            timeout_ms: default_timeout_ms(),
            retry_interval_ms: default_retry_interval_ms(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_retry_interval_ms() -> u64 {
    100
}

impl GateConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// Configured lock directory, or the system default
    pub fn lock_dir(&self) -> PathBuf {
        self.lock_dir.clone().unwrap_or_else(default_lock_dir)
    }
}

impl Config {
    /// Reads and validates a buildgate.toml
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| BuildgateError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|e| BuildgateError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Loads `explicit` if given, else `./buildgate.toml` if present, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let local = Path::new(CONFIG_FILE_NAME);
        if local.is_file() {
            Self::from_file(local)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.gate.retry_interval_ms == 0 {
            return Err(BuildgateError::ConfigInvalidValue {
                field: "gate.retry_interval_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
