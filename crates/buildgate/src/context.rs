//! Global context for CLI commands

use anyhow::{Context as _, Result};
use buildgate_core::config::Config;
use buildgate_core::gate::{NamedGate, TracingObserver};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Effective configuration: built-in defaults, then buildgate.toml, then flags
pub struct Context {
    pub config: Config,
    pub verbose: bool,
}

impl Context {
    /// Loads the config file and applies global flag overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read, parsed or validated
    pub fn new(config_path: Option<&Path>, lock_dir: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let mut config = Config::load(config_path).context("Failed to load configuration")?;

        if let Some(dir) = lock_dir {
            config.gate.lock_dir = Some(dir);
        }

        tracing::debug!(?config, "effective configuration");

        Ok(Self { config, verbose })
    }

    pub fn lock_dir(&self) -> PathBuf {
        self.config.gate.lock_dir()
    }

    pub fn timeout(&self, override_ms: Option<u64>) -> Duration {
        override_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.config.gate.timeout())
    }

    /// Gate for `name` that logs its progress through tracing
    pub fn gate(&self, name: &str, timeout_ms: Option<u64>, retry_interval_ms: Option<u64>) -> NamedGate {
        let mut gate_config = self.config.gate.clone();
        if let Some(ms) = timeout_ms {
            gate_config.timeout_ms = ms;
        }
        if let Some(ms) = retry_interval_ms {
            gate_config.retry_interval_ms = ms;
        }

        NamedGate::from_config(name, &gate_config).with_observer(TracingObserver)
    }
}
