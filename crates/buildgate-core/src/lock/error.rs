//! Error types for named locks and gates

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Error type for lock and gate operations
#[derive(Error, Debug)]
pub enum LockError {
    /// Admission or acquisition did not succeed within the timeout
    #[error("Failed to acquire {name} in {timeout:?}")]
    Timeout {
        /// Name of the lock
        name: String,
        /// The timeout that elapsed
        timeout: Duration,
    },

    /// The named primitive could not be created, opened, probed or released
    #[error("I/O error during {operation} of {name} ({}): {source}", path.display())]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Name of the lock
        name: String,
        /// Path of the backing lock file
        path: PathBuf,
        /// Operation that failed
        operation: &'static str,
    },

    /// Lock names must not be empty
    #[error("Lock name must not be empty")]
    InvalidName,

    /// The polling interval must be positive
    #[error("Retry interval for {name} must be greater than zero")]
    InvalidRetryInterval { name: String },
}

impl LockError {
    /// True for [`LockError::Timeout`], the only recoverable outcome
    pub fn is_timeout(&self) -> bool {
        matches!(self, LockError::Timeout { .. })
    }
}
