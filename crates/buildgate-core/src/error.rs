use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildgateError {
    // Config errors
    #[error("CONFIG_READ_ERROR: failed to read {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CONFIG_INVALID: failed to parse {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("CONFIG_INVALID_VALUE: {field}: {reason}")]
    ConfigInvalidValue { field: String, reason: String },
}

pub type Result<T> = std::result::Result<T, BuildgateError>;
