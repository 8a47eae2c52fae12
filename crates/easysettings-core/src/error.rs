//! Error types for easysettings-core

use std::path::PathBuf;

/// Result type for easysettings-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in easysettings-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },

    #[error("No settings file was given and none is set")]
    NoConfigFile,

    #[error("Failed to save settings to {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: easysettings_fs::Error,
    },

    #[error("Option not found: {key}")]
    KeyNotFound { key: String },

    #[error(transparent)]
    Fs(#[from] easysettings_fs::Error),
}
