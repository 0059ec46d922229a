//! Core error types for pomobar-core.
//!
//! The session timer itself never fails. Errors only exist at the
//! configuration and persistence boundary, where a bad key or an unwritable
//! config file has to be reported to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from driving the timer service.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The timer service task is no longer running
    #[error("timer service has stopped")]
    ServiceStopped,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Could not determine where the configuration lives
    #[error("Configuration directory unavailable: {0}")]
    NoDataDir(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("unknown config key: {0}")]
    UnknownKey(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Unknown session kind name
    #[error("unknown session kind '{0}' (expected work, short_break or long_break)")]
    UnknownSessionKind(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
