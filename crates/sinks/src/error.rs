//! Sink error types
//!
//! Configuration errors are returned synchronously to whoever installs a
//! sink. I/O errors are scoped to a single file bucket and are reported, then
//! swallowed, by the router.

use std::io;
use std::path::Path;

use thiserror::Error;

/// Result type for sink operations
pub type Result<T> = std::result::Result<T, LogError>;

/// Errors from configuring or writing to a sink
#[derive(Debug, Error)]
pub enum LogError {
    /// Log directory missing, not a directory, or not writable
    #[error("invalid log directory '{path}': {reason}")]
    InvalidDirectory { path: String, reason: String },

    /// Configuration value out of range
    #[error("invalid {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },

    /// Write, rotate or prune failure on a log file
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Configuration file failed validation
    #[error(transparent)]
    Config(#[from] cbllog_config::ConfigError),
}

impl LogError {
    /// Create an invalid directory error
    pub fn invalid_directory(path: &Path, reason: impl Into<String>) -> Self {
        Self::InvalidDirectory {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            message: message.into(),
        }
    }

    /// Create an I/O error tagged with the file it happened on
    pub fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// Whether this error came from configuration rather than a write
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidDirectory { .. } | Self::InvalidValue { .. } | Self::Config(_)
        )
    }
}
