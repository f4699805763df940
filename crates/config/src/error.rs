//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error - required field missing
    #[error("{component} sink is missing required field '{field}'")]
    MissingField {
        /// Sink section (e.g., "file")
        component: &'static str,
        /// Missing field name
        field: &'static str,
    },

    /// Validation error - invalid value
    #[error("{component} sink has invalid {field}: {message}")]
    InvalidValue {
        /// Sink section
        component: &'static str,
        /// Field name
        field: &'static str,
        /// Error message
        message: String,
    },
}

impl ConfigError {
    /// Create a MissingField error
    pub fn missing_field(component: &'static str, field: &'static str) -> Self {
        Self::MissingField { component, field }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(
        component: &'static str,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            component,
            field,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_error() {
        let err = ConfigError::missing_field("file", "directory");
        assert!(err.to_string().contains("file"));
        assert!(err.to_string().contains("directory"));
    }

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::invalid_value("file", "max_file_size", "must be greater than 0");
        assert!(err.to_string().contains("max_file_size"));
        assert!(err.to_string().contains("greater than 0"));
    }

    #[test]
    fn test_io_error_includes_path() {
        let err = ConfigError::IoError {
            path: "/etc/cbllog.toml".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/etc/cbllog.toml"));
    }
}
