//! Configuration validation
//!
//! Validates config consistency:
//! - An enabled file sink names a directory
//! - Size and retention limits are positive

use crate::LogSinksConfig;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &LogSinksConfig) -> Result<()> {
    validate_file_sink(config)?;
    Ok(())
}

/// Validate the file sink section, if present and enabled
fn validate_file_sink(config: &LogSinksConfig) -> Result<()> {
    let Some(file) = config.file.as_ref() else {
        return Ok(());
    };
    if !file.enabled {
        return Ok(());
    }

    if file.directory.trim().is_empty() {
        return Err(ConfigError::missing_field("file", "directory"));
    }
    if file.max_file_size == 0 {
        return Err(ConfigError::invalid_value(
            "file",
            "max_file_size",
            "must be greater than 0",
        ));
    }
    if file.max_kept_files == 0 {
        return Err(ConfigError::invalid_value(
            "file",
            "max_kept_files",
            "must be greater than 0",
        ));
    }

    Ok(())
}
