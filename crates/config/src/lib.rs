//! cbllog Configuration
//!
//! TOML-based configuration for the console and file log sinks.
//! Minimal config should just work - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use cbllog_config::LogSinksConfig;
//! use std::str::FromStr;
//!
//! let config = LogSinksConfig::from_str("[file]\ndirectory = \"logs\"").unwrap();
//! assert!(config.file.is_some());
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [console]
//! level = "warning"
//! domains = ["database", "replicator"]
//!
//! [file]
//! directory = "/var/log/app"
//! level = "info"
//! use_plaintext = false
//! max_file_size = 524288
//! max_kept_files = 2
//! ```

mod error;
mod sinks;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use sinks::{
    BucketPolicy, ConsoleSinkConfig, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_KEPT_FILES,
    FileSinkConfig,
};

use serde::Deserialize;

/// Log sink configuration
///
/// All sections are optional. Without a `[console]` section the console sink
/// uses its defaults; without a `[file]` section no file sink is installed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogSinksConfig {
    /// Console sink settings
    pub console: ConsoleSinkConfig,

    /// File sink settings
    pub file: Option<FileSinkConfig>,
}

impl LogSinksConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    fn parse(s: &str) -> Result<Self> {
        let config: LogSinksConfig = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// The file sink section, if present and enabled
    pub fn enabled_file(&self) -> Option<&FileSinkConfig> {
        self.file.as_ref().filter(|f| f.enabled)
    }
}

impl FromStr for LogSinksConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
