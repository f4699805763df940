//! Sink configuration types
//!
//! Configuration for the console and file sinks. The custom sink carries a
//! callback and so can only be installed through the API, never from TOML.

use cbllog_protocol::{LogDomain, LogDomains, LogLevel};
use serde::Deserialize;

/// Default maximum size of a single log file before rotation (512 KiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 512 * 1024;

/// Default number of rotated files kept per level, besides the active one
pub const DEFAULT_MAX_KEPT_FILES: usize = 2;

/// Which level buckets a record is written to
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BucketPolicy {
    /// A record goes only to the bucket of its own level (default)
    #[default]
    PerLevel,
    /// A record also goes to every enabled bucket less severe than it
    Cumulative,
}

/// Console sink configuration
///
/// # Example
///
/// ```toml
/// [console]
/// level = "info"
/// domains = ["database", "query"]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsoleSinkConfig {
    /// Whether the console sink is installed
    /// Default: true
    pub enabled: bool,

    /// Minimum level written
    /// Default: warning
    pub level: LogLevel,

    /// Domains written; empty means all
    /// Default: all
    pub domains: Vec<LogDomain>,

    /// Color the level column
    /// Default: false
    pub color: bool,
}

impl Default for ConsoleSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: LogLevel::Warning,
            domains: Vec::new(),
            color: false,
        }
    }
}

impl ConsoleSinkConfig {
    /// Domain filter as a set
    pub fn domain_set(&self) -> LogDomains {
        self.domains.iter().copied().collect()
    }
}

/// File sink configuration
///
/// # Example
///
/// ```toml
/// [file]
/// directory = "/var/log/app"
/// level = "verbose"
/// use_plaintext = true
/// max_file_size = 1048576
/// max_kept_files = 5
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileSinkConfig {
    /// Whether the file sink is installed
    /// Default: true
    pub enabled: bool,

    /// Directory holding the log files
    /// Required when enabled
    pub directory: String,

    /// Minimum level written
    /// Default: info
    pub level: LogLevel,

    /// Write plaintext instead of the binary format
    /// Default: false
    pub use_plaintext: bool,

    /// Rotate a file once it grows past this many bytes
    /// Default: 512 KiB
    pub max_file_size: u64,

    /// Rotated files kept per level besides the active one
    /// Default: 2
    pub max_kept_files: usize,

    /// Bucket admission policy
    /// Default: per_level
    pub bucket_policy: BucketPolicy,
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: String::new(),
            level: LogLevel::Info,
            use_plaintext: false,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_kept_files: DEFAULT_MAX_KEPT_FILES,
            bucket_policy: BucketPolicy::PerLevel,
        }
    }
}
