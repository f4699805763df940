//! File Sink - Rotating per-level log files
//!
//! Writes records to one bucket of files per level in a log directory, in
//! either the binary `.cbllog` format or plaintext. Each bucket rotates on
//! its own when its active file grows past `max_file_size` and keeps at most
//! `max_kept_files` rotated files.
//!
//! # Buckets
//!
//! A bucket is active when its level is at or above the sink level. With
//! [`BucketPolicy::PerLevel`] a record is written only to its own level's
//! bucket. With [`BucketPolicy::Cumulative`] it is also written to every
//! active bucket less severe than itself, so the verbose file carries
//! warnings and errors too.
//!
//! # Failures
//!
//! Configuration problems (unwritable directory, zero limits) are returned
//! from [`FileSink::new`]. A write failure is returned from
//! [`FileSink::emit`] once and marks the bucket failed; later records for
//! that bucket are dropped and counted until the sink is reconfigured.

mod rotation;

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::BytesMut;
use cbllog_config::{BucketPolicy, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_KEPT_FILES, FileSinkConfig};
use cbllog_protocol::{LogHeader, LogLevel, LogRecord};

use crate::error::{LogError, Result};
use crate::format::{self, LogFormat};
use crate::metrics::SinkMetrics;

pub use rotation::{BucketSet, FILE_PREFIX, RotationLimits, file_name, parse_file_name};

/// File sink configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileConfig {
    /// Directory holding the log files; created if missing
    pub directory: PathBuf,

    /// Minimum level written
    pub level: LogLevel,

    /// Write plaintext instead of the binary format
    pub use_plaintext: bool,

    /// Rotate a file once it grows past this many bytes
    pub max_file_size: u64,

    /// Rotated files kept per level besides the active one
    pub max_kept_files: usize,

    pub bucket_policy: BucketPolicy,

    /// Metadata written at the top of every file
    pub header: LogHeader,
}

impl FileConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            level: LogLevel::Info,
            use_plaintext: false,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_kept_files: DEFAULT_MAX_KEPT_FILES,
            bucket_policy: BucketPolicy::default(),
            header: LogHeader::default(),
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_plaintext(mut self, use_plaintext: bool) -> Self {
        self.use_plaintext = use_plaintext;
        self
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn with_max_kept_files(mut self, max_kept_files: usize) -> Self {
        self.max_kept_files = max_kept_files;
        self
    }

    pub fn with_bucket_policy(mut self, bucket_policy: BucketPolicy) -> Self {
        self.bucket_policy = bucket_policy;
        self
    }

    pub fn with_header(mut self, header: LogHeader) -> Self {
        self.header = header;
        self
    }

    pub fn format(&self) -> LogFormat {
        LogFormat::from_plaintext(self.use_plaintext)
    }

    pub fn limits(&self) -> RotationLimits {
        RotationLimits {
            max_file_size: self.max_file_size,
            max_kept_files: self.max_kept_files,
        }
    }

    /// Check value ranges; does not touch the filesystem
    pub fn validate(&self) -> Result<()> {
        if self.directory.as_os_str().is_empty() {
            return Err(LogError::invalid_directory(&self.directory, "path is empty"));
        }
        if self.max_file_size == 0 {
            return Err(LogError::invalid_value(
                "max_file_size",
                "must be greater than 0",
            ));
        }
        if self.max_kept_files == 0 {
            return Err(LogError::invalid_value(
                "max_kept_files",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl From<&FileSinkConfig> for FileConfig {
    fn from(config: &FileSinkConfig) -> Self {
        Self::new(&config.directory)
            .with_level(config.level)
            .with_plaintext(config.use_plaintext)
            .with_max_file_size(config.max_file_size)
            .with_max_kept_files(config.max_kept_files)
            .with_bucket_policy(config.bucket_policy)
    }
}

/// Create the log directory if needed and check that it is writable
fn prepare_directory(directory: &Path) -> Result<()> {
    fs::create_dir_all(directory)
        .map_err(|e| LogError::invalid_directory(directory, e.to_string()))?;
    if !directory.is_dir() {
        return Err(LogError::invalid_directory(directory, "not a directory"));
    }

    let probe = directory.join(format!(".{FILE_PREFIX}probe_{}", std::process::id()));
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&probe)
        .map_err(|e| LogError::invalid_directory(directory, format!("not writable: {e}")))?;
    let _ = fs::remove_file(&probe);
    Ok(())
}

/// Rotating file sink
pub struct FileSink {
    config: FileConfig,
    files: Arc<BucketSet>,
    metrics: SinkMetrics,
}

impl FileSink {
    /// Create a file sink with fresh buckets
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a limit is zero or the directory
    /// cannot be created or written.
    pub fn new(config: FileConfig) -> Result<Self> {
        Self::with_previous(config, None)
    }

    /// Create a file sink that takes over `previous`'s files when both
    /// write the same directory in the same format
    ///
    /// The new sink then appends to the current active files instead of
    /// starting new ones, and failed buckets get another try.
    pub fn with_previous(config: FileConfig, previous: Option<&FileSink>) -> Result<Self> {
        config.validate()?;
        prepare_directory(&config.directory)?;

        let format = config.format();
        let files = match previous {
            Some(prev) if prev.files.is_compatible(&config.directory, format, &config.header) => {
                prev.files.clear_failures();
                Arc::clone(&prev.files)
            }
            _ => Arc::new(BucketSet::new(
                config.directory.clone(),
                format,
                config.header.clone(),
            )),
        };

        tracing::info!(
            directory = %config.directory.display(),
            level = %config.level,
            plaintext = config.use_plaintext,
            max_file_size = config.max_file_size,
            max_kept_files = config.max_kept_files,
            "file log sink configured"
        );

        Ok(Self {
            config,
            files,
            metrics: SinkMetrics::new(),
        })
    }

    pub fn config(&self) -> &FileConfig {
        &self.config
    }

    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    pub fn directory(&self) -> &Path {
        self.files.directory()
    }

    #[inline]
    pub fn accepts(&self, level: LogLevel) -> bool {
        self.config.level.accepts(level)
    }

    /// Buckets a record at `level` is written to
    pub fn target_buckets(&self, level: LogLevel) -> impl Iterator<Item = LogLevel> + '_ {
        let sink_level = self.config.level;
        let policy = self.config.bucket_policy;
        LogLevel::BUCKETS.into_iter().filter(move |&bucket| {
            sink_level.accepts(bucket)
                && match policy {
                    BucketPolicy::PerLevel => bucket == level,
                    BucketPolicy::Cumulative => {
                        level.bucket_index().is_some() && bucket.as_u8() <= level.as_u8()
                    }
                }
        })
    }

    /// Write a record to every bucket it belongs to
    ///
    /// Records below the sink level are ignored. Every target bucket is
    /// attempted; the first failure is returned.
    pub fn emit(&self, record: &LogRecord<'_>) -> Result<()> {
        if !self.accepts(record.level) {
            return Ok(());
        }
        self.metrics.record_received();

        let format = self.files.format();
        let mut entry = BytesMut::with_capacity(64 + record.message.len());
        format::write_entry(&mut entry, format, record);

        let limits = self.config.limits();
        let mut result = Ok(());
        for bucket in self.target_buckets(record.level) {
            if let Err(e) = self.files.append(bucket, &entry, limits, &self.metrics) {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    /// Files of a level, oldest first; the last one is active
    pub fn files(&self, level: LogLevel) -> Vec<PathBuf> {
        self.files.files(level)
    }

    pub fn is_failed(&self, level: LogLevel) -> bool {
        self.files.is_failed(level)
    }
}

impl std::fmt::Debug for FileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSink")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
