//! Size-based rotation of per-level log files
//!
//! Every level has its own bucket of files in the log directory. A bucket
//! holds one active file plus up to `max_kept_files` rotated ones:
//!
//! ```text
//! /var/log/app/
//! ├── cbl_info_1791973845123.cbllog   (oldest kept)
//! ├── cbl_info_1791973861004.cbllog
//! └── cbl_info_1791973877950.cbllog   (active)
//! ```
//!
//! File ids are Unix milliseconds, forced to increase strictly within a
//! bucket, so name order is creation order.
//!
//! # Concurrency
//!
//! Each bucket has its own mutex. An entry is written with a single
//! `write_all` while the mutex is held, so concurrent writers never
//! interleave within an entry, and rotation never splits one.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bytes::BytesMut;
use cbllog_protocol::{LOG_FILE_EXTENSION, LogHeader, LogLevel};
use chrono::Utc;
use parking_lot::Mutex;

use crate::error::{LogError, Result};
use crate::format::{self, LogFormat};
use crate::metrics::SinkMetrics;

/// Prefix of every log file name
pub const FILE_PREFIX: &str = "cbl_";

/// Attempts to find an unused file name before giving up
const MAX_OPEN_ATTEMPTS: u64 = 16;

/// File name for a bucket file: `cbl_<level>_<id>.cbllog`
pub fn file_name(level: LogLevel, id: u64) -> String {
    format!("{FILE_PREFIX}{}_{id}.{LOG_FILE_EXTENSION}", level.as_str())
}

/// Parse a bucket file name back into its level and id
///
/// Returns `None` for anything this sink did not create.
pub fn parse_file_name(name: &str) -> Option<(LogLevel, u64)> {
    let stem = name
        .strip_prefix(FILE_PREFIX)?
        .strip_suffix(LOG_FILE_EXTENSION)?
        .strip_suffix('.')?;
    let (level, id) = stem.rsplit_once('_')?;
    let level: LogLevel = level.parse().ok()?;
    level.bucket_index()?;
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((level, id.parse().ok()?))
}

/// Size and retention limits, read on every append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationLimits {
    pub max_file_size: u64,
    pub max_kept_files: usize,
}

struct ActiveFile {
    file: File,
    path: PathBuf,
    size: u64,
}

#[derive(Default)]
struct BucketState {
    active: Option<ActiveFile>,
    /// Rotated files, oldest first
    history: VecDeque<PathBuf>,
    last_id: u64,
    scanned: bool,
    failed: bool,
}

/// Where and how a bucket set writes its files
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileTarget {
    directory: PathBuf,
    format: LogFormat,
    header: LogHeader,
}

/// Files of a single level
struct LevelBucket {
    level: LogLevel,
    state: Mutex<BucketState>,
}

impl LevelBucket {
    fn new(level: LogLevel) -> Self {
        Self {
            level,
            state: Mutex::new(BucketState::default()),
        }
    }

    fn append(
        &self,
        target: &FileTarget,
        entry: &[u8],
        limits: RotationLimits,
        metrics: &SinkMetrics,
    ) -> Result<()> {
        let mut state = self.state.lock();
        if state.failed {
            metrics.record_dropped();
            return Ok(());
        }

        match self.append_locked(&mut state, target, entry, limits, metrics) {
            Ok(()) => Ok(()),
            Err(e) => {
                state.failed = true;
                state.active = None;
                metrics.write_error();
                tracing::error!(
                    level = %self.level,
                    error = %e,
                    "log bucket failed, dropping further writes"
                );
                Err(e)
            }
        }
    }

    fn append_locked(
        &self,
        state: &mut BucketState,
        target: &FileTarget,
        entry: &[u8],
        limits: RotationLimits,
        metrics: &SinkMetrics,
    ) -> Result<()> {
        if !state.scanned {
            self.scan_existing(state, target, limits)?;
        }
        if state.active.is_none() {
            let file = self.open_file(state, target, metrics)?;
            state.active = Some(file);
        }
        let Some(active) = state.active.as_mut() else {
            return Ok(());
        };

        write_whole(&mut active.file, active.size, entry)
            .map_err(|e| LogError::io(&active.path, e))?;
        active.size += entry.len() as u64;
        metrics.record_written(entry.len() as u64);

        if active.size > limits.max_file_size {
            self.rotate(state, target, limits, metrics)?;
        }
        Ok(())
    }

    /// Seed history from files left by earlier runs and prune them
    fn scan_existing(
        &self,
        state: &mut BucketState,
        target: &FileTarget,
        limits: RotationLimits,
    ) -> Result<()> {
        let entries =
            fs::read_dir(&target.directory).map_err(|e| LogError::io(&target.directory, e))?;

        let mut found: Vec<(u64, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                let (level, id) = parse_file_name(name.to_str()?)?;
                (level == self.level).then(|| (id, entry.path()))
            })
            .collect();
        found.sort_unstable();

        if let Some((id, _)) = found.last() {
            state.last_id = state.last_id.max(*id);
        }
        state.history.extend(found.into_iter().map(|(_, path)| path));
        state.scanned = true;

        self.prune(state, limits);
        Ok(())
    }

    fn next_id(state: &mut BucketState) -> u64 {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let id = now.max(state.last_id + 1);
        state.last_id = id;
        id
    }

    fn open_file(
        &self,
        state: &mut BucketState,
        target: &FileTarget,
        metrics: &SinkMetrics,
    ) -> Result<ActiveFile> {
        let mut attempt = 0;
        let (mut file, path) = loop {
            let id = Self::next_id(state);
            let path = target.directory.join(file_name(self.level, id));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => break (file, path),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    attempt += 1;
                    if attempt >= MAX_OPEN_ATTEMPTS {
                        return Err(LogError::io(&path, e));
                    }
                }
                Err(e) => return Err(LogError::io(&path, e)),
            }
        };

        let mut preamble = BytesMut::with_capacity(256);
        format::write_preamble(
            &mut preamble,
            target.format,
            self.level,
            Utc::now(),
            &target.header,
        );
        file.write_all(&preamble)
            .map_err(|e| LogError::io(&path, e))?;
        metrics.bytes(preamble.len() as u64);

        tracing::debug!(level = %self.level, path = %path.display(), "opened log file");
        Ok(ActiveFile {
            file,
            path,
            size: preamble.len() as u64,
        })
    }

    fn rotate(
        &self,
        state: &mut BucketState,
        target: &FileTarget,
        limits: RotationLimits,
        metrics: &SinkMetrics,
    ) -> Result<()> {
        if let Some(old) = state.active.take() {
            close_file(old.file, &old.path);
            state.history.push_back(old.path);
        }
        let file = self.open_file(state, target, metrics)?;
        state.active = Some(file);
        metrics.rotation();
        self.prune(state, limits);
        Ok(())
    }

    /// Delete the oldest rotated files beyond the retention limit
    fn prune(&self, state: &mut BucketState, limits: RotationLimits) {
        while state.history.len() > limits.max_kept_files {
            let Some(oldest) = state.history.pop_front() else {
                break;
            };
            match fs::remove_file(&oldest) {
                Ok(()) => {
                    tracing::debug!(level = %self.level, path = %oldest.display(), "pruned log file")
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(
                    level = %self.level,
                    path = %oldest.display(),
                    error = %e,
                    "failed to prune log file"
                ),
            }
        }
    }

    fn files(&self) -> Vec<PathBuf> {
        let state = self.state.lock();
        let mut files: Vec<PathBuf> = state.history.iter().cloned().collect();
        if let Some(active) = &state.active {
            files.push(active.path.clone());
        }
        files
    }

    fn close(&self) {
        let mut state = self.state.lock();
        if let Some(active) = state.active.take() {
            close_file(active.file, &active.path);
            state.history.push_back(active.path);
        }
    }
}

fn close_file(file: File, path: &Path) {
    if let Err(e) = file.sync_data() {
        tracing::warn!(path = %path.display(), error = %e, "failed to sync log file");
    }
}

/// The five level buckets of one log directory
///
/// Shared between file sinks whose configurations write the same files, so
/// a reconfiguration keeps appending to the current active files.
pub struct BucketSet {
    target: FileTarget,
    buckets: [LevelBucket; 5],
}

impl BucketSet {
    pub fn new(directory: PathBuf, format: LogFormat, header: LogHeader) -> Self {
        Self {
            target: FileTarget {
                directory,
                format,
                header,
            },
            buckets: LogLevel::BUCKETS.map(LevelBucket::new),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.target.directory
    }

    pub fn format(&self) -> LogFormat {
        self.target.format
    }

    /// Whether a sink with these settings writes the same files
    pub fn is_compatible(&self, directory: &Path, format: LogFormat, header: &LogHeader) -> bool {
        self.target.directory == directory
            && self.target.format == format
            && self.target.header == *header
    }

    fn bucket(&self, level: LogLevel) -> Option<&LevelBucket> {
        level.bucket_index().map(|i| &self.buckets[i])
    }

    /// Append an encoded entry to a level's active file, rotating if needed
    ///
    /// A failure marks the bucket failed; later appends to it are dropped
    /// until [`BucketSet::clear_failures`].
    pub fn append(
        &self,
        level: LogLevel,
        entry: &[u8],
        limits: RotationLimits,
        metrics: &SinkMetrics,
    ) -> Result<()> {
        match self.bucket(level) {
            Some(bucket) => bucket.append(&self.target, entry, limits, metrics),
            None => Ok(()),
        }
    }

    /// Files of a level, oldest first; the last one is active
    pub fn files(&self, level: LogLevel) -> Vec<PathBuf> {
        self.bucket(level).map(LevelBucket::files).unwrap_or_default()
    }

    pub fn is_failed(&self, level: LogLevel) -> bool {
        self.bucket(level).is_some_and(|b| b.state.lock().failed)
    }

    /// Let failed buckets try again on their next append
    pub fn clear_failures(&self) {
        for bucket in &self.buckets {
            bucket.state.lock().failed = false;
        }
    }

    /// Close every active file; the next append to a level opens a new one
    pub fn close(&self) {
        for bucket in &self.buckets {
            bucket.close();
        }
    }
}

impl Drop for BucketSet {
    fn drop(&mut self) {
        self.close();
        tracing::debug!(directory = %self.target.directory.display(), "log files closed");
    }
}

/// Output that can be cut back to a known length
trait Truncate: Write + Seek {
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl Truncate for File {
    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Write `entry` at offset `size`, or leave the output at `size` on failure
///
/// A partially written binary frame would read back as truncated.
fn write_whole<W: Truncate>(out: &mut W, size: u64, entry: &[u8]) -> io::Result<()> {
    let Err(e) = out.write_all(entry) else {
        return Ok(());
    };
    if out.truncate_to(size).is_ok() {
        let _ = out.seek(SeekFrom::Start(size));
    }
    Err(e)
}

#[cfg(test)]
#[path = "rotation_test.rs"]
mod rotation_test;
