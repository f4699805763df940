//! Per-sink counters
//!
//! Shared by the console, file and custom sinks.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics shared by all sink types
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Records that passed the sink's filter
    pub records_received: AtomicU64,

    /// Records successfully written (once per file bucket for the file sink)
    pub records_written: AtomicU64,

    /// Total bytes written, including file preambles
    pub bytes_written: AtomicU64,

    /// Write errors encountered
    pub write_errors: AtomicU64,

    /// Records dropped because their bucket had failed
    pub dropped: AtomicU64,

    /// File rotations performed
    pub rotations: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            records_received: AtomicU64::new(0),
            records_written: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            rotations: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_received(&self) {
        self.records_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_written(&self, bytes: u64) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Count bytes that are not a record, e.g. a file preamble
    #[inline]
    pub fn bytes(&self, bytes: u64) {
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_received: self.records_received.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.records_received.store(0, Ordering::Relaxed);
        self.records_written.store(0, Ordering::Relaxed);
        self.bytes_written.store(0, Ordering::Relaxed);
        self.write_errors.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
        self.rotations.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time snapshot of sink metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_received: u64,
    pub records_written: u64,
    pub bytes_written: u64,
    pub write_errors: u64,
    pub dropped: u64,
    pub rotations: u64,
}

#[cfg(test)]
#[path = "metrics_test.rs"]
mod metrics_test;
