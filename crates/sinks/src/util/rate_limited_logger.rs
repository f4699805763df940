//! Rate-limited failure reporting
//!
//! A full disk fails every write to a bucket. The router reports such
//! failures through this logger so the console sees one warning per interval
//! with a count of the failures suppressed since the previous one.

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default interval between reports
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(10);

/// Reports at most one failure per interval
///
/// Thread-safe: uses atomic counters and a mutex for the last report time.
pub struct RateLimitedLogger {
    min_interval: Duration,
    last_report: Mutex<Option<Instant>>,

    /// Failures since the last report
    pending: AtomicU64,

    /// Failures ever recorded
    total: AtomicU64,
}

impl RateLimitedLogger {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_report: Mutex::new(None),
            pending: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    /// Record a failure
    ///
    /// Emits a `tracing` error and returns the number of failures this report
    /// covers, or `None` if the report was suppressed.
    pub fn report(&self, context: &str, error: &dyn Display) -> Option<u64> {
        self.pending.fetch_add(1, Ordering::Relaxed);
        let total = self.total.fetch_add(1, Ordering::Relaxed) + 1;

        if !self.due() {
            return None;
        }

        let covered = self.pending.swap(0, Ordering::Relaxed);
        if covered > 1 {
            tracing::error!(
                context = %context,
                error = %error,
                suppressed_count = covered - 1,
                total_failures = total,
                "log sink failure (rate-limited)"
            );
        } else {
            tracing::error!(
                context = %context,
                error = %error,
                total_failures = total,
                "log sink failure"
            );
        }
        Some(covered)
    }

    fn due(&self) -> bool {
        let mut last = self.last_report.lock();
        let now = Instant::now();
        match *last {
            Some(prev) if now.duration_since(prev) < self.min_interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// Failures recorded since the last report
    pub fn pending_count(&self) -> u64 {
        self.pending.load(Ordering::Relaxed)
    }

    /// Failures ever recorded
    pub fn total_count(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.pending.store(0, Ordering::Relaxed);
        self.total.store(0, Ordering::Relaxed);
        *self.last_report.lock() = None;
    }
}

impl Default for RateLimitedLogger {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_INTERVAL)
    }
}
