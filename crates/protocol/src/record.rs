//! Log records
//!
//! A [`LogRecord`] is the transient value handed from the router to each
//! sink. It borrows the caller's message and is never stored. A
//! [`LogEntry`] is the owned form, produced when decoding a binary log file.

use chrono::{DateTime, Utc};

use crate::{LogDomain, LogLevel};

/// A single log record, borrowed from the emitting call site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord<'a> {
    /// Subsystem that produced the record
    pub domain: LogDomain,
    /// Severity
    pub level: LogLevel,
    /// Message text, written verbatim by every sink
    pub message: &'a str,
    /// When the record was emitted
    pub timestamp: DateTime<Utc>,
}

impl<'a> LogRecord<'a> {
    /// Create a record stamped with the current time
    #[inline]
    pub fn new(domain: LogDomain, level: LogLevel, message: &'a str) -> Self {
        Self::with_timestamp(domain, level, message, Utc::now())
    }

    /// Create a record with an explicit timestamp
    #[inline]
    pub fn with_timestamp(
        domain: LogDomain,
        level: LogLevel,
        message: &'a str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            domain,
            level,
            message,
            timestamp,
        }
    }
}

/// An owned log entry decoded from a binary log file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub domain: LogDomain,
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    /// Borrow this entry as a record
    pub fn as_record(&self) -> LogRecord<'_> {
        LogRecord::with_timestamp(self.domain, self.level, &self.message, self.timestamp)
    }
}

impl From<LogRecord<'_>> for LogEntry {
    fn from(record: LogRecord<'_>) -> Self {
        Self {
            domain: record.domain,
            level: record.level,
            message: record.message.to_owned(),
            timestamp: record.timestamp,
        }
    }
}
