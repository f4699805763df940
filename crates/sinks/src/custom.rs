//! Custom Sink - Forwards records to an application callback
//!
//! The application supplies a [`LogSink`]. Any `Fn(LogLevel, LogDomain, &str)`
//! closure that is `Send + Sync` works.
//!
//! ```
//! use std::sync::Arc;
//! use cbllog_protocol::{LogDomain, LogLevel};
//! use cbllog_sinks::{CustomConfig, LogSink};
//!
//! let sink: Arc<dyn LogSink> = Arc::new(|level: LogLevel, domain: LogDomain, message: &str| {
//!     println!("[{level}] {domain}: {message}");
//! });
//! let config = CustomConfig::new(LogLevel::Info, sink);
//! assert_eq!(config.level, LogLevel::Info);
//! ```

use std::fmt;
use std::sync::Arc;

use cbllog_protocol::{LogDomain, LogDomains, LogLevel, LogRecord, domain_matches};

use crate::metrics::SinkMetrics;

/// Application-supplied log receiver
///
/// Called from whatever thread emitted the record, possibly from several
/// threads at once. Implementations should return quickly.
pub trait LogSink: Send + Sync {
    fn write_log(&self, level: LogLevel, domain: LogDomain, message: &str);
}

impl<F> LogSink for F
where
    F: Fn(LogLevel, LogDomain, &str) + Send + Sync,
{
    fn write_log(&self, level: LogLevel, domain: LogDomain, message: &str) {
        self(level, domain, message)
    }
}

/// Custom sink configuration
#[derive(Clone)]
pub struct CustomConfig {
    /// Minimum level forwarded
    pub level: LogLevel,

    /// Domains forwarded; empty means all
    pub domains: LogDomains,

    /// Receiver
    pub sink: Arc<dyn LogSink>,
}

impl CustomConfig {
    /// Forward every domain at `level` and above
    pub fn new(level: LogLevel, sink: Arc<dyn LogSink>) -> Self {
        Self {
            level,
            domains: LogDomains::ALL,
            sink,
        }
    }

    pub fn with_domains(mut self, domains: impl Into<LogDomains>) -> Self {
        self.domains = domains.into();
        self
    }
}

impl fmt::Debug for CustomConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomConfig")
            .field("level", &self.level)
            .field("domains", &self.domains)
            .finish_non_exhaustive()
    }
}

/// Installed custom sink
pub struct CustomSink {
    config: CustomConfig,
    metrics: SinkMetrics,
}

impl CustomSink {
    pub fn new(config: CustomConfig) -> Self {
        Self {
            config,
            metrics: SinkMetrics::new(),
        }
    }

    pub fn config(&self) -> &CustomConfig {
        &self.config
    }

    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    #[inline]
    pub fn accepts(&self, record: &LogRecord<'_>) -> bool {
        self.config.level.accepts(record.level) && domain_matches(record.domain, self.config.domains)
    }

    /// Hand a record to the callback without filtering
    ///
    /// A panic in the callback propagates to the caller.
    pub fn emit(&self, record: &LogRecord<'_>) {
        self.metrics.record_received();
        self.config
            .sink
            .write_log(record.level, record.domain, record.message);
        self.metrics.record_written(record.message.len() as u64);
    }
}

impl fmt::Debug for CustomSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomSink")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "custom_test.rs"]
mod custom_test;
