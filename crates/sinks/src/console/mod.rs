//! Console Sink - Human-readable output on stderr
//!
//! Writes one plaintext line per record, the same layout as plaintext log
//! files. Records are filtered by level and domain before they get here.
//!
//! # Example Output
//!
//! ```text
//! 2026-10-15T07:34:59.161021Z warning replicator connection lost, retrying
//! 2026-10-15T07:34:59.162304Z error database failed to open collection
//! ```

use std::io::{self, Write};

use cbllog_config::ConsoleSinkConfig;
use cbllog_protocol::{LogDomains, LogLevel, LogRecord, domain_matches};
use owo_colors::{OwoColorize, Style};
use parking_lot::Mutex;

use crate::format;
use crate::metrics::SinkMetrics;

/// Console sink configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Minimum level written
    pub level: LogLevel,

    /// Domains written; empty means all
    pub domains: LogDomains,

    /// Color the level column
    pub color: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warning,
            domains: LogDomains::ALL,
            color: false,
        }
    }
}

impl ConsoleConfig {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    pub fn with_domains(mut self, domains: impl Into<LogDomains>) -> Self {
        self.domains = domains.into();
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

impl From<&ConsoleSinkConfig> for ConsoleConfig {
    fn from(config: &ConsoleSinkConfig) -> Self {
        Self {
            level: config.level,
            domains: config.domain_set(),
            color: config.color,
        }
    }
}

fn level_style(level: LogLevel, enabled: bool) -> Style {
    if !enabled {
        return Style::new();
    }
    match level {
        LogLevel::Error => Style::new().red(),
        LogLevel::Warning => Style::new().yellow(),
        LogLevel::Info => Style::new(),
        LogLevel::Verbose | LogLevel::Debug | LogLevel::None => Style::new().dimmed(),
    }
}

/// Console sink
///
/// Writes to stderr unless built with [`ConsoleSink::with_writer`].
pub struct ConsoleSink {
    config: ConsoleConfig,
    writer: Mutex<Box<dyn Write + Send>>,
    metrics: SinkMetrics,
}

impl ConsoleSink {
    /// Create a console sink writing to stderr
    pub fn new(config: ConsoleConfig) -> Self {
        Self::with_writer(config, Box::new(io::stderr()))
    }

    /// Create a console sink writing to the given writer
    pub fn with_writer(config: ConsoleConfig, writer: Box<dyn Write + Send>) -> Self {
        Self {
            config,
            writer: Mutex::new(writer),
            metrics: SinkMetrics::new(),
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    /// Whether this sink's level and domain filters admit the record
    #[inline]
    pub fn accepts(&self, record: &LogRecord<'_>) -> bool {
        self.config.level.accepts(record.level) && domain_matches(record.domain, self.config.domains)
    }

    /// Write a record without filtering
    ///
    /// Console output is best effort; write errors are counted and dropped.
    pub fn emit(&self, record: &LogRecord<'_>) {
        self.metrics.record_received();
        let line = self.render(record);

        let mut writer = self.writer.lock();
        match writer.write_all(line.as_bytes()) {
            Ok(()) => self.metrics.record_written(line.len() as u64),
            Err(_) => self.metrics.write_error(),
        }
    }

    fn render(&self, record: &LogRecord<'_>) -> String {
        if !self.config.color {
            let mut line = format::plaintext_line(record);
            line.push('\n');
            return line;
        }

        format!(
            "{} {} {} {}\n",
            format::format_timestamp(record.timestamp).dimmed(),
            record.level.as_str().style(level_style(record.level, true)),
            record.domain,
            record.message
        )
    }
}

impl std::fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleSink")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
