//! Log router
//!
//! Owns the three sink slots and fans each emitted record out to them.
//!
//! # Architecture
//!
//! ```text
//! emit() → [ArcSwapOption::load_full() ×3] → custom → console → file
//!                       ↓ (set_*_sink)
//!             [ArcSwapOption::swap(new sink)]
//!                       ↓
//!             [old sink drains via Arc refcount]
//! ```
//!
//! Emitting never takes a lock of the router's own. A record snapshots the
//! slots it needs, so a sink replaced mid-emit finishes the records already
//! handed to it and is dropped once the last of them returns. Replacing a
//! file sink closes its files at that point, unless the new sink took them
//! over.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use cbllog_config::LogSinksConfig;
use cbllog_protocol::{LogDomain, LogLevel, LogRecord};
use parking_lot::Mutex;

use crate::console::{ConsoleConfig, ConsoleSink};
use crate::custom::{CustomConfig, CustomSink};
use crate::error::{LogError, Result};
use crate::file::{FileConfig, FileSink};
use crate::util::RateLimitedLogger;

/// Routes records to the console, file and custom sinks
///
/// Cheap to share: wrap it in an `Arc` or keep it in a `static`.
pub struct LogRouter {
    console: ArcSwapOption<ConsoleSink>,
    file: ArcSwapOption<FileSink>,
    custom: ArcSwapOption<CustomSink>,

    /// Serializes reconfiguration; never taken by `emit`
    config_lock: Mutex<()>,

    /// Reports file write failures
    failures: RateLimitedLogger,
}

impl LogRouter {
    /// Create a router with the default console sink and no file or custom sink
    pub fn new() -> Self {
        Self {
            console: ArcSwapOption::from_pointee(ConsoleSink::new(ConsoleConfig::default())),
            file: ArcSwapOption::empty(),
            custom: ArcSwapOption::empty(),
            config_lock: Mutex::new(()),
            failures: RateLimitedLogger::default(),
        }
    }

    /// Install, replace or remove (`None`) the console sink
    pub fn set_console_sink(&self, config: Option<ConsoleConfig>) {
        self.install_console(config.map(|c| Arc::new(ConsoleSink::new(c))));
    }

    /// Install a console sink built elsewhere, e.g. one writing to a buffer
    pub fn install_console(&self, sink: Option<Arc<ConsoleSink>>) {
        let _guard = self.config_lock.lock();
        match &sink {
            Some(sink) => tracing::info!(config = ?sink.config(), "console log sink installed"),
            None => tracing::info!("console log sink removed"),
        }
        self.console.store(sink);
    }

    /// Install, replace or remove (`None`) the file sink
    ///
    /// A new configuration that writes the same directory in the same format
    /// keeps appending to the current files.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the directory cannot be created or
    /// written, or a limit is zero. The previous file sink stays installed.
    pub fn set_file_sink(&self, config: Option<FileConfig>) -> Result<()> {
        let _guard = self.config_lock.lock();
        let sink = match config {
            Some(config) => {
                let previous = self.file.load_full();
                Some(Arc::new(FileSink::with_previous(config, previous.as_deref())?))
            }
            None => {
                tracing::info!("file log sink removed");
                None
            }
        };
        self.file.store(sink);
        Ok(())
    }

    /// Install, replace or remove (`None`) the custom sink
    pub fn set_custom_sink(&self, config: Option<CustomConfig>) {
        let _guard = self.config_lock.lock();
        match &config {
            Some(config) => tracing::info!(config = ?config, "custom log sink installed"),
            None => tracing::info!("custom log sink removed"),
        }
        self.custom
            .store(config.map(|c| Arc::new(CustomSink::new(c))));
    }

    /// Apply a loaded configuration to the console and file sinks
    ///
    /// The custom sink is left alone. On error nothing is changed.
    pub fn apply_config(&self, config: &LogSinksConfig) -> Result<()> {
        config.validate()?;

        self.set_file_sink(config.enabled_file().map(FileConfig::from))?;
        let console = config
            .console
            .enabled
            .then(|| ConsoleConfig::from(&config.console));
        self.set_console_sink(console);
        Ok(())
    }

    /// Restore the initial state: default console, no file or custom sink
    pub fn reset(&self) {
        self.set_console_sink(Some(ConsoleConfig::default()));
        // Removing a sink cannot fail
        let _ = self.set_file_sink(None);
        self.set_custom_sink(None);
        self.failures.reset();
    }

    pub fn console_sink(&self) -> Option<Arc<ConsoleSink>> {
        self.console.load_full()
    }

    pub fn file_sink(&self) -> Option<Arc<FileSink>> {
        self.file.load_full()
    }

    pub fn custom_sink(&self) -> Option<Arc<CustomSink>> {
        self.custom.load_full()
    }

    /// Whether any sink would take a record at this level and domain
    pub fn would_log(&self, domain: LogDomain, level: LogLevel) -> bool {
        let probe = LogRecord::new(domain, level, "");
        self.console.load_full().is_some_and(|s| s.accepts(&probe))
            || self.file.load_full().is_some_and(|s| s.accepts(level))
            || self.custom.load_full().is_some_and(|s| s.accepts(&probe))
    }

    /// Deliver a record to every sink whose filters accept it
    ///
    /// Never fails. File write failures are reported on the console, rate
    /// limited. If the custom callback panics, the other sinks still get the
    /// record and the panic is resumed afterwards.
    pub fn emit(&self, domain: LogDomain, level: LogLevel, message: &str) {
        if level == LogLevel::None {
            return;
        }

        let console = self.console.load_full();
        let file = self.file.load_full();
        let custom = self.custom.load_full();
        let record = LogRecord::new(domain, level, message);

        let mut panicked = None;

        if let Some(sink) = custom.as_deref().filter(|s| s.accepts(&record)) {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| sink.emit(&record))) {
                panicked = Some(payload);
            }
        }

        if let Some(sink) = console.as_deref().filter(|s| s.accepts(&record)) {
            sink.emit(&record);
        }

        if let Some(sink) = file.as_deref() {
            if let Err(e) = sink.emit(&record) {
                self.report_file_failure(console.as_deref(), &e);
            }
        }

        if let Some(payload) = panicked {
            panic::resume_unwind(payload);
        }
    }

    fn report_file_failure(&self, console: Option<&ConsoleSink>, error: &LogError) {
        let Some(covered) = self.failures.report("file log sink", error) else {
            return;
        };
        // A console at level None is disabled, not a place to report to
        let Some(console) = console.filter(|c| c.config().level != LogLevel::None) else {
            return;
        };

        let message = if covered > 1 {
            format!("file logging failed {covered} times, dropping writes to the failed log file: {error}")
        } else {
            format!("file logging failed, dropping writes to the failed log file: {error}")
        };
        console.emit(&LogRecord::new(
            LogDomain::Database,
            LogLevel::Warning,
            &message,
        ));
    }
}

impl Default for LogRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "router_test.rs"]
mod router_test;
