//! Tests for the log router

use std::fs;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::Arc;

use cbllog_config::LogSinksConfig;
use cbllog_protocol::{LogDomain, LogLevel};
use parking_lot::Mutex;
use tempfile::TempDir;

use crate::console::{ConsoleConfig, ConsoleSink};
use crate::custom::{CustomConfig, LogSink};
use crate::error::LogError;
use crate::file::FileConfig;
use crate::router::LogRouter;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().clone()).unwrap()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct Counter {
    messages: Mutex<Vec<String>>,
}

impl LogSink for Counter {
    fn write_log(&self, _: LogLevel, _: LogDomain, message: &str) {
        self.messages.lock().push(message.to_owned());
    }
}

struct PanickingSink;

impl LogSink for PanickingSink {
    fn write_log(&self, _: LogLevel, _: LogDomain, _: &str) {
        panic!("callback failed");
    }
}

/// Router with a captured console and nothing else
fn quiet_router(console: ConsoleConfig) -> (LogRouter, Capture) {
    let router = LogRouter::new();
    let capture = Capture::default();
    router.install_console(Some(Arc::new(ConsoleSink::with_writer(
        console,
        Box::new(capture.clone()),
    ))));
    (router, capture)
}

#[test]
fn test_initial_state() {
    let router = LogRouter::new();
    let console = router.console_sink().unwrap();
    assert_eq!(console.config().level, LogLevel::Warning);
    assert!(router.file_sink().is_none());
    assert!(router.custom_sink().is_none());
}

#[test]
fn test_custom_sink_counts_by_level() {
    let (router, _) = quiet_router(ConsoleConfig::new(LogLevel::None));
    let levels = [
        LogLevel::Verbose,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
    ];

    for (threshold, expected) in [
        (LogLevel::Verbose, 4),
        (LogLevel::Info, 3),
        (LogLevel::Warning, 2),
        (LogLevel::Error, 1),
        (LogLevel::None, 0),
    ] {
        let counter = Arc::new(Counter::default());
        router.set_custom_sink(Some(CustomConfig::new(threshold, counter.clone())));
        for level in levels {
            router.emit(LogDomain::Database, level, "TEST MESSAGE");
        }
        assert_eq!(counter.messages.lock().len(), expected, "threshold {threshold}");
    }
}

#[test]
fn test_custom_sink_domain_filter() {
    let (router, _) = quiet_router(ConsoleConfig::new(LogLevel::None));
    let counter = Arc::new(Counter::default());
    router.set_custom_sink(Some(
        CustomConfig::new(LogLevel::Debug, counter.clone()).with_domains(LogDomain::Replicator),
    ));

    router.emit(LogDomain::Replicator, LogLevel::Info, "kept");
    router.emit(LogDomain::Query, LogLevel::Info, "filtered");

    assert_eq!(*counter.messages.lock(), vec!["kept".to_owned()]);
}

#[test]
fn test_console_filters() {
    let (router, capture) =
        quiet_router(ConsoleConfig::new(LogLevel::Info).with_domains(LogDomain::Network));

    router.emit(LogDomain::Network, LogLevel::Info, "shown");
    router.emit(LogDomain::Network, LogLevel::Verbose, "too verbose");
    router.emit(LogDomain::Database, LogLevel::Error, "other domain");

    let text = capture.text();
    assert!(text.contains("info network shown"));
    assert!(!text.contains("too verbose"));
    assert!(!text.contains("other domain"));
}

#[test]
fn test_removed_sinks_receive_nothing() {
    let (router, capture) = quiet_router(ConsoleConfig::new(LogLevel::Debug));
    let counter = Arc::new(Counter::default());
    router.set_custom_sink(Some(CustomConfig::new(LogLevel::Debug, counter.clone())));

    router.install_console(None);
    router.set_custom_sink(None);
    router.emit(LogDomain::Database, LogLevel::Error, "nobody listens");

    assert!(capture.text().is_empty());
    assert!(counter.messages.lock().is_empty());
}

#[test]
fn test_invalid_file_sink_keeps_previous() {
    let dir = TempDir::new().unwrap();
    let router = LogRouter::new();
    router
        .set_file_sink(Some(FileConfig::new(dir.path())))
        .unwrap();

    let err = router
        .set_file_sink(Some(FileConfig::new(dir.path()).with_max_kept_files(0)))
        .unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(router.file_sink().unwrap().config().max_kept_files, 2);

    let blocker = dir.path().join("file");
    fs::write(&blocker, b"x").unwrap();
    let err = router
        .set_file_sink(Some(FileConfig::new(&blocker)))
        .unwrap_err();
    assert!(matches!(err, LogError::InvalidDirectory { .. }));
    assert_eq!(router.file_sink().unwrap().directory(), dir.path());
}

#[test]
fn test_file_failure_reported_on_console() {
    let dir = TempDir::new().unwrap();
    let logs = dir.path().join("logs");
    let (router, capture) = quiet_router(ConsoleConfig::new(LogLevel::Error));
    router
        .set_file_sink(Some(FileConfig::new(&logs).with_plaintext(true)))
        .unwrap();
    fs::remove_dir_all(&logs).unwrap();

    router.emit(LogDomain::Database, LogLevel::Info, "lost");
    router.emit(LogDomain::Database, LogLevel::Info, "lost again");

    let text = capture.text();
    assert!(text.contains("warning database file logging failed"), "got {text}");
    assert_eq!(text.lines().count(), 1);

    let file = router.file_sink().unwrap();
    assert!(file.is_failed(LogLevel::Info));
    assert_eq!(file.metrics().snapshot().dropped, 1);
}

#[test]
fn test_file_failure_not_written_to_disabled_console() {
    let dir = TempDir::new().unwrap();
    let logs = dir.path().join("logs");
    let (router, capture) = quiet_router(ConsoleConfig::new(LogLevel::None));
    router
        .set_file_sink(Some(FileConfig::new(&logs).with_plaintext(true)))
        .unwrap();
    fs::remove_dir_all(&logs).unwrap();

    router.emit(LogDomain::Database, LogLevel::Info, "lost");

    assert!(capture.text().is_empty(), "got {}", capture.text());
    assert!(router.file_sink().unwrap().is_failed(LogLevel::Info));
}

#[test]
fn test_reset_rearms_failure_reporting() {
    let dir = TempDir::new().unwrap();
    let logs = dir.path().join("logs");
    let (router, first) = quiet_router(ConsoleConfig::new(LogLevel::Error));
    router
        .set_file_sink(Some(FileConfig::new(&logs).with_plaintext(true)))
        .unwrap();
    fs::remove_dir_all(&logs).unwrap();
    router.emit(LogDomain::Database, LogLevel::Info, "lost");
    assert_eq!(first.text().lines().count(), 1);

    router.reset();

    let second = Capture::default();
    router.install_console(Some(Arc::new(ConsoleSink::with_writer(
        ConsoleConfig::new(LogLevel::Error),
        Box::new(second.clone()),
    ))));
    router
        .set_file_sink(Some(FileConfig::new(&logs).with_plaintext(true)))
        .unwrap();
    fs::remove_dir_all(&logs).unwrap();
    router.emit(LogDomain::Database, LogLevel::Info, "lost after reset");

    let text = second.text();
    assert!(text.contains("file logging failed"), "got {text}");
}

#[test]
fn test_custom_panic_does_not_stop_fan_out() {
    let dir = TempDir::new().unwrap();
    let (router, capture) = quiet_router(ConsoleConfig::new(LogLevel::Info));
    router
        .set_file_sink(Some(FileConfig::new(dir.path()).with_plaintext(true)))
        .unwrap();
    router.set_custom_sink(Some(CustomConfig::new(
        LogLevel::Info,
        Arc::new(PanickingSink),
    )));

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        router.emit(LogDomain::Database, LogLevel::Info, "still delivered");
    }));
    assert!(result.is_err());

    assert!(capture.text().contains("still delivered"));
    let files = router.file_sink().unwrap().files(LogLevel::Info);
    assert!(fs::read_to_string(&files[0]).unwrap().contains("still delivered"));
}

#[test]
fn test_none_level_record_dropped() {
    let (router, capture) = quiet_router(ConsoleConfig::new(LogLevel::Debug));
    let counter = Arc::new(Counter::default());
    router.set_custom_sink(Some(CustomConfig::new(LogLevel::Debug, counter.clone())));

    router.emit(LogDomain::Database, LogLevel::None, "never");

    assert!(capture.text().is_empty());
    assert!(counter.messages.lock().is_empty());
}

#[test]
fn test_would_log() {
    let dir = TempDir::new().unwrap();
    let (router, _) = quiet_router(ConsoleConfig::new(LogLevel::Warning));

    assert!(router.would_log(LogDomain::Query, LogLevel::Error));
    assert!(!router.would_log(LogDomain::Query, LogLevel::Info));

    router
        .set_file_sink(Some(FileConfig::new(dir.path()).with_level(LogLevel::Info)))
        .unwrap();
    assert!(router.would_log(LogDomain::Query, LogLevel::Info));
    assert!(!router.would_log(LogDomain::Query, LogLevel::Debug));
}

#[test]
fn test_apply_config() {
    let dir = TempDir::new().unwrap();
    let toml = format!(
        "[console]\nlevel = \"error\"\n\n[file]\ndirectory = {:?}\nlevel = \"verbose\"\nuse_plaintext = true\n",
        dir.path().display().to_string()
    );
    let config = LogSinksConfig::from_str(&toml).unwrap();

    let router = LogRouter::new();
    router.apply_config(&config).unwrap();

    assert_eq!(router.console_sink().unwrap().config().level, LogLevel::Error);
    let file = router.file_sink().unwrap();
    assert_eq!(file.config().level, LogLevel::Verbose);
    assert!(file.config().use_plaintext);

    let disabled = LogSinksConfig::from_str("[console]\nenabled = false").unwrap();
    router.apply_config(&disabled).unwrap();
    assert!(router.console_sink().is_none());
    assert!(router.file_sink().is_none());
}

#[test]
fn test_apply_invalid_config_changes_nothing() {
    let router = LogRouter::new();
    let mut config = LogSinksConfig::default();
    config.console.level = LogLevel::Debug;
    config.file = Some(cbllog_config::FileSinkConfig::default());

    let err = router.apply_config(&config).unwrap_err();
    assert!(matches!(err, LogError::Config(_)));
    assert_eq!(router.console_sink().unwrap().config().level, LogLevel::Warning);
    assert!(router.file_sink().is_none());
}

#[test]
fn test_reset() {
    let dir = TempDir::new().unwrap();
    let router = LogRouter::new();
    router.set_console_sink(None);
    router
        .set_file_sink(Some(FileConfig::new(dir.path())))
        .unwrap();
    router.set_custom_sink(Some(CustomConfig::new(
        LogLevel::Info,
        Arc::new(Counter::default()),
    )));

    router.reset();

    assert_eq!(router.console_sink().unwrap().config().level, LogLevel::Warning);
    assert!(router.file_sink().is_none());
    assert!(router.custom_sink().is_none());
}
