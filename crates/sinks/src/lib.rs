//! cbllog - Sinks
//!
//! Console, rotating file and custom log sinks, and the [`LogRouter`] that
//! fans records out to them.
//!
//! # Architecture
//!
//! ```text
//!                    ┌──> [ConsoleSink] --> stderr
//! emit() --> [LogRouter] ──> [FileSink] --> [BucketSet] --> cbl_<level>_<id>.cbllog
//!                    └──> [CustomSink] --> LogSink callback
//! ```
//!
//! Everything runs on the caller's thread. Sinks are immutable once built;
//! the router swaps whole sinks atomically.
//!
//! # Available Sinks
//!
//! | Sink | Filters | Output |
//! |------|---------|--------|
//! | `console` | level, domain | plaintext lines on stderr |
//! | `file` | level | per-level rotating files, binary or plaintext |
//! | `custom` | level, domain | application callback |
//!
//! # Example
//!
//! ```no_run
//! use cbllog_protocol::{LogDomain, LogLevel};
//! use cbllog_sinks::{FileConfig, LogRouter};
//!
//! let router = LogRouter::new();
//! router
//!     .set_file_sink(Some(
//!         FileConfig::new("/var/log/app")
//!             .with_level(LogLevel::Verbose)
//!             .with_plaintext(true),
//!     ))
//!     .expect("log directory is writable");
//!
//! router.emit(LogDomain::Database, LogLevel::Info, "database opened");
//! ```

pub mod console;
pub mod custom;
pub mod file;
pub mod format;
pub mod router;
pub mod util;

mod error;
mod metrics;

pub use cbllog_config::BucketPolicy;
pub use console::{ConsoleConfig, ConsoleSink};
pub use custom::{CustomConfig, CustomSink, LogSink};
pub use error::{LogError, Result};
pub use file::{FileConfig, FileSink};
pub use format::LogFormat;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use router::LogRouter;
