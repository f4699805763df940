//! cbllog Protocol - Core log types and the binary log format
//!
//! This crate provides the types every sink agrees on:
//! - `LogLevel` - ordered severity, with `None` as the "disabled" level
//! - `LogDomain` / `LogDomains` - subsystem tags and filter sets
//! - `LogRecord` - the transient value the router fans out to sinks
//! - `binary` - the `.cbllog` binary format (magic, header record, frames)
//!
//! # Filtering
//!
//! ```
//! use cbllog_protocol::{LogDomain, LogDomains, LogLevel, accepts, domain_matches};
//!
//! // A Warning sink takes Error and Warning, nothing more verbose
//! assert!(accepts(LogLevel::Error, LogLevel::Warning));
//! assert!(!accepts(LogLevel::Info, LogLevel::Warning));
//!
//! // Empty domain sets match everything
//! assert!(domain_matches(LogDomain::Query, LogDomains::EMPTY));
//! assert!(!domain_matches(LogDomain::Query, LogDomain::Database.into()));
//! ```

pub mod binary;
mod domain;
mod error;
mod level;
mod record;

pub use binary::{BinaryLogReader, FileHeader, LogHeader};
pub use domain::{LogDomain, LogDomains, domain_matches};
pub use error::ProtocolError;
pub use level::{LogLevel, accepts};
pub use record::{LogEntry, LogRecord};

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// File extension shared by binary and plaintext log files
pub const LOG_FILE_EXTENSION: &str = "cbllog";

// Test modules - only compiled during testing
#[cfg(test)]
mod binary_test;
#[cfg(test)]
mod domain_test;
