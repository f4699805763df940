//! Protocol error types
//!
//! Errors from converting raw level/domain values and from decoding binary
//! log files.

use std::io;

use thiserror::Error;

/// Errors that can occur during protocol operations
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// File does not start with the binary log magic
    #[error("bad magic: expected CF B2 AB 1B, got {0:02X?}")]
    BadMagic([u8; 4]),

    /// Header declares a format version this reader does not know
    #[error("unsupported binary log format version {0}")]
    UnsupportedVersion(u8),

    /// Input ended in the middle of a header or frame
    #[error("truncated {what}: expected {expected} bytes, got {actual}")]
    Truncated {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Raw level value out of range
    #[error("invalid log level value: {0}")]
    InvalidLevel(u8),

    /// Raw domain value is not a single known domain bit
    #[error("invalid log domain value: {0}")]
    InvalidDomain(u8),

    /// Unknown level or domain name
    #[error("unknown {kind} name '{name}'")]
    UnknownName { kind: &'static str, name: String },

    /// String field is not valid UTF-8
    #[error("invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),

    /// I/O error while reading
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ProtocolError {
    /// Create a truncated input error
    #[inline]
    pub fn truncated(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::Truncated {
            what,
            expected,
            actual,
        }
    }

    /// Create an unknown name error
    #[inline]
    pub fn unknown_name(kind: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownName {
            kind,
            name: name.into(),
        }
    }
}
