//! Record formatting
//!
//! Turns a [`LogRecord`] into the bytes a sink writes. Messages are always
//! copied verbatim: `%s`, `{}` and the like are never interpreted.
//!
//! # Plaintext
//!
//! ```text
//! 2026-10-15T10:30:45.123456Z info database opened collection _default
//! ```
//!
//! A plaintext file starts with a banner line and a header line:
//!
//! ```text
//! 2026-10-15T10:30:45.000000Z ---- CouchbaseLite info log opened ----
//! 2026-10-15T10:30:45.000000Z CouchbaseLite/3.3.0 (linux; x86_64) Build/0 Commit/unknown
//! ```
//!
//! # Binary
//!
//! See [`cbllog_protocol::binary`] for the frame layout.

use std::fmt::Write as _;

use bytes::BytesMut;
use cbllog_protocol::{LogHeader, LogLevel, LogRecord, binary};
use chrono::{DateTime, SecondsFormat, Utc};

/// On-disk encoding of a file sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Binary,
    Plaintext,
}

impl LogFormat {
    /// Format selected by the `use_plaintext` flag
    pub const fn from_plaintext(use_plaintext: bool) -> Self {
        if use_plaintext {
            Self::Plaintext
        } else {
            Self::Binary
        }
    }

    pub const fn is_plaintext(self) -> bool {
        matches!(self, Self::Plaintext)
    }
}

/// RFC 3339 UTC timestamp with microsecond precision
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Append one record in the given format, returning the bytes appended
pub fn write_entry(buf: &mut BytesMut, format: LogFormat, record: &LogRecord<'_>) -> usize {
    match format {
        LogFormat::Binary => binary::encode_entry(buf, record),
        LogFormat::Plaintext => write_plaintext_entry(buf, record),
    }
}

/// Append one plaintext line, including the trailing newline
pub fn write_plaintext_entry(buf: &mut BytesMut, record: &LogRecord<'_>) -> usize {
    let start = buf.len();
    buf.reserve(48 + record.message.len());
    // fmt::Write for BytesMut never fails
    let _ = write!(
        buf,
        "{} {} {} ",
        format_timestamp(record.timestamp),
        record.level,
        record.domain
    );
    buf.extend_from_slice(record.message.as_bytes());
    buf.extend_from_slice(b"\n");
    buf.len() - start
}

/// Plaintext line as a string, without the trailing newline
pub fn plaintext_line(record: &LogRecord<'_>) -> String {
    let mut line = String::with_capacity(48 + record.message.len());
    let _ = write!(
        line,
        "{} {} {} {}",
        format_timestamp(record.timestamp),
        record.level,
        record.domain,
        record.message
    );
    line
}

/// Append the preamble every new log file starts with
///
/// Binary files get the magic and header record; plaintext files get a
/// banner line and a header line.
pub fn write_preamble(
    buf: &mut BytesMut,
    format: LogFormat,
    level: LogLevel,
    opened_at: DateTime<Utc>,
    header: &LogHeader,
) -> usize {
    match format {
        LogFormat::Binary => binary::encode_file_header(buf, level, opened_at, header),
        LogFormat::Plaintext => {
            let start = buf.len();
            let ts = format_timestamp(opened_at);
            let _ = writeln!(buf, "{ts} ---- {} {level} log opened ----", header.product);
            let _ = writeln!(
                buf,
                "{ts} {}/{} ({}) Build/{} Commit/{}",
                header.product, header.version, header.platform, header.build, header.commit
            );
            buf.len() - start
        }
    }
}

#[cfg(test)]
#[path = "format_test.rs"]
mod format_test;
