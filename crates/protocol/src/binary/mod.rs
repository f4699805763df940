//! Binary log file format
//!
//! A binary log file is laid out as:
//!
//! ```text
//! [4-byte magic CF B2 AB 1B][header record][entry frame]*
//! ```
//!
//! Header record:
//! - `format_version`: u8
//! - `opened_at`: u64 big-endian, microseconds since the Unix epoch
//! - `level`: u8, the bucket level this file belongs to
//! - product, version, build, commit, platform: each a u16 big-endian
//!   length followed by that many UTF-8 bytes
//!
//! Entry frame (14-byte fixed part, then the message):
//! - `timestamp`: u64 big-endian, microseconds since the Unix epoch
//! - `level`: u8
//! - `domain`: u8, single domain bit
//! - `length`: u32 big-endian
//! - message bytes

mod reader;

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Utc};

use crate::{LogLevel, LogRecord};

pub use reader::BinaryLogReader;

/// Magic bytes at the start of every binary log file
pub const MAGIC: [u8; 4] = [0xCF, 0xB2, 0xAB, 0x1B];

/// Current binary format version
pub const FORMAT_VERSION: u8 = 1;

/// Size of the fixed part of an entry frame
pub const ENTRY_FIXED_SIZE: usize = 8 + 1 + 1 + 4;

/// Build and product metadata written at the top of every log file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogHeader {
    /// Product name, e.g. `CouchbaseLite`
    pub product: String,
    /// Product version
    pub version: String,
    /// Build identifier
    pub build: String,
    /// Source commit identifier
    pub commit: String,
    /// Platform description
    pub platform: String,
}

impl Default for LogHeader {
    fn default() -> Self {
        Self {
            product: "CouchbaseLite".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            build: "0".into(),
            commit: "unknown".into(),
            platform: format!("{}; {}", std::env::consts::OS, std::env::consts::ARCH),
        }
    }
}

/// Decoded header record of a binary log file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub format_version: u8,
    pub opened_at: DateTime<Utc>,
    pub level: LogLevel,
    pub meta: LogHeader,
}

/// Append the magic and header record for a new file
///
/// Returns the number of bytes appended.
pub fn encode_file_header(
    buf: &mut BytesMut,
    level: LogLevel,
    opened_at: DateTime<Utc>,
    meta: &LogHeader,
) -> usize {
    let start = buf.len();
    buf.extend_from_slice(&MAGIC);
    buf.put_u8(FORMAT_VERSION);
    buf.put_u64(micros(opened_at));
    buf.put_u8(level.as_u8());
    for field in [
        &meta.product,
        &meta.version,
        &meta.build,
        &meta.commit,
        &meta.platform,
    ] {
        put_str16(buf, field);
    }
    buf.len() - start
}

/// Append one entry frame
///
/// Returns the number of bytes appended.
pub fn encode_entry(buf: &mut BytesMut, record: &LogRecord<'_>) -> usize {
    let message = record.message.as_bytes();
    let len = message.len().min(u32::MAX as usize);

    buf.reserve(ENTRY_FIXED_SIZE + len);
    buf.put_u64(micros(record.timestamp));
    buf.put_u8(record.level.as_u8());
    buf.put_u8(record.domain.bits());
    buf.put_u32(len as u32);
    buf.extend_from_slice(&message[..len]);
    ENTRY_FIXED_SIZE + len
}

/// Encoded size of an entry frame
#[inline]
pub fn entry_size(record: &LogRecord<'_>) -> usize {
    ENTRY_FIXED_SIZE + record.message.len().min(u32::MAX as usize)
}

/// Whether `bytes` starts with the binary log magic
#[inline]
pub fn has_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(&MAGIC)
}

fn micros(ts: DateTime<Utc>) -> u64 {
    // Pre-epoch timestamps clamp to zero
    u64::try_from(ts.timestamp_micros()).unwrap_or(0)
}

/// Write a u16-length-prefixed string, truncated on a char boundary
fn put_str16(buf: &mut BytesMut, s: &str) {
    let mut end = s.len().min(u16::MAX as usize);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    buf.put_u16(end as u16);
    buf.extend_from_slice(&s.as_bytes()[..end]);
}
