//! Log severity levels
//!
//! Levels are totally ordered from least to most severe. A sink configured
//! at a level accepts records at that level and every more severe one.
//! `None` sits above `Error` and disables a sink entirely.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Log severity level
///
/// The discriminants are the wire values used by the binary log format.
#[repr(u8)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug = 0,
    Verbose = 1,
    #[default]
    Info = 2,
    Warning = 3,
    Error = 4,
    /// Disables a sink; never attached to a record
    None = 5,
}

impl LogLevel {
    /// The five file buckets, most severe first
    pub const BUCKETS: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warning,
        LogLevel::Info,
        LogLevel::Verbose,
        LogLevel::Debug,
    ];

    /// Parse from raw byte value
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Debug),
            1 => Some(Self::Verbose),
            2 => Some(Self::Info),
            3 => Some(Self::Warning),
            4 => Some(Self::Error),
            5 => Some(Self::None),
            _ => None,
        }
    }

    /// Raw byte value
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Lowercase name, also used in log file names
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Verbose => "verbose",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::None => "none",
        }
    }

    /// Whether a sink at this level accepts a record at `record`
    #[inline]
    pub const fn accepts(self, record: LogLevel) -> bool {
        accepts(record, self)
    }

    /// Index into [`LogLevel::BUCKETS`], `None` for [`LogLevel::None`]
    #[inline]
    pub const fn bucket_index(self) -> Option<usize> {
        match self {
            Self::Error => Some(0),
            Self::Warning => Some(1),
            Self::Info => Some(2),
            Self::Verbose => Some(3),
            Self::Debug => Some(4),
            Self::None => None,
        }
    }
}

/// Whether a record at `record` passes a sink filter set to `sink`
///
/// True iff the record is at least as severe as the sink level. A `None`
/// sink never accepts, and a `None` record is never accepted.
#[inline]
pub const fn accepts(record: LogLevel, sink: LogLevel) -> bool {
    if matches!(sink, LogLevel::None) || matches!(record, LogLevel::None) {
        return false;
    }
    record as u8 >= sink as u8
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for LogLevel {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, ProtocolError> {
        Self::from_u8(value).ok_or(ProtocolError::InvalidLevel(value))
    }
}

impl FromStr for LogLevel {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "verbose" => Ok(Self::Verbose),
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "none" => Ok(Self::None),
            _ => Err(ProtocolError::unknown_name("level", s)),
        }
    }
}
