//! Log domains and domain sets
//!
//! Every record is tagged with exactly one [`LogDomain`]. Sinks filter on a
//! [`LogDomains`] set, which is a bitmask restricted to known domains.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Subsystem that produced a log record
///
/// Each discriminant is a single bit so a domain maps directly onto
/// [`LogDomains`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogDomain {
    Database = 1,
    Query = 2,
    Replicator = 4,
    Network = 8,
    Listener = 16,
    PeerDiscovery = 32,
    Multipeer = 64,
}

impl LogDomain {
    /// All domains in bit order
    pub const ALL: [LogDomain; 7] = [
        LogDomain::Database,
        LogDomain::Query,
        LogDomain::Replicator,
        LogDomain::Network,
        LogDomain::Listener,
        LogDomain::PeerDiscovery,
        LogDomain::Multipeer,
    ];

    /// Parse from a single-bit raw value
    #[inline]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            1 => Some(Self::Database),
            2 => Some(Self::Query),
            4 => Some(Self::Replicator),
            8 => Some(Self::Network),
            16 => Some(Self::Listener),
            32 => Some(Self::PeerDiscovery),
            64 => Some(Self::Multipeer),
            _ => None,
        }
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Lowercase name as written in plaintext logs
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Query => "query",
            Self::Replicator => "replicator",
            Self::Network => "network",
            Self::Listener => "listener",
            Self::PeerDiscovery => "peer_discovery",
            Self::Multipeer => "multipeer",
        }
    }
}

impl fmt::Display for LogDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for LogDomain {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_bits(value).ok_or(ProtocolError::InvalidDomain(value))
    }
}

impl FromStr for LogDomain {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == lower)
            .ok_or_else(|| ProtocolError::unknown_name("domain", s))
    }
}

/// Set of log domains
///
/// An empty set matches every domain, the same as [`LogDomains::ALL`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LogDomains(u8);

impl LogDomains {
    /// Mask of every known domain bit
    const MASK: u8 = 0x7f;

    /// The empty set
    pub const EMPTY: LogDomains = LogDomains(0);

    /// Every domain
    pub const ALL: LogDomains = LogDomains(Self::MASK);

    /// Build from raw bits, rejecting unknown bits
    #[inline]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::MASK != 0 {
            None
        } else {
            Some(Self(bits))
        }
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn contains(self, domain: LogDomain) -> bool {
        self.0 & domain.bits() != 0
    }

    #[inline]
    pub fn insert(&mut self, domain: LogDomain) {
        self.0 |= domain.bits();
    }

    #[inline]
    pub fn remove(&mut self, domain: LogDomain) {
        self.0 &= !domain.bits();
    }

    /// Whether a record tagged with `domain` passes this filter
    #[inline]
    pub const fn matches(self, domain: LogDomain) -> bool {
        domain_matches(domain, self)
    }

    /// Iterate over the domains in this set, in bit order
    pub fn iter(self) -> impl Iterator<Item = LogDomain> {
        LogDomain::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

/// Whether a record tagged with `domain` passes the `domains` filter
#[inline]
pub const fn domain_matches(domain: LogDomain, domains: LogDomains) -> bool {
    domains.is_empty() || domains.contains(domain)
}

impl From<LogDomain> for LogDomains {
    fn from(domain: LogDomain) -> Self {
        Self(domain.bits())
    }
}

impl FromIterator<LogDomain> for LogDomains {
    fn from_iter<I: IntoIterator<Item = LogDomain>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for domain in iter {
            set.insert(domain);
        }
        set
    }
}

impl BitOr for LogDomains {
    type Output = LogDomains;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOr<LogDomain> for LogDomains {
    type Output = LogDomains;

    fn bitor(self, rhs: LogDomain) -> Self::Output {
        Self(self.0 | rhs.bits())
    }
}

impl BitOr for LogDomain {
    type Output = LogDomains;

    fn bitor(self, rhs: Self) -> Self::Output {
        LogDomains(self.bits() | rhs.bits())
    }
}

impl BitOrAssign<LogDomain> for LogDomains {
    fn bitor_assign(&mut self, rhs: LogDomain) {
        self.insert(rhs);
    }
}
