//! Tests for log domains and domain sets

use std::str::FromStr;

use crate::{LogDomain, LogDomains, ProtocolError, domain_matches};

#[test]
fn test_domain_bits_are_distinct_single_bits() {
    let mut seen = 0u8;
    for domain in LogDomain::ALL {
        assert_eq!(domain.bits().count_ones(), 1);
        assert_eq!(seen & domain.bits(), 0);
        seen |= domain.bits();
    }
    assert_eq!(LogDomains::ALL.bits(), seen);
}

#[test]
fn test_domain_try_from_rejects_multi_bit() {
    assert_eq!(LogDomain::try_from(4).unwrap(), LogDomain::Replicator);
    assert!(matches!(
        LogDomain::try_from(3),
        Err(ProtocolError::InvalidDomain(3))
    ));
    assert!(LogDomain::try_from(0).is_err());
}

#[test]
fn test_domain_from_str() {
    assert_eq!(LogDomain::from_str("query").unwrap(), LogDomain::Query);
    assert_eq!(
        LogDomain::from_str("peer_discovery").unwrap(),
        LogDomain::PeerDiscovery
    );
    assert!(LogDomain::from_str("blob").is_err());
}

#[test]
fn test_set_membership() {
    let set = LogDomain::Database | LogDomain::Network;
    assert!(set.contains(LogDomain::Database));
    assert!(set.contains(LogDomain::Network));
    assert!(!set.contains(LogDomain::Query));

    assert!(domain_matches(LogDomain::Database, set));
    assert!(!domain_matches(LogDomain::Replicator, set));
}

#[test]
fn test_empty_and_all_match_everything() {
    for domain in LogDomain::ALL {
        assert!(LogDomains::EMPTY.matches(domain));
        assert!(LogDomains::ALL.matches(domain));
    }
}

#[test]
fn test_from_bits_rejects_unknown_bits() {
    assert!(LogDomains::from_bits(0x80).is_none());
    assert_eq!(LogDomains::from_bits(0x03).unwrap().bits(), 0x03);
}

#[test]
fn test_insert_remove_and_iter() {
    let mut set = LogDomains::EMPTY;
    set.insert(LogDomain::Query);
    set |= LogDomain::Listener;
    assert_eq!(
        set.iter().collect::<Vec<_>>(),
        vec![LogDomain::Query, LogDomain::Listener]
    );

    set.remove(LogDomain::Query);
    assert_eq!(set.iter().collect::<Vec<_>>(), vec![LogDomain::Listener]);
}

#[test]
fn test_collect_from_iterator() {
    let set: LogDomains = [LogDomain::Database, LogDomain::Multipeer]
        .into_iter()
        .collect();
    assert!(set.contains(LogDomain::Multipeer));
    assert!(!set.contains(LogDomain::Query));
}
