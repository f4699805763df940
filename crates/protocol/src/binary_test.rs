//! Tests for the binary log format

use std::io::{Cursor, Write};

use bytes::BytesMut;
use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use crate::binary::{
    self, BinaryLogReader, ENTRY_FIXED_SIZE, FORMAT_VERSION, LogHeader, MAGIC,
};
use crate::{LogDomain, LogLevel, LogRecord, ProtocolError};

fn ts(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap()
}

fn test_header() -> LogHeader {
    LogHeader {
        product: "CouchbaseLite".into(),
        version: "3.3.0".into(),
        build: "42".into(),
        commit: "abc123".into(),
        platform: "linux; x86_64".into(),
    }
}

#[test]
fn test_header_starts_with_magic() {
    let mut buf = BytesMut::new();
    let n = binary::encode_file_header(&mut buf, LogLevel::Info, ts(0), &test_header());

    assert_eq!(n, buf.len());
    assert_eq!(&buf[..4], &MAGIC);
    assert_eq!(&buf[..4], &[0xCF, 0xB2, 0xAB, 0x1B]);
    assert!(binary::has_magic(&buf));
    assert_eq!(buf[4], FORMAT_VERSION);
}

#[test]
fn test_entry_size_matches_encoding() {
    let record = LogRecord::with_timestamp(LogDomain::Query, LogLevel::Warning, "hello", ts(5));
    let mut buf = BytesMut::new();
    let n = binary::encode_entry(&mut buf, &record);

    assert_eq!(n, ENTRY_FIXED_SIZE + 5);
    assert_eq!(n, binary::entry_size(&record));
    assert_eq!(buf[8], LogLevel::Warning.as_u8());
    assert_eq!(buf[9], LogDomain::Query.bits());
    assert_eq!(&buf[14..], b"hello");
}

#[test]
fn test_reader_decodes_header_and_entries() {
    let header = test_header();
    let mut buf = BytesMut::new();
    binary::encode_file_header(&mut buf, LogLevel::Verbose, ts(1_000_000), &header);

    let messages = ["first", "Hello %s there", "מזג האוויר נחמד היום"];
    for (i, msg) in messages.iter().enumerate() {
        let record = LogRecord::with_timestamp(
            LogDomain::Database,
            LogLevel::Verbose,
            msg,
            ts(2_000_000 + i as i64),
        );
        binary::encode_entry(&mut buf, &record);
    }

    let mut reader = BinaryLogReader::new(Cursor::new(buf.to_vec())).unwrap();
    assert_eq!(reader.header().level, LogLevel::Verbose);
    assert_eq!(reader.header().opened_at, ts(1_000_000));
    assert_eq!(reader.header().meta, header);

    let entries = reader.read_all().unwrap();
    assert_eq!(entries.len(), 3);
    for (entry, msg) in entries.iter().zip(messages) {
        assert_eq!(entry.message, msg);
        assert_eq!(entry.domain, LogDomain::Database);
    }
    assert_eq!(entries[2].timestamp, ts(2_000_002));
}

#[test]
fn test_reader_rejects_bad_magic() {
    let data = b"---- plaintext log ----\n".to_vec();
    let err = BinaryLogReader::new(Cursor::new(data)).err().unwrap();
    assert!(matches!(err, ProtocolError::BadMagic(_)));
}

#[test]
fn test_reader_rejects_unknown_version() {
    let mut buf = BytesMut::new();
    binary::encode_file_header(&mut buf, LogLevel::Info, ts(0), &test_header());
    buf[4] = 99;

    let err = BinaryLogReader::new(Cursor::new(buf.to_vec())).err().unwrap();
    assert!(matches!(err, ProtocolError::UnsupportedVersion(99)));
}

#[test]
fn test_reader_reports_truncated_frame() {
    let mut buf = BytesMut::new();
    binary::encode_file_header(&mut buf, LogLevel::Info, ts(0), &test_header());
    let record = LogRecord::with_timestamp(LogDomain::Network, LogLevel::Info, "cut off", ts(1));
    binary::encode_entry(&mut buf, &record);
    let cut = buf.len() - 3;

    let mut reader = BinaryLogReader::new(Cursor::new(buf[..cut].to_vec())).unwrap();
    let err = reader.read_entry().unwrap_err();
    assert!(matches!(err, ProtocolError::Truncated { what: "message", .. }));
}

#[test]
fn test_reader_corrupt_length_reports_truncated() {
    let mut buf = BytesMut::new();
    binary::encode_file_header(&mut buf, LogLevel::Info, ts(0), &test_header());
    let record = LogRecord::with_timestamp(LogDomain::Query, LogLevel::Info, "short", ts(1));
    let start = buf.len();
    binary::encode_entry(&mut buf, &record);
    // Length field claims ~4 GiB while only five message bytes follow
    buf[start + 10..start + 14].copy_from_slice(&u32::MAX.to_be_bytes());

    let mut reader = BinaryLogReader::new(Cursor::new(buf.to_vec())).unwrap();
    match reader.read_entry().unwrap_err() {
        ProtocolError::Truncated {
            what,
            expected,
            actual,
        } => {
            assert_eq!(what, "message");
            assert_eq!(expected, u32::MAX as usize);
            assert_eq!(actual, 5);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_reader_empty_body() {
    let mut buf = BytesMut::new();
    binary::encode_file_header(&mut buf, LogLevel::Error, ts(0), &test_header());

    let mut reader = BinaryLogReader::new(Cursor::new(buf.to_vec())).unwrap();
    assert!(reader.read_entry().unwrap().is_none());
}

#[test]
fn test_open_from_file_and_iterate() {
    let mut buf = BytesMut::new();
    binary::encode_file_header(&mut buf, LogLevel::Debug, ts(0), &test_header());
    for i in 0..5 {
        let msg = format!("message {}", i);
        let record = LogRecord::with_timestamp(LogDomain::Replicator, LogLevel::Debug, &msg, ts(i));
        binary::encode_entry(&mut buf, &record);
    }

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&buf).unwrap();
    file.flush().unwrap();

    let reader = BinaryLogReader::open(file.path()).unwrap();
    let entries: Vec<_> = reader.entries().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(entries.len(), 5);
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.message, format!("message {}", i));
        assert_eq!(entry.as_record().level, LogLevel::Debug);
    }
}

#[test]
fn test_long_header_field_truncated_on_char_boundary() {
    let mut header = test_header();
    header.commit = "é".repeat(40_000);

    let mut buf = BytesMut::new();
    binary::encode_file_header(&mut buf, LogLevel::Info, ts(0), &header);

    let reader = BinaryLogReader::new(Cursor::new(buf.to_vec())).unwrap();
    let commit = &reader.header().meta.commit;
    assert!(commit.len() <= u16::MAX as usize);
    assert!(commit.chars().all(|c| c == 'é'));
}
