//! Reader for binary log files

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use chrono::{DateTime, Utc};

use super::{ENTRY_FIXED_SIZE, FORMAT_VERSION, FileHeader, LogHeader, MAGIC};
use crate::{LogDomain, LogEntry, LogLevel, ProtocolError, Result};

/// Sequential reader for binary log files
///
/// The magic and header record are read and validated on construction;
/// entries are then pulled one frame at a time.
pub struct BinaryLogReader<R: Read> {
    reader: R,
    header: FileHeader,
}

impl BinaryLogReader<BufReader<File>> {
    /// Open a binary log file for reading
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::with_capacity(32 * 1024, file))
    }
}

impl<R: Read> BinaryLogReader<R> {
    /// Wrap a reader positioned at the start of a binary log file
    pub fn new(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        let n = fill(&mut reader, &mut magic)?;
        if n < magic.len() {
            return Err(ProtocolError::truncated("magic", magic.len(), n));
        }
        if magic != MAGIC {
            return Err(ProtocolError::BadMagic(magic));
        }

        let mut fixed = [0u8; 10];
        read_exact(&mut reader, &mut fixed, "header")?;
        let format_version = fixed[0];
        if format_version != FORMAT_VERSION {
            return Err(ProtocolError::UnsupportedVersion(format_version));
        }
        let opened_at = from_micros(u64::from_be_bytes(fixed[1..9].try_into().unwrap_or_default()));
        let level = LogLevel::try_from(fixed[9])?;

        let meta = LogHeader {
            product: read_str16(&mut reader, "product")?,
            version: read_str16(&mut reader, "version")?,
            build: read_str16(&mut reader, "build")?,
            commit: read_str16(&mut reader, "commit")?,
            platform: read_str16(&mut reader, "platform")?,
        };

        Ok(Self {
            reader,
            header: FileHeader {
                format_version,
                opened_at,
                level,
                meta,
            },
        })
    }

    /// The decoded header record
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Read the next entry
    ///
    /// Returns `None` at a clean end of file and `Truncated` if the file ends
    /// inside a frame.
    pub fn read_entry(&mut self) -> Result<Option<LogEntry>> {
        let mut fixed = [0u8; ENTRY_FIXED_SIZE];
        let n = fill(&mut self.reader, &mut fixed)?;
        if n == 0 {
            return Ok(None);
        }
        if n < ENTRY_FIXED_SIZE {
            return Err(ProtocolError::truncated("entry", ENTRY_FIXED_SIZE, n));
        }

        let timestamp = from_micros(u64::from_be_bytes(fixed[0..8].try_into().unwrap_or_default()));
        let level = LogLevel::try_from(fixed[8])?;
        let domain = LogDomain::try_from(fixed[9])?;
        let len = u32::from_be_bytes(fixed[10..14].try_into().unwrap_or_default()) as usize;

        // The length comes from the file, so grow the buffer as bytes arrive
        let mut message = Vec::with_capacity(len.min(64 * 1024));
        let n = (&mut self.reader).take(len as u64).read_to_end(&mut message)?;
        if n < len {
            return Err(ProtocolError::truncated("message", len, n));
        }
        let message = String::from_utf8(message).map_err(|_| ProtocolError::InvalidUtf8("message"))?;

        Ok(Some(LogEntry {
            domain,
            level,
            message,
            timestamp,
        }))
    }

    /// Read every remaining entry
    pub fn read_all(&mut self) -> Result<Vec<LogEntry>> {
        let mut entries = Vec::new();
        while let Some(entry) = self.read_entry()? {
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Iterate over the remaining entries
    pub fn entries(self) -> EntryIterator<R> {
        EntryIterator { reader: self }
    }
}

/// Iterator over entries in a binary log file
pub struct EntryIterator<R: Read> {
    reader: BinaryLogReader<R>,
}

impl<R: Read> Iterator for EntryIterator<R> {
    type Item = Result<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_entry().transpose()
    }
}

/// Read until `buf` is full or EOF, returning the number of bytes read
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], what: &'static str) -> Result<()> {
    let n = fill(reader, buf)?;
    if n < buf.len() {
        return Err(ProtocolError::truncated(what, buf.len(), n));
    }
    Ok(())
}

fn read_str16<R: Read>(reader: &mut R, what: &'static str) -> Result<String> {
    let mut len = [0u8; 2];
    read_exact(reader, &mut len, what)?;
    let mut bytes = vec![0u8; u16::from_be_bytes(len) as usize];
    read_exact(reader, &mut bytes, what)?;
    String::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8(what))
}

fn from_micros(micros: u64) -> DateTime<Utc> {
    i64::try_from(micros)
        .ok()
        .and_then(DateTime::from_timestamp_micros)
        .unwrap_or_default()
}
