//! Directory listing records.
//!
//! A LIST_DIRECTORY acknowledgement packs records back to back with no count:
//! `F<name>\t<size>\0` for files and `D<name>\0` for directories.

use super::types::{DirectoryEntry, EntryKind};
use crate::core::error::{FtpError, FtpResult};

const FILE_MARKER: u8 = b'F';
const DIRECTORY_MARKER: u8 = b'D';
const SIZE_SEPARATOR: u8 = b'\t';
const TERMINATOR: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Type,
    FileName,
    Size,
    DirName,
    Store,
}

/// Record being assembled by the scanner
#[derive(Debug)]
struct PendingRecord {
    kind: EntryKind,
    name: String,
    digits: String,
}

impl PendingRecord {
    fn new(kind: EntryKind) -> Self {
        Self {
            kind,
            name: String::new(),
            digits: String::new(),
        }
    }

    fn finish(self) -> FtpResult<DirectoryEntry> {
        match self.kind {
            EntryKind::File => {
                let size = self
                    .digits
                    .parse::<u64>()
                    .map_err(|_| FtpError::InvalidEntrySize(self.digits.clone()))?;
                Ok(DirectoryEntry::file(self.name, size))
            }
            EntryKind::Directory => Ok(DirectoryEntry::directory(self.name)),
        }
    }
}

/// Decode one listing page into entries, in wire order.
///
/// A record cut off before its terminator is dropped without error.
pub fn decode_listing(data: &[u8]) -> FtpResult<Vec<DirectoryEntry>> {
    let mut entries = Vec::new();
    let mut state = ScanState::Type;
    let mut record: Option<PendingRecord> = None;

    for &byte in data {
        state = match (state, record.as_mut()) {
            (ScanState::Type, _) => match byte {
                FILE_MARKER => {
                    record = Some(PendingRecord::new(EntryKind::File));
                    ScanState::FileName
                }
                DIRECTORY_MARKER => {
                    record = Some(PendingRecord::new(EntryKind::Directory));
                    ScanState::DirName
                }
                other => return Err(FtpError::UnknownEntryType(other)),
            },
            (ScanState::FileName, Some(_)) if byte == SIZE_SEPARATOR => ScanState::Size,
            (ScanState::FileName, Some(current)) => {
                current.name.push(byte as char);
                ScanState::FileName
            }
            (ScanState::Size, Some(_)) if byte == TERMINATOR => ScanState::Store,
            (ScanState::Size, Some(current)) => {
                current.digits.push(byte as char);
                ScanState::Size
            }
            (ScanState::DirName, Some(_)) if byte == TERMINATOR => ScanState::Store,
            (ScanState::DirName, Some(current)) => {
                current.name.push(byte as char);
                ScanState::DirName
            }
            // Every other combination means the record slot is out of step; restart.
            _ => ScanState::Type,
        };

        if state == ScanState::Store {
            if let Some(done) = record.take() {
                entries.push(done.finish()?);
            }
            state = ScanState::Type;
        }
    }

    Ok(entries)
}

/// Wire form of a single entry, as a server writes it into a listing page
pub fn encode_entry(entry: &DirectoryEntry) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(entry.name.len() + 12);
    match entry.kind {
        EntryKind::File => {
            bytes.push(FILE_MARKER);
            bytes.extend_from_slice(entry.name.as_bytes());
            bytes.push(SIZE_SEPARATOR);
            bytes.extend_from_slice(entry.size.unwrap_or(0).to_string().as_bytes());
        }
        EntryKind::Directory => {
            bytes.push(DIRECTORY_MARKER);
            bytes.extend_from_slice(entry.name.as_bytes());
        }
    }
    bytes.push(TERMINATOR);
    bytes
}
