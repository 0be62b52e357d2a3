use crate::core::error::{FtpError, FtpResult};
use crate::protocol::{ErrorCode, MAX_DATA_LEN, Opcode};
use serde::{Deserialize, Serialize};

/// One file transfer payload: fixed header fields plus the data section
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FtpPayload {
    pub seq: u16,
    pub session: u8,
    pub opcode: u8,
    pub size: u8,
    pub req_opcode: u8,
    pub burst_complete: u8,
    pub offset: u32,
    pub data: Vec<u8>,
}

impl FtpPayload {
    /// Build a request whose `size` mirrors its data length
    pub fn request(opcode: Opcode, session: u8, offset: u32, data: Vec<u8>) -> FtpResult<Self> {
        if data.len() > MAX_DATA_LEN {
            return Err(FtpError::PayloadTooLarge {
                len: data.len(),
                max: MAX_DATA_LEN,
            });
        }

        Ok(Self {
            session,
            opcode: opcode.into(),
            size: data.len() as u8,
            offset,
            data,
            ..Self::default()
        })
    }

    /// READ_FILE carries the requested byte count in `size` and no data
    pub fn read_request(session: u8, offset: u32, length: u8) -> Self {
        Self {
            session,
            opcode: Opcode::ReadFile.into(),
            size: length,
            offset,
            ..Self::default()
        }
    }

    /// Positive reply to `request`
    pub fn ack(request: &FtpPayload, session: u8, data: Vec<u8>) -> Self {
        Self::reply(request, Opcode::Ack, session, data)
    }

    /// Negative reply to `request`; `errno` is only sent with `FailErrno`
    pub fn nak(request: &FtpPayload, code: ErrorCode, errno: Option<u8>) -> Self {
        let mut data = vec![u8::from(code)];
        if code == ErrorCode::FailErrno {
            data.push(errno.unwrap_or(0));
        }
        Self::reply(request, Opcode::Nak, request.session, data)
    }

    fn reply(request: &FtpPayload, opcode: Opcode, session: u8, data: Vec<u8>) -> Self {
        // Replies never exceed the wire data ceiling, so the length fits a u8.
        let size = data.len().min(MAX_DATA_LEN) as u8;
        Self {
            seq: request.seq.wrapping_add(1),
            session,
            opcode: opcode.into(),
            size,
            req_opcode: request.opcode,
            burst_complete: 0,
            offset: request.offset,
            data,
        }
    }

    pub fn kind(&self) -> Option<Opcode> {
        Opcode::try_from(self.opcode).ok()
    }

    pub fn is_response(&self) -> bool {
        self.kind().is_some_and(Opcode::is_response)
    }

    pub fn is_ack(&self) -> bool {
        self.kind() == Some(Opcode::Ack)
    }

    pub fn is_nak(&self) -> bool {
        self.kind() == Some(Opcode::Nak)
    }

    /// Error code of a NAK; an empty NAK counts as a plain failure
    pub fn error_code(&self) -> ErrorCode {
        self.data
            .first()
            .map(|code| ErrorCode::from(*code))
            .unwrap_or(ErrorCode::Fail)
    }

    /// True for the NAK that ends a listing or read
    pub fn is_eof(&self) -> bool {
        self.is_nak() && self.error_code() == ErrorCode::Eof
    }
}

/// Kind of a directory listing record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
}

/// One record of a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub kind: EntryKind,
    pub name: String,
    /// Byte size, present for files only
    pub size: Option<u64>,
}

impl DirectoryEntry {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            kind: EntryKind::File,
            name: name.into(),
            size: Some(size),
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Directory,
            name: name.into(),
            size: None,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_size_mirrors_data() {
        let payload = FtpPayload::request(Opcode::ListDirectory, 1, 4, b"/logs".to_vec()).unwrap();
        assert_eq!(payload.size, 5);
        assert_eq!(payload.opcode, u8::from(Opcode::ListDirectory));
        assert_eq!(payload.offset, 4);
    }

    #[test]
    fn test_request_rejects_oversized_data() {
        let err = FtpPayload::request(Opcode::RemoveFile, 1, 0, vec![b'a'; 252]).unwrap_err();
        assert_eq!(err, FtpError::PayloadTooLarge { len: 252, max: 251 });
    }

    #[test]
    fn test_replies_echo_request() {
        let mut request = FtpPayload::read_request(3, 460, 230);
        request.seq = 41;

        let ack = FtpPayload::ack(&request, 3, vec![1, 2, 3]);
        assert_eq!(ack.seq, 42);
        assert_eq!(ack.req_opcode, u8::from(Opcode::ReadFile));
        assert_eq!(ack.offset, 460);
        assert_eq!(ack.size, 3);
        assert!(ack.is_ack());

        let nak = FtpPayload::nak(&request, ErrorCode::Eof, None);
        assert!(nak.is_eof());
        assert_eq!(nak.data, vec![6]);

        let errno = FtpPayload::nak(&request, ErrorCode::FailErrno, Some(13));
        assert_eq!(errno.data, vec![2, 13]);
    }

    #[test]
    fn test_empty_nak_counts_as_failure() {
        let nak = FtpPayload {
            opcode: Opcode::Nak.into(),
            ..FtpPayload::default()
        };
        assert_eq!(nak.error_code(), ErrorCode::Fail);
        assert!(!nak.is_eof());
    }
}
