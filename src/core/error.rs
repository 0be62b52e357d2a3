use crate::protocol::ErrorCode;
use crate::protocol::opcode::describe;
use std::time::Duration;
use thiserror::Error;

/// Result type for file transfer operations
pub type FtpResult<T> = Result<T, FtpError>;

/// File transfer errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FtpError {
    #[error("Malformed payload: need {needed} bytes, got {actual}")]
    MalformedPayload { needed: usize, actual: usize },

    #[error("Payload too large: {len} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("Payload codec failure: {0}")]
    Codec(String),

    #[error("Unknown directory entry type {0:#04x}")]
    UnknownEntryType(u8),

    #[error("Invalid directory entry size {0:?}")]
    InvalidEntrySize(String),

    #[error("No response to {} after {attempts} attempts", op(.opcode))]
    ExchangeFailed { opcode: u8, attempts: u32 },

    #[error("Deadline of {deadline:?} exceeded waiting for {}", op(.opcode))]
    DeadlineExceeded { opcode: u8, deadline: Duration },

    #[error("Another request is already in flight")]
    RequestInFlight,

    #[error("Transport closed")]
    TransportClosed,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote filesystem error (errno {})", errno_label(.errno))]
    Filesystem { errno: Option<u8> },

    #[error("Remote reported {0}")]
    Remote(ErrorCode),

    #[error("Unexpected response {}", op(.0))]
    UnexpectedResponse(u8),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

fn op(raw: &u8) -> String {
    describe(*raw)
}

fn errno_label(errno: &Option<u8>) -> String {
    match errno {
        Some(errno) => errno.to_string(),
        None => "unknown".to_string(),
    }
}

impl FtpError {
    /// Errors the correlator spends a retry on instead of giving up
    pub fn is_transient(&self) -> bool {
        matches!(self, FtpError::Transport(_))
    }

    /// Remote error code behind this failure, if the remote produced one
    pub fn remote_code(&self) -> Option<ErrorCode> {
        match self {
            FtpError::Remote(code) => Some(*code),
            FtpError::Filesystem { .. } => Some(ErrorCode::FailErrno),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_opcodes() {
        let err = FtpError::ExchangeFailed { opcode: 5, attempts: 6 };
        assert_eq!(err.to_string(), "No response to READ_FILE after 6 attempts");

        let err = FtpError::Filesystem { errno: Some(13) };
        assert_eq!(err.to_string(), "Remote filesystem error (errno 13)");

        let err = FtpError::Filesystem { errno: None };
        assert_eq!(err.to_string(), "Remote filesystem error (errno unknown)");
    }

    #[test]
    fn test_transient_classification() {
        assert!(FtpError::Transport("busy".into()).is_transient());
        assert!(!FtpError::TransportClosed.is_transient());
        assert!(!FtpError::Remote(ErrorCode::Fail).is_transient());
    }

    #[test]
    fn test_remote_code() {
        assert_eq!(
            FtpError::Remote(ErrorCode::FileNotFound).remote_code(),
            Some(ErrorCode::FileNotFound)
        );
        assert_eq!(
            FtpError::Filesystem { errno: Some(2) }.remote_code(),
            Some(ErrorCode::FailErrno)
        );
        assert_eq!(FtpError::RequestInFlight.remote_code(), None);
    }
}
