use std::fmt;

/// Reason byte carried as the first data byte of a NAK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    None,
    Fail,
    FailErrno,
    InvalidDataSize,
    InvalidSession,
    NoSessionsAvailable,
    Eof,
    UnknownCommand,
    FileExists,
    FileProtected,
    FileNotFound,
    Unrecognized(u8),
}

impl ErrorCode {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCode::None => "None",
            ErrorCode::Fail => "Fail",
            ErrorCode::FailErrno => "FailErrno",
            ErrorCode::InvalidDataSize => "InvalidDataSize",
            ErrorCode::InvalidSession => "InvalidSession",
            ErrorCode::NoSessionsAvailable => "NoSessionsAvailable",
            ErrorCode::Eof => "EOF",
            ErrorCode::UnknownCommand => "UnknownCommand",
            ErrorCode::FileExists => "FileExists",
            ErrorCode::FileProtected => "FileProtected",
            ErrorCode::FileNotFound => "FileNotFound",
            ErrorCode::Unrecognized(_) => "Unrecognized",
        }
    }
}

impl From<u8> for ErrorCode {
    fn from(code: u8) -> Self {
        match code {
            0 => ErrorCode::None,
            1 => ErrorCode::Fail,
            2 => ErrorCode::FailErrno,
            3 => ErrorCode::InvalidDataSize,
            4 => ErrorCode::InvalidSession,
            5 => ErrorCode::NoSessionsAvailable,
            6 => ErrorCode::Eof,
            7 => ErrorCode::UnknownCommand,
            8 => ErrorCode::FileExists,
            9 => ErrorCode::FileProtected,
            10 => ErrorCode::FileNotFound,
            other => ErrorCode::Unrecognized(other),
        }
    }
}

impl From<ErrorCode> for u8 {
    fn from(code: ErrorCode) -> u8 {
        match code {
            ErrorCode::None => 0,
            ErrorCode::Fail => 1,
            ErrorCode::FailErrno => 2,
            ErrorCode::InvalidDataSize => 3,
            ErrorCode::InvalidSession => 4,
            ErrorCode::NoSessionsAvailable => 5,
            ErrorCode::Eof => 6,
            ErrorCode::UnknownCommand => 7,
            ErrorCode::FileExists => 8,
            ErrorCode::FileProtected => 9,
            ErrorCode::FileNotFound => 10,
            ErrorCode::Unrecognized(other) => other,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Unrecognized(code) => write!(f, "unrecognized error code {}", code),
            known => write!(f, "{} ({})", known.name(), u8::from(*known)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_all_known_codes() {
        for code in 0u8..=10 {
            let mapped = ErrorCode::from(code);
            assert!(!matches!(mapped, ErrorCode::Unrecognized(_)));
            assert_eq!(u8::from(mapped), code);
        }
    }

    #[test]
    fn test_named_codes() {
        assert_eq!(ErrorCode::from(6), ErrorCode::Eof);
        assert_eq!(ErrorCode::from(10), ErrorCode::FileNotFound);
        assert_eq!(ErrorCode::from(2), ErrorCode::FailErrno);
    }

    #[test]
    fn test_out_of_range_is_unrecognized() {
        assert_eq!(ErrorCode::from(11), ErrorCode::Unrecognized(11));
        assert_eq!(ErrorCode::from(255), ErrorCode::Unrecognized(255));
        assert_eq!(ErrorCode::from(42).to_string(), "unrecognized error code 42");
        assert_eq!(ErrorCode::FileNotFound.to_string(), "FileNotFound (10)");
    }
}
