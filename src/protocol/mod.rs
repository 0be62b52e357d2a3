pub mod error_code;
pub mod opcode;

pub use error_code::ErrorCode;
pub use opcode::Opcode;

// Protocol constants and utilities

/// Telemetry message id that carries file transfer payloads
pub const FILE_TRANSFER_PROTOCOL_ID: u32 = 110;

/// Fixed header length of a file transfer payload
pub const HEADER_LEN: usize = 12;

/// Largest data section the payload codec accepts
pub const MAX_DATA_LEN: usize = 251;

/// Size of the payload area inside one telemetry message
pub const ENVELOPE_PAYLOAD_LEN: usize = 251;

/// Address bytes (network, system, component) preceding the payload area
pub const ENVELOPE_ADDRESS_LEN: usize = 3;

/// Largest data section that still fits in one telemetry message
pub const MAX_WIRE_DATA_LEN: usize = ENVELOPE_PAYLOAD_LEN - HEADER_LEN;

/// Bytes requested per READ_FILE exchange
pub const DEFAULT_READ_CHUNK: u8 = 230;

/// Session id meaning "no open session"
pub const SESSION_NONE: u8 = 0;

/// Session id an engine starts with
pub const SESSION_DEFAULT: u8 = 1;

/// Session id adopted after a successful reset
pub const SESSION_AFTER_RESET: u8 = 2;
