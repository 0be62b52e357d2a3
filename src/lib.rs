pub mod application;
pub mod core;
pub mod file_transfer;
pub mod infrastructure;
pub mod protocol;
pub mod simulator;
pub mod utils;

// Re-export key types for easier access in integration tests
pub use crate::application::FtpClient;
pub use crate::core::{FtpError, FtpResult, RetryPolicy, TargetAddress, TelemetryPacket, TransferProgress, Transport};
pub use file_transfer::{DirectoryEntry, EntryKind, FileTransferMessage, FtpPayload, decode_listing};
pub use infrastructure::{Correlator, FtpConfig, loopback};
pub use protocol::{ErrorCode, Opcode};
