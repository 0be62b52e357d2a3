pub mod codec;
pub mod listing;
pub mod types;

// Re-exports for easier access from crate::file_transfer::{...}
pub use codec::{FileTransferMessage, decode, encode};
pub use listing::{decode_listing, encode_entry};
pub use types::{DirectoryEntry, EntryKind, FtpPayload};
