use crate::file_transfer::types::FtpPayload;
use crate::protocol::{SESSION_AFTER_RESET, SESSION_DEFAULT, SESSION_NONE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Addressing of the remote component that serves file transfer requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetAddress {
    pub network: u8,
    pub system: u8,
    pub component: u8,
}

impl TargetAddress {
    pub fn new(network: u8, system: u8, component: u8) -> Self {
        Self {
            network,
            system,
            component,
        }
    }
}

impl Default for TargetAddress {
    fn default() -> Self {
        Self::new(0, 1, 1)
    }
}

/// One framed message on the shared telemetry stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryPacket {
    pub message_id: u32,
    pub payload: Vec<u8>,
}

impl TelemetryPacket {
    pub fn new(message_id: u32, payload: Vec<u8>) -> Self {
        Self {
            message_id,
            payload,
        }
    }
}

/// Session id and sequence number owned by one engine instance.
///
/// The sequence is advanced before every send, but the value echoed by the
/// remote in its most recent response always replaces the local guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub session_id: u8,
    pub sequence: u16,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            session_id: SESSION_DEFAULT,
            sequence: 0,
        }
    }
}

impl SessionState {
    /// Advance the sequence speculatively and return the value to stamp on a request
    pub fn next_sequence(&mut self) -> u16 {
        self.sequence = self.sequence.wrapping_add(1);
        self.sequence
    }

    /// Take the remote's sequence number as authoritative
    pub fn adopt(&mut self, response: &FtpPayload) {
        self.sequence = response.seq;
    }

    pub fn mark_reset(&mut self) {
        self.session_id = SESSION_AFTER_RESET;
    }

    pub fn open(&mut self, session_id: u8) {
        self.session_id = session_id;
    }

    pub fn terminate(&mut self) {
        self.session_id = SESSION_NONE;
    }
}

/// Download progress reported to callers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferProgress {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
    pub percentage: f32,
}

impl TransferProgress {
    pub fn new(total_bytes: u64) -> Self {
        Self {
            bytes_transferred: 0,
            total_bytes,
            percentage: 0.0,
        }
    }

    pub fn update(&mut self, bytes_transferred: u64) {
        self.bytes_transferred = bytes_transferred;
        self.percentage = if self.total_bytes > 0 {
            (self.bytes_transferred as f32 / self.total_bytes as f32) * 100.0
        } else {
            0.0
        };
    }

    /// Final report: the transferred byte count becomes the total
    pub fn complete(&mut self, bytes_transferred: u64) {
        self.bytes_transferred = bytes_transferred;
        self.total_bytes = bytes_transferred;
        self.percentage = 100.0;
    }

    pub fn is_complete(&self) -> bool {
        self.bytes_transferred >= self.total_bytes
    }
}

/// Timeout and retry budget applied to every exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait for a response per attempt
    pub timeout: Duration,
    /// Total transmissions before giving up
    pub max_attempts: u32,
    /// Optional bound on the whole retry loop of one exchange
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(200),
            max_attempts: 6,
            deadline: None,
        }
    }
}
