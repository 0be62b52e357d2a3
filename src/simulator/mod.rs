//! Simulated vehicle answering file transfer requests over an in-memory link.
//!
//! Serves a [`VirtualFs`] the way an autopilot would: replies carry
//! `seq = request.seq + 1` and echo the request offset, a repeated request
//! sequence gets the cached reply again, and loss or duplication can be
//! injected with a seeded random source.

pub mod filesystem;

pub use filesystem::{FsFailure, OpenedFile, VirtualFs};

use crate::core::domain::TargetAddress;
use crate::file_transfer::{FileTransferMessage, FtpPayload, encode_entry};
use crate::infrastructure::network::RemoteLink;
use crate::protocol::{ErrorCode, FILE_TRANSFER_PROTOCOL_ID, MAX_WIRE_DATA_LEN, Opcode};
use crc::{CRC_32_ISO_HDLC, Crc};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Packet loss and duplication injected by the simulated link
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FaultProfile {
    /// Probability a request never reaches the vehicle
    pub drop_requests: f64,
    /// Probability a reply never reaches the host
    pub drop_replies: f64,
    /// Probability a delivered reply is delivered twice
    pub duplicate_replies: f64,
    pub seed: u64,
}

impl FaultProfile {
    pub fn lossy(loss: f64, seed: u64) -> Self {
        Self {
            drop_requests: loss,
            drop_replies: loss,
            duplicate_replies: 0.0,
            seed,
        }
    }
}

/// Every request the vehicle received, in arrival order
pub type RequestLog = Arc<Mutex<Vec<FtpPayload>>>;

#[derive(Debug)]
struct OpenSession {
    id: u8,
    contents: Vec<u8>,
}

/// Remote side of the file transfer protocol
pub struct SimulatedVehicle {
    fs: VirtualFs,
    address: TargetAddress,
    faults: FaultProfile,
    rng: StdRng,
    session: Option<OpenSession>,
    next_session: u8,
    last_reply: Option<(u16, FtpPayload)>,
    log: RequestLog,
}

impl SimulatedVehicle {
    pub fn new(fs: VirtualFs) -> Self {
        Self {
            fs,
            address: TargetAddress::default(),
            faults: FaultProfile::default(),
            rng: StdRng::seed_from_u64(0),
            session: None,
            next_session: 1,
            last_reply: None,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_faults(mut self, faults: FaultProfile) -> Self {
        self.rng = StdRng::seed_from_u64(faults.seed);
        self.faults = faults;
        self
    }

    /// Answer only messages addressed to this component
    pub fn with_address(mut self, address: TargetAddress) -> Self {
        self.address = address;
        self
    }

    /// Session id the next successful open hands out
    pub fn with_first_session(mut self, session: u8) -> Self {
        self.next_session = session;
        self
    }

    pub fn request_log(&self) -> RequestLog {
        self.log.clone()
    }

    pub fn filesystem(&self) -> &VirtualFs {
        &self.fs
    }

    /// Serve requests until the host side of the link goes away
    pub fn spawn(mut self, mut link: RemoteLink) -> JoinHandle<VirtualFs> {
        tokio::spawn(async move {
            while let Some(packet) = link.requests.recv().await {
                if packet.message_id != FILE_TRANSFER_PROTOCOL_ID {
                    continue;
                }
                let message = match FileTransferMessage::decode(&packet.payload) {
                    Ok(message) => message,
                    Err(e) => {
                        error!("Vehicle could not decode request: {}", e);
                        continue;
                    }
                };
                if message.target != self.address {
                    trace!("Ignoring request for {:?}", message.target);
                    continue;
                }

                self.log
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(message.payload.clone());

                if self.roll(self.faults.drop_requests) {
                    debug!("Vehicle lost request seq {}", message.payload.seq);
                    continue;
                }

                let reply = self.respond(&message.payload);
                if self.roll(self.faults.drop_replies) {
                    debug!("Vehicle reply seq {} lost", reply.seq);
                    continue;
                }

                let copies = if self.roll(self.faults.duplicate_replies) { 2 } else { 1 };
                let packet = match FileTransferMessage::new(self.address, reply).into_packet() {
                    Ok(packet) => packet,
                    Err(e) => {
                        error!("Vehicle could not encode reply: {}", e);
                        continue;
                    }
                };
                for _ in 0..copies {
                    if link.replies.send(packet.clone()).is_err() {
                        return self.fs;
                    }
                }
            }
            self.fs
        })
    }

    fn roll(&mut self, probability: f64) -> bool {
        probability > 0.0 && self.rng.gen_bool(probability.min(1.0))
    }

    /// Reply to one request; a resent request gets the cached reply
    pub fn respond(&mut self, request: &FtpPayload) -> FtpPayload {
        if let Some((seq, reply)) = &self.last_reply {
            if *seq == request.seq {
                return reply.clone();
            }
        }

        let reply = self.handle(request);
        self.last_reply = Some((request.seq, reply.clone()));
        reply
    }

    fn handle(&mut self, request: &FtpPayload) -> FtpPayload {
        let path_len = (request.size as usize).min(request.data.len());
        let path = String::from_utf8_lossy(&request.data[..path_len])
            .trim_end_matches('\0')
            .to_string();

        match Opcode::try_from(request.opcode) {
            Ok(Opcode::ResetSessions) => {
                self.session = None;
                FtpPayload::ack(request, request.session, Vec::new())
            }
            Ok(Opcode::ListDirectory) => self.list(request, &path),
            Ok(Opcode::OpenFileRo) => self.open(request, &path),
            Ok(Opcode::ReadFile) => self.read(request),
            Ok(Opcode::TerminateSession) => match &self.session {
                Some(open) if open.id == request.session => {
                    self.session = None;
                    FtpPayload::ack(request, request.session, Vec::new())
                }
                _ => FtpPayload::nak(request, ErrorCode::InvalidSession, None),
            },
            Ok(Opcode::RemoveFile) => match self.fs.remove_file(&path) {
                Ok(()) => FtpPayload::ack(request, request.session, Vec::new()),
                Err(failure) => nak(request, failure),
            },
            Ok(Opcode::RemoveDirectory) => match self.fs.remove_directory(&path) {
                Ok(()) => FtpPayload::ack(request, request.session, Vec::new()),
                Err(failure) => nak(request, failure),
            },
            Ok(Opcode::CalcFileCrc32) => match self.fs.open(&path) {
                Ok(opened) => {
                    let crc = CRC32.checksum(&opened.contents);
                    FtpPayload::ack(request, request.session, crc.to_le_bytes().to_vec())
                }
                Err(failure) => nak(request, failure),
            },
            _ => FtpPayload::nak(request, ErrorCode::UnknownCommand, None),
        }
    }

    fn list(&self, request: &FtpPayload, path: &str) -> FtpPayload {
        let entries = match self.fs.list(path) {
            Ok(entries) => entries,
            Err(failure) => return nak(request, failure),
        };

        let mut page = Vec::new();
        for entry in entries.iter().skip(request.offset as usize) {
            let encoded = encode_entry(entry);
            if page.len() + encoded.len() > MAX_WIRE_DATA_LEN {
                break;
            }
            page.extend_from_slice(&encoded);
        }

        if page.is_empty() {
            FtpPayload::nak(request, ErrorCode::Eof, None)
        } else {
            FtpPayload::ack(request, request.session, page)
        }
    }

    fn open(&mut self, request: &FtpPayload, path: &str) -> FtpPayload {
        if self.session.is_some() {
            return FtpPayload::nak(request, ErrorCode::NoSessionsAvailable, None);
        }
        let opened = match self.fs.open(path) {
            Ok(opened) => opened,
            Err(failure) => return nak(request, failure),
        };

        let id = self.next_session;
        self.next_session = self.next_session.wrapping_add(1).max(1);
        self.session = Some(OpenSession {
            id,
            contents: opened.contents,
        });

        let data = opened
            .announced_size
            .map(|size| size.to_le_bytes().to_vec())
            .unwrap_or_default();
        FtpPayload::ack(request, id, data)
    }

    fn read(&self, request: &FtpPayload) -> FtpPayload {
        let Some(open) = self.session.as_ref().filter(|s| s.id == request.session) else {
            return FtpPayload::nak(request, ErrorCode::InvalidSession, None);
        };

        let start = request.offset as usize;
        if start >= open.contents.len() {
            return FtpPayload::nak(request, ErrorCode::Eof, None);
        }
        let len = (request.size as usize).min(MAX_WIRE_DATA_LEN);
        let end = (start + len).min(open.contents.len());
        FtpPayload::ack(request, request.session, open.contents[start..end].to_vec())
    }
}

fn nak(request: &FtpPayload, failure: FsFailure) -> FtpPayload {
    FtpPayload::nak(request, failure.code, failure.errno)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamped(mut payload: FtpPayload, seq: u16) -> FtpPayload {
        payload.seq = seq;
        payload
    }

    #[test]
    fn test_open_read_terminate() {
        let mut vehicle = SimulatedVehicle::new(VirtualFs::new().with_file("/a.txt", b"hello".to_vec()))
            .with_first_session(4);

        let open = FtpPayload::request(Opcode::OpenFileRo, 1, 0, b"/a.txt".to_vec()).unwrap();
        let reply = vehicle.respond(&stamped(open, 1));
        assert!(reply.is_ack());
        assert_eq!(reply.session, 4);
        assert_eq!(reply.data, 5u32.to_le_bytes().to_vec());

        let read = vehicle.respond(&stamped(FtpPayload::read_request(4, 0, 230), 3));
        assert_eq!(read.data, b"hello".to_vec());

        let eof = vehicle.respond(&stamped(FtpPayload::read_request(4, 5, 230), 5));
        assert!(eof.is_eof());

        let terminate = FtpPayload::request(Opcode::TerminateSession, 4, 0, Vec::new()).unwrap();
        assert!(vehicle.respond(&stamped(terminate, 7)).is_ack());
    }

    #[test]
    fn test_repeated_sequence_gets_cached_reply() {
        let mut vehicle = SimulatedVehicle::new(VirtualFs::new().with_file("/x", b"1".to_vec()));
        let remove = stamped(
            FtpPayload::request(Opcode::RemoveFile, 1, 0, b"/x".to_vec()).unwrap(),
            10,
        );

        let first = vehicle.respond(&remove);
        let again = vehicle.respond(&remove);
        assert!(first.is_ack());
        assert_eq!(first, again);
        assert!(!vehicle.filesystem().exists("/x"));
    }

    #[test]
    fn test_unknown_opcode() {
        let mut vehicle = SimulatedVehicle::new(VirtualFs::new());
        let request = FtpPayload {
            seq: 1,
            opcode: 7,
            ..FtpPayload::default()
        };
        let reply = vehicle.respond(&request);
        assert_eq!(reply.error_code(), ErrorCode::UnknownCommand);
    }
}
