use super::types::FtpPayload;
use crate::core::domain::{TargetAddress, TelemetryPacket};
use crate::core::error::{FtpError, FtpResult};
use crate::protocol::{
    ENVELOPE_ADDRESS_LEN, ENVELOPE_PAYLOAD_LEN, FILE_TRANSFER_PROTOCOL_ID, HEADER_LEN,
    MAX_DATA_LEN,
};
use bincode::{Decode, Encode, config};

/// Fixed 12-byte header as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
struct WireHeader {
    seq: u16,
    session: u8,
    opcode: u8,
    size: u8,
    req_opcode: u8,
    burst_complete: u8,
    reserved: u8,
    offset: u32,
}

/// Little-endian, fixed-width integers: the header maps field for field
fn wire_config() -> impl config::Config {
    config::standard()
        .with_little_endian()
        .with_fixed_int_encoding()
}

/// Encode a payload as header followed by its data verbatim
pub fn encode(payload: &FtpPayload) -> FtpResult<Vec<u8>> {
    if payload.data.len() > MAX_DATA_LEN {
        return Err(FtpError::PayloadTooLarge {
            len: payload.data.len(),
            max: MAX_DATA_LEN,
        });
    }

    let header = WireHeader {
        seq: payload.seq,
        session: payload.session,
        opcode: payload.opcode,
        size: payload.size,
        req_opcode: payload.req_opcode,
        burst_complete: payload.burst_complete,
        reserved: 0,
        offset: payload.offset,
    };

    let mut bytes = bincode::encode_to_vec(header, wire_config())
        .map_err(|e| FtpError::Codec(e.to_string()))?;
    bytes.extend_from_slice(&payload.data);
    Ok(bytes)
}

/// Decode a payload, taking exactly `size` data bytes after the header
pub fn decode(bytes: &[u8]) -> FtpResult<FtpPayload> {
    if bytes.len() < HEADER_LEN {
        return Err(FtpError::MalformedPayload {
            needed: HEADER_LEN,
            actual: bytes.len(),
        });
    }

    let (header, _): (WireHeader, usize) =
        bincode::decode_from_slice(&bytes[..HEADER_LEN], wire_config())
            .map_err(|e| FtpError::Codec(e.to_string()))?;

    let end = HEADER_LEN + header.size as usize;
    if bytes.len() < end {
        return Err(FtpError::MalformedPayload {
            needed: end,
            actual: bytes.len(),
        });
    }

    Ok(FtpPayload {
        seq: header.seq,
        session: header.session,
        opcode: header.opcode,
        size: header.size,
        req_opcode: header.req_opcode,
        burst_complete: header.burst_complete,
        offset: header.offset,
        data: bytes[HEADER_LEN..end].to_vec(),
    })
}

/// File transfer payload addressed to one remote component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTransferMessage {
    pub target: TargetAddress,
    pub payload: FtpPayload,
}

impl FileTransferMessage {
    pub fn new(target: TargetAddress, payload: FtpPayload) -> Self {
        Self { target, payload }
    }

    /// Address bytes followed by the zero-padded payload area
    pub fn encode(&self) -> FtpResult<Vec<u8>> {
        let encoded = encode(&self.payload)?;
        if encoded.len() > ENVELOPE_PAYLOAD_LEN {
            return Err(FtpError::PayloadTooLarge {
                len: encoded.len(),
                max: ENVELOPE_PAYLOAD_LEN,
            });
        }

        let mut body = Vec::with_capacity(ENVELOPE_ADDRESS_LEN + ENVELOPE_PAYLOAD_LEN);
        body.extend_from_slice(&[
            self.target.network,
            self.target.system,
            self.target.component,
        ]);
        body.extend_from_slice(&encoded);
        body.resize(ENVELOPE_ADDRESS_LEN + ENVELOPE_PAYLOAD_LEN, 0);
        Ok(body)
    }

    /// Decode a message body; bodies shortened by trailing-zero truncation are padded back
    pub fn decode(body: &[u8]) -> FtpResult<Self> {
        let mut full = [0u8; ENVELOPE_ADDRESS_LEN + ENVELOPE_PAYLOAD_LEN];
        let len = body.len().min(full.len());
        full[..len].copy_from_slice(&body[..len]);

        let target = TargetAddress::new(full[0], full[1], full[2]);
        let payload = decode(&full[ENVELOPE_ADDRESS_LEN..])?;
        Ok(Self { target, payload })
    }

    pub fn into_packet(self) -> FtpResult<TelemetryPacket> {
        Ok(TelemetryPacket::new(FILE_TRANSFER_PROTOCOL_ID, self.encode()?))
    }
}
