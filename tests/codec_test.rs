use mavftp::core::{FtpError, TargetAddress};
use mavftp::file_transfer::{DirectoryEntry, FileTransferMessage, FtpPayload, decode, decode_listing, encode};
use mavftp::protocol::{ErrorCode, FILE_TRANSFER_PROTOCOL_ID, MAX_WIRE_DATA_LEN, Opcode};

#[test]
fn test_open_request_wire_bytes() {
    let mut request = FtpPayload::request(Opcode::OpenFileRo, 2, 0, b"/a".to_vec()).unwrap();
    request.seq = 0x0102;

    let bytes = encode(&request).unwrap();
    assert_eq!(
        bytes,
        vec![0x02, 0x01, 2, 4, 2, 0, 0, 0, 0, 0, 0, 0, b'/', b'a']
    );
    assert_eq!(decode(&bytes).unwrap(), request);
}

#[test]
fn test_round_trip_every_data_length() {
    for len in 0..=251usize {
        let payload = FtpPayload {
            seq: (len as u16).wrapping_mul(257) ^ 0xa5a5,
            session: len as u8,
            opcode: (len % 16) as u8,
            size: len as u8,
            req_opcode: (len % 5) as u8,
            burst_complete: (len % 2) as u8,
            offset: (len as u32).wrapping_mul(0x0101_0101),
            data: (0..len).map(|i| (i * 7 + len) as u8).collect(),
        };

        let bytes = encode(&payload).unwrap();
        assert_eq!(bytes.len(), 12 + len);
        assert_eq!(decode(&bytes).unwrap(), payload, "data length {}", len);
    }
}

#[test]
fn test_read_request_carries_length_without_data() {
    let request = FtpPayload::read_request(3, 460, 230);
    let bytes = encode(&request).unwrap();

    assert_eq!(bytes.len(), 12);
    assert_eq!(bytes[4], 230);
    assert_eq!(&bytes[8..12], &460u32.to_le_bytes());
}

#[test]
fn test_decode_short_buffers() {
    assert_eq!(
        decode(&[0u8; 5]),
        Err(FtpError::MalformedPayload { needed: 12, actual: 5 })
    );

    // Header claims 4 data bytes, only 2 follow
    let mut bytes = vec![0u8; 12];
    bytes[4] = 4;
    bytes.extend_from_slice(&[1, 2]);
    assert_eq!(
        decode(&bytes),
        Err(FtpError::MalformedPayload { needed: 16, actual: 14 })
    );
}

#[test]
fn test_nak_with_errno_through_envelope() {
    let request = FtpPayload::request(Opcode::RemoveFile, 1, 0, b"/locked".to_vec()).unwrap();
    let nak = FtpPayload::nak(&request, ErrorCode::FailErrno, Some(13));

    let target = TargetAddress::new(0, 1, 1);
    let packet = FileTransferMessage::new(target, nak.clone()).into_packet().unwrap();
    assert_eq!(packet.message_id, FILE_TRANSFER_PROTOCOL_ID);

    // Links strip trailing zeros from message bodies
    let mut truncated = packet.payload.clone();
    while truncated.last() == Some(&0) {
        truncated.pop();
    }

    let decoded = FileTransferMessage::decode(&truncated).unwrap();
    assert_eq!(decoded.target, target);
    assert_eq!(decoded.payload, nak);
    assert_eq!(decoded.payload.data, vec![2, 13]);
}

#[test]
fn test_envelope_limit() {
    let request = FtpPayload::read_request(1, 0, 239);
    let full = FtpPayload::ack(&request, 1, vec![0xaa; MAX_WIRE_DATA_LEN]);
    assert!(FileTransferMessage::new(TargetAddress::default(), full).encode().is_ok());

    let over = FtpPayload::ack(&request, 1, vec![0xaa; MAX_WIRE_DATA_LEN + 1]);
    assert_eq!(
        FileTransferMessage::new(TargetAddress::default(), over).encode(),
        Err(FtpError::PayloadTooLarge { len: 252, max: 251 })
    );
}

#[test]
fn test_listing_page() {
    let page = b"Fa.txt\t12\0Dlogs\0Fb\t0\0";
    let entries = decode_listing(page).unwrap();

    assert_eq!(
        entries,
        vec![
            DirectoryEntry::file("a.txt", 12),
            DirectoryEntry::directory("logs"),
            DirectoryEntry::file("b", 0),
        ]
    );
}

#[test]
fn test_listing_drops_unterminated_tail() {
    let entries = decode_listing(b"Dlogs\0Fpartial\t12").unwrap();
    assert_eq!(entries, vec![DirectoryEntry::directory("logs")]);
}

#[test]
fn test_listing_rejects_unknown_marker() {
    assert_eq!(
        decode_listing(b"Dlogs\0Xodd\0"),
        Err(FtpError::UnknownEntryType(b'X'))
    );
}

#[test]
fn test_listing_rejects_bad_size() {
    assert_eq!(
        decode_listing(b"Fa\t1x\0"),
        Err(FtpError::InvalidEntrySize("1x".to_string()))
    );
}
