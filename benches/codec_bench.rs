use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mavftp::core::TargetAddress;
use mavftp::file_transfer::{FileTransferMessage, FtpPayload, decode, encode};
use mavftp::protocol::MAX_WIRE_DATA_LEN;

fn bench_payload_roundtrip(c: &mut Criterion) {
    let request = FtpPayload::read_request(2, 4600, 239);
    let chunk = FtpPayload::ack(&request, 2, vec![0x55; MAX_WIRE_DATA_LEN]);

    c.bench_function("payload_roundtrip_239B", |b| {
        b.iter(|| {
            let bytes = encode(black_box(&chunk)).unwrap();
            black_box(decode(&bytes).unwrap())
        })
    });
}

fn bench_envelope_decode(c: &mut Criterion) {
    let request = FtpPayload::read_request(2, 0, 239);
    let chunk = FtpPayload::ack(&request, 2, vec![0x55; 120]);
    let packet = FileTransferMessage::new(TargetAddress::default(), chunk)
        .into_packet()
        .unwrap();

    c.bench_function("envelope_decode", |b| {
        b.iter(|| black_box(FileTransferMessage::decode(black_box(&packet.payload)).unwrap()))
    });
}

criterion_group!(benches, bench_payload_roundtrip, bench_envelope_decode);
criterion_main!(benches);
