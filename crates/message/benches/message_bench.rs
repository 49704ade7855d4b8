use bytes::BytesMut;
use criterion::{Criterion, criterion_group, criterion_main};
use micro_message::codec::{ChunkedEncoder, MessageDecoder};
use micro_message::protocol::{Message, MessageConfig, PayloadItem, TextEncoding};
use std::hint::black_box;
use tokio_util::codec::{Decoder, Encoder};

const RESPONSE: &[u8] = b"RTSP/1.0 200 OK\r\nCSeq: 302\r\nDate: 23 Jan 1997 15:35:06 GMT\r\nSession: 47112344\r\nContent-Type: application/sdp\r\nContent-Length: 24\r\n\r\nBody Data ! 1234567890-A";

fn chunked_request() -> Vec<u8> {
    let mut wire = BytesMut::from(&b"POST /upload HTTP/1.1\r\nHost: localhost\r\nTransfer-Encoding: chunked\r\n\r\n"[..]);
    let mut encoder = ChunkedEncoder::new();
    for _ in 0..16 {
        encoder.encode(PayloadItem::Chunk(&[b'x'; 512][..]), &mut wire).unwrap();
    }
    encoder.encode(PayloadItem::<&[u8]>::Eof, &mut wire).unwrap();
    wire.to_vec()
}

fn bench_parse(c: &mut Criterion) {
    let rtsp = MessageConfig::default().with_protocol("RTSP");
    let parsed = Message::from_bytes_with(RESPONSE, rtsp.clone(), TextEncoding::Utf8);
    assert!(parsed.is_complete() && parsed.is_response(), "bench fixture must parse");

    c.bench_function("parse_whole_response", |b| {
        b.iter(|| black_box(Message::from_bytes_with(black_box(RESPONSE), rtsp.clone(), TextEncoding::Utf8)));
    });

    c.bench_function("parse_response_byte_by_byte", |b| {
        b.iter(|| {
            let mut message = Message::inbound(rtsp.clone());
            for byte in RESPONSE.chunks(1) {
                message.complete_from(None, black_box(byte)).unwrap();
            }
            black_box(message)
        });
    });

    let chunked = chunked_request();
    c.bench_function("parse_chunked_request", |b| {
        b.iter(|| {
            let mut decoder = MessageDecoder::new();
            let mut bytes = BytesMut::from(&chunked[..]);
            black_box(decoder.decode(&mut bytes).unwrap());
        });
    });
}

fn bench_serialize(c: &mut Criterion) {
    let mut response = Message::response(200);
    response.set_header("CSeq", "302").unwrap();
    response.set_header("Content-Type", "application/sdp").unwrap();
    response.set_body("Body Data ! 1234567890-A").unwrap();

    c.bench_function("serialize_response", |b| {
        b.iter(|| black_box(response.to_bytes()));
    });
}

criterion_group!(benches, bench_parse, bench_serialize);
criterion_main!(benches);
