use criterion::{black_box, criterion_group, criterion_main, Criterion};
use wsdial::ws::handshake::{
    compute_accept_key, validate_response, HandshakeRequest, ResponseAccumulator, UpgradeRequest,
};

const KEY: &str = "dGhlIHNhbXBsZSBub25jZQ==";

fn response() -> Vec<u8> {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\
         Sec-WebSocket-Protocol: chat\r\n\
         Server: bench\r\n\
         Date: Sat, 17 Oct 2026 10:00:00 GMT\r\n\
         \r\n",
        compute_accept_key(KEY)
    )
    .into_bytes()
}

fn benchmark_request_encoding(c: &mut Criterion) {
    let protocols = vec!["chat".to_string(), "superchat".to_string()];
    let headers = vec![
        "Origin: https://example.com".to_string(),
        "User-Agent: wsdial-bench".to_string(),
    ];

    c.bench_function("handshake_request_encode", |b| {
        b.iter(|| {
            HandshakeRequest::new(black_box(&UpgradeRequest {
                host: "example.com",
                path: "/chat?room=1",
                port: 8443,
                use_tls: true,
                key: KEY,
                protocols: &protocols,
                custom_headers: &headers,
            }))
        })
    });
}

fn benchmark_response_validation(c: &mut Criterion) {
    let reply = response();
    let block = &reply[..reply.len() - 4];
    let protocols = vec!["chat".to_string()];

    c.bench_function("handshake_validate_response", |b| {
        b.iter(|| validate_response(black_box(block), KEY, &protocols))
    });

    // Byte-at-a-time accumulation, as the client reads the response.
    c.bench_function("handshake_accumulate_and_validate", |b| {
        b.iter(|| {
            let mut acc = ResponseAccumulator::default();
            for byte in black_box(&reply) {
                if acc.push(*byte).unwrap_or(false) {
                    break;
                }
            }
            validate_response(acc.header_block(), KEY, &protocols)
        })
    });
}

fn benchmark_accept_key(c: &mut Criterion) {
    c.bench_function("compute_accept_key", |b| {
        b.iter(|| compute_accept_key(black_box(KEY)))
    });
}

criterion_group!(
    benches,
    benchmark_request_encoding,
    benchmark_response_validation,
    benchmark_accept_key
);
criterion_main!(benches);
