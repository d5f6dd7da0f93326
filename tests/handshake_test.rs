//! Upgrade handshake codec tests.
//!
//! Exercises `validate_response` and `ResponseAccumulator` through the
//! public API the way the client uses them: bytes are pushed one at a time
//! and the stripped header block is validated once complete.

use wsdial::base::neterror::NetError;
use wsdial::ws::handshake::{
    compute_accept_key, generate_key, validate_response, HandshakeRequest, ResponseAccumulator,
    UpgradeRequest, MAX_HEADER_SIZE,
};

const KEY: &str = "dGhlIHNhbXBsZSBub25jZQ==";
const ACCEPT: &str = "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=";

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Header block for `headers`, as the accumulator hands it over.
fn block(status: &str, headers: &[&str]) -> Vec<u8> {
    let mut lines = vec![status];
    lines.extend_from_slice(headers);
    lines.join("\r\n").into_bytes()
}

fn accept_line() -> String {
    format!("Sec-WebSocket-Accept: {ACCEPT}")
}

fn validate(headers: &[&str], requested: &[&str]) -> Result<String, NetError> {
    validate_response(
        &block("HTTP/1.1 101 Switching Protocols", headers),
        KEY,
        &owned(requested),
    )
}

#[test]
fn test_rfc_sample_accepts() {
    let accept = accept_line();
    let result = validate(
        &["Upgrade: websocket", "Connection: Upgrade", accept.as_str()],
        &[],
    );
    assert_eq!(result, Ok(String::new()));
}

#[test]
fn test_header_order_is_irrelevant() {
    let accept = accept_line();
    let orders: [&[&str]; 3] = [
        &["Upgrade: websocket", "Connection: Upgrade", accept.as_str(), "Server: x"],
        &[accept.as_str(), "Server: x", "Connection: Upgrade", "Upgrade: websocket"],
        &["Server: x", "Connection: Upgrade", accept.as_str(), "Upgrade: websocket"],
    ];
    for headers in orders {
        assert_eq!(validate(headers, &[]), Ok(String::new()));
    }
}

#[test]
fn test_header_values_are_case_insensitive() {
    let accept = accept_line();
    let result = validate(
        &["upgrade: WebSocket", "CONNECTION: upgrade", accept.as_str()],
        &[],
    );
    assert!(result.is_ok());
}

#[test]
fn test_checks_run_in_order() {
    // A wrong status line wins over every later problem.
    assert_eq!(
        validate_response(
            &block("HTTP/1.1 200 OK", &["Upgrade: nope", "X: y", "Z: w"]),
            KEY,
            &[]
        ),
        Err(NetError::BadStatusLine)
    );
    // Header syntax is checked before header values.
    assert_eq!(
        validate(&["Upgrade: nope", "broken", "Z: w"], &[]),
        Err(NetError::MalformedHeader)
    );
    // Connection/Upgrade before the accept hash.
    assert_eq!(
        validate(&["Upgrade: nope", "Connection: Upgrade", "Sec-WebSocket-Accept: x"], &[]),
        Err(NetError::HeaderValueMismatch)
    );
    // Accept hash before sub-protocols.
    assert_eq!(
        validate(
            &[
                "Upgrade: websocket",
                "Connection: Upgrade",
                "Sec-WebSocket-Accept: x",
                "Sec-WebSocket-Protocol: c"
            ],
            &["a"]
        ),
        Err(NetError::AcceptHashMismatch)
    );
}

#[test]
fn test_missing_headers() {
    let accept = accept_line();
    assert_eq!(
        validate(&["Connection: Upgrade", accept.as_str(), "Server: x"], &[]),
        Err(NetError::HeaderValueMismatch)
    );
    assert_eq!(
        validate(&["Upgrade: websocket", accept.as_str(), "Server: x"], &[]),
        Err(NetError::HeaderValueMismatch)
    );
    assert_eq!(
        validate(&["Upgrade: websocket", "Connection: Upgrade", "Server: x"], &[]),
        Err(NetError::AcceptHashMismatch)
    );
}

#[test]
fn test_accept_hash_is_exact() {
    let lower = format!("Sec-WebSocket-Accept: {}", ACCEPT.to_lowercase());
    assert_eq!(
        validate(&["Upgrade: websocket", "Connection: Upgrade", lower.as_str()], &[]),
        Err(NetError::AcceptHashMismatch)
    );
}

#[test]
fn test_subprotocol_rules() {
    let accept = accept_line();
    let with = |proto: &str| {
        let line = format!("Sec-WebSocket-Protocol: {proto}");
        validate(
            &["Upgrade: websocket", "Connection: Upgrade", accept.as_str(), line.as_str()],
            &["a", "b"],
        )
    };
    assert_eq!(with("a"), Ok("a".to_string()));
    assert_eq!(with("b"), Ok("b".to_string()));
    assert_eq!(with("c"), Err(NetError::UnrequestedProtocol));
    // The server must pick exactly one.
    assert_eq!(with("a,b"), Err(NetError::UnrequestedProtocol));

    assert_eq!(
        validate(
            &["Upgrade: websocket", "Connection: Upgrade", accept.as_str(), "Sec-WebSocket-Protocol: a"],
            &[]
        ),
        Err(NetError::UnrequestedProtocol)
    );
    assert_eq!(
        validate(&["Upgrade: websocket", "Connection: Upgrade", accept.as_str()], &["a"]),
        Err(NetError::ProtocolNotAccepted)
    );
}

#[test]
fn test_accumulator_feeds_validation() {
    let response = format!(
        "HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n{}\r\n\r\n",
        accept_line()
    );
    let mut acc = ResponseAccumulator::default();
    let mut complete = false;
    for byte in response.bytes() {
        assert!(!complete, "terminator reported early");
        complete = acc.push(byte).unwrap();
    }
    assert!(complete);
    assert_eq!(acc.len(), response.len());
    assert_eq!(validate_response(acc.header_block(), KEY, &[]), Ok(String::new()));
}

#[test]
fn test_accumulator_overflow() {
    let mut acc = ResponseAccumulator::new(MAX_HEADER_SIZE);
    for _ in 0..MAX_HEADER_SIZE {
        assert_eq!(acc.push(b'a'), Ok(false));
    }
    assert_eq!(acc.push(b'a'), Err(NetError::HeaderTooLarge));
    assert_eq!(acc.len(), MAX_HEADER_SIZE);
}

#[test]
fn test_request_matches_accept_roundtrip() {
    let key = generate_key().unwrap();
    let protocols = owned(&["chat"]);
    let request = HandshakeRequest::new(&UpgradeRequest {
        host: "127.0.0.1",
        path: "/chat",
        port: 8080,
        use_tls: false,
        key: &key,
        protocols: &protocols,
        custom_headers: &[],
    });
    let text = String::from_utf8(request.as_bytes().to_vec()).unwrap();
    assert!(text.contains(&format!("Sec-WebSocket-Key: {key}\r\n")));

    // A server answering this request is accepted.
    let accept = format!("Sec-WebSocket-Accept: {}", compute_accept_key(&key));
    let reply = block(
        "HTTP/1.1 101 Switching Protocols",
        &[
            "Upgrade: websocket",
            "Connection: Upgrade",
            accept.as_str(),
            "Sec-WebSocket-Protocol: chat",
        ],
    );
    assert_eq!(validate_response(&reply, &key, &protocols), Ok("chat".into()));
}
