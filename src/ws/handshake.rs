//! HTTP/1.1 Upgrade handshake codec.
//!
//! Builds the client request, accumulates the server's header block one
//! byte at a time, and validates it against RFC 6455 section 4.2.2.

use crate::base::neterror::NetError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Default capacity of the response header buffer.
pub const MAX_HEADER_SIZE: usize = 4096;

/// Fixed GUID appended to the client key before hashing.
pub const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

const TERMINATOR: &[u8] = b"\r\n\r\n";

/// Fresh `Sec-WebSocket-Key`: base64 of 16 random bytes.
pub fn generate_key() -> Result<String, NetError> {
    let mut nonce = [0u8; 16];
    boring::rand::rand_bytes(&mut nonce).map_err(|_| NetError::KeyGenerationFailed)?;
    Ok(STANDARD.encode(nonce))
}

/// The `Sec-WebSocket-Accept` value a server must answer `key` with.
pub fn compute_accept_key(key: &str) -> String {
    let mut input = String::with_capacity(key.len() + WEBSOCKET_GUID.len());
    input.push_str(key);
    input.push_str(WEBSOCKET_GUID);
    STANDARD.encode(boring::sha::sha1(input.as_bytes()))
}

/// Everything that goes into the upgrade request.
#[derive(Debug, Clone, Copy)]
pub struct UpgradeRequest<'a> {
    pub host: &'a str,
    pub path: &'a str,
    pub port: u16,
    pub use_tls: bool,
    pub key: &'a str,
    pub protocols: &'a [String],
    /// Raw header lines, without line endings.
    pub custom_headers: &'a [String],
}

impl UpgradeRequest<'_> {
    /// The `Host` header value. The port is omitted only for the scheme default.
    pub fn host_header(&self) -> String {
        let default_port = if self.use_tls { 443 } else { 80 };
        if self.port == default_port {
            self.host.to_string()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut request = format!("GET {} HTTP/1.1\r\n", self.path);
        request.push_str(&format!("Host: {}\r\n", self.host_header()));
        request.push_str("Upgrade: websocket\r\n");
        request.push_str("Connection: Upgrade\r\n");
        request.push_str(&format!("Sec-WebSocket-Key: {}\r\n", self.key));
        request.push_str("Sec-WebSocket-Version: 13\r\n");
        if !self.protocols.is_empty() {
            request.push_str(&format!(
                "Sec-WebSocket-Protocol: {}\r\n",
                self.protocols.join(",")
            ));
        }
        for line in self.custom_headers {
            request.push_str(line);
            request.push_str("\r\n");
        }
        request.push_str("\r\n");
        request.into_bytes()
    }
}

/// Encoded request plus how much of it has been written.
#[derive(Debug, Clone)]
pub struct HandshakeRequest {
    bytes: Vec<u8>,
    sent: usize,
}

impl HandshakeRequest {
    pub fn new(request: &UpgradeRequest<'_>) -> Self {
        Self {
            bytes: request.encode(),
            sent: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes not yet written.
    pub fn remaining(&self) -> &[u8] {
        &self.bytes[self.sent..]
    }

    pub fn advance(&mut self, n: usize) {
        self.sent = (self.sent + n).min(self.bytes.len());
    }

    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn is_sent(&self) -> bool {
        self.sent == self.bytes.len()
    }
}

/// Fixed-capacity buffer for the response header block.
#[derive(Debug, Clone)]
pub struct ResponseAccumulator {
    buf: Vec<u8>,
    capacity: usize,
}

impl Default for ResponseAccumulator {
    fn default() -> Self {
        Self::new(MAX_HEADER_SIZE)
    }
}

impl ResponseAccumulator {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() >= self.capacity
    }

    /// Append one byte. Returns `true` once the block ends with `\r\n\r\n`.
    pub fn push(&mut self, byte: u8) -> Result<bool, NetError> {
        if self.is_full() {
            return Err(NetError::HeaderTooLarge);
        }
        self.buf.push(byte);
        Ok(self.is_complete())
    }

    pub fn is_complete(&self) -> bool {
        self.buf.ends_with(TERMINATOR)
    }

    /// The header block with the blank-line terminator stripped.
    pub fn header_block(&self) -> &[u8] {
        self.buf.strip_suffix(TERMINATOR).unwrap_or(&self.buf)
    }

    pub fn reset(&mut self) {
        self.buf.clear();
    }
}

/// Parse the status line and headers of an upgrade response.
///
/// Header names are folded to lowercase and values trimmed; repeated
/// headers are kept as separate entries in the map.
pub fn parse_response(block: &[u8]) -> Result<HeaderMap, NetError> {
    let text = String::from_utf8_lossy(block);
    let lines: Vec<&str> = text.split("\r\n").collect();
    if lines.len() < 4 {
        return Err(NetError::TooFewHeaders);
    }

    let mut status = lines[0].split(' ').filter(|token| !token.is_empty());
    match (status.next(), status.next()) {
        (Some("HTTP/1.1"), Some("101")) => {}
        _ => return Err(NetError::BadStatusLine),
    }

    let mut headers = HeaderMap::new();
    for line in &lines[1..] {
        let (name, value) = line.split_once(':').ok_or(NetError::MalformedHeader)?;
        if name.is_empty() || value.is_empty() {
            return Err(NetError::MalformedHeader);
        }
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| NetError::MalformedHeader)?;
        let value = HeaderValue::from_str(value.trim()).map_err(|_| NetError::MalformedHeader)?;
        headers.append(name, value);
    }
    Ok(headers)
}

/// All values of `name`, comma-joined in arrival order.
fn joined(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let values: Vec<_> = headers
        .get_all(name)
        .iter()
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(","))
    }
}

/// Validate a complete header block and return the negotiated sub-protocol
/// (empty when none was requested).
///
/// Checks run in a fixed order and the first failure is reported: line
/// count, status line, header syntax, `Connection`/`Upgrade`, the accept
/// hash, then sub-protocol negotiation.
pub fn validate_response(
    block: &[u8],
    key: &str,
    requested_protocols: &[String],
) -> Result<String, NetError> {
    let headers = parse_response(block)?;

    let connection = joined(&headers, &header::CONNECTION);
    if !connection.is_some_and(|v| v.eq_ignore_ascii_case("upgrade")) {
        return Err(NetError::HeaderValueMismatch);
    }
    let upgrade = joined(&headers, &header::UPGRADE);
    if !upgrade.is_some_and(|v| v.eq_ignore_ascii_case("websocket")) {
        return Err(NetError::HeaderValueMismatch);
    }

    let accept = joined(&headers, &header::SEC_WEBSOCKET_ACCEPT);
    if accept.as_deref() != Some(compute_accept_key(key).as_str()) {
        return Err(NetError::AcceptHashMismatch);
    }

    let protocol = joined(&headers, &header::SEC_WEBSOCKET_PROTOCOL);
    match protocol {
        None if requested_protocols.is_empty() => Ok(String::new()),
        None => Err(NetError::ProtocolNotAccepted),
        Some(_) if requested_protocols.is_empty() => Err(NetError::UnrequestedProtocol),
        Some(chosen) => {
            if requested_protocols.iter().any(|p| *p == chosen) {
                Ok(chosen)
            } else {
                Err(NetError::UnrequestedProtocol)
            }
        }
    }
}
