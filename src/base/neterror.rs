use std::io;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum NetError {
    // Setup Errors
    #[error("Connection already in use")]
    AlreadyInUse,
    #[error("Invalid parameter")]
    InvalidParameter,
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Handshake key generation failed")]
    KeyGenerationFailed,

    // Connection Errors
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("Connection failed")]
    ConnectFailed,
    #[error("Socket not connected")]
    SocketNotConnected,
    #[error("SSL protocol error")]
    TlsFailure,
    #[error("Connection closed by peer")]
    PeerEof,
    #[error("Transport error: {0:?}")]
    TransportError(io::ErrorKind),

    // Message Errors
    #[error("Message too big")]
    MessageTooBig,
    #[error("No buffer space")]
    BufferFull,

    // Handshake Errors
    #[error("Response headers too big")]
    HeaderTooLarge,
    #[error("Not enough response headers")]
    TooFewHeaders,
    #[error("Invalid protocol or status code, expected 'HTTP/1.1 101'")]
    BadStatusLine,
    #[error("Malformed response header")]
    MalformedHeader,
    #[error("Missing or invalid Connection/Upgrade header")]
    HeaderValueMismatch,
    #[error("Sec-WebSocket-Accept mismatch")]
    AcceptHashMismatch,
    #[error("Received unrequested sub-protocol")]
    UnrequestedProtocol,
    #[error("Requested sub-protocol(s) but received none")]
    ProtocolNotAccepted,

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    /// True for failures caused by the server's upgrade response.
    pub fn is_handshake_error(&self) -> bool {
        matches!(
            self,
            NetError::HeaderTooLarge
                | NetError::TooFewHeaders
                | NetError::BadStatusLine
                | NetError::MalformedHeader
                | NetError::HeaderValueMismatch
                | NetError::AcceptHashMismatch
                | NetError::UnrequestedProtocol
                | NetError::ProtocolNotAccepted
        )
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::InvalidParameter => -4,
            NetError::AlreadyInUse => -23,
            NetError::PeerEof => -100,
            NetError::ConnectFailed => -104,
            NetError::NameNotResolved => -105,
            NetError::TlsFailure => -107,
            NetError::SocketNotConnected => -112,
            NetError::MessageTooBig => -142,
            NetError::BufferFull => -176,
            NetError::InvalidUrl => -300,
            NetError::HeaderTooLarge => -325,
            // Handshake errors (custom codes starting at -10000)
            NetError::TooFewHeaders => -10001,
            NetError::BadStatusLine => -10002,
            NetError::MalformedHeader => -10003,
            NetError::HeaderValueMismatch => -10004,
            NetError::AcceptHashMismatch => -10005,
            NetError::UnrequestedProtocol => -10006,
            NetError::ProtocolNotAccepted => -10007,
            NetError::KeyGenerationFailed => -10008,
            // The io::ErrorKind does not survive the round trip.
            NetError::TransportError(_) => -10009,
            NetError::Unknown(code) => *code,
        }
    }
}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -4 => NetError::InvalidParameter,
            -23 => NetError::AlreadyInUse,
            -100 => NetError::PeerEof,
            -104 => NetError::ConnectFailed,
            -105 => NetError::NameNotResolved,
            -107 => NetError::TlsFailure,
            -112 => NetError::SocketNotConnected,
            -142 => NetError::MessageTooBig,
            -176 => NetError::BufferFull,
            -300 => NetError::InvalidUrl,
            -325 => NetError::HeaderTooLarge,
            -10001 => NetError::TooFewHeaders,
            -10002 => NetError::BadStatusLine,
            -10003 => NetError::MalformedHeader,
            -10004 => NetError::HeaderValueMismatch,
            -10005 => NetError::AcceptHashMismatch,
            -10006 => NetError::UnrequestedProtocol,
            -10007 => NetError::ProtocolNotAccepted,
            -10008 => NetError::KeyGenerationFailed,
            -10009 => NetError::TransportError(io::ErrorKind::Other),
            _ => NetError::Unknown(code),
        }
    }
}

impl From<io::Error> for NetError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => NetError::PeerEof,
            io::ErrorKind::NotConnected => NetError::SocketNotConnected,
            kind => NetError::TransportError(kind),
        }
    }
}
