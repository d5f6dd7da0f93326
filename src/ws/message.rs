//! Messages exchanged with an established peer.

use bytes::Bytes;
use tokio_tungstenite::tungstenite;

/// A complete WebSocket message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Text message (UTF-8)
    Text(String),
    /// Binary message
    Binary(Bytes),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    /// Close frame with optional code and reason
    Close(Option<CloseFrame>),
}

/// Close frame data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseFrame {
    pub code: CloseCode,
    pub reason: String,
}

impl CloseFrame {
    pub fn new(code: CloseCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

/// WebSocket close codes (RFC 6455).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseCode(pub u16);

impl CloseCode {
    /// Normal closure
    pub const NORMAL: Self = Self(1000);
    /// Server going down
    pub const GOING_AWAY: Self = Self(1001);
    /// Protocol error
    pub const PROTOCOL_ERROR: Self = Self(1002);
    /// No status received
    pub const NO_STATUS: Self = Self(1005);
    /// Abnormal closure
    pub const ABNORMAL: Self = Self(1006);
    /// Message too big
    pub const MESSAGE_TOO_BIG: Self = Self(1009);
}

impl Default for CloseCode {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.0
    }
}

impl Message {
    pub fn is_close(&self) -> bool {
        matches!(self, Message::Close(_))
    }

    /// Try to get as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Message::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Payload bytes (text as UTF-8, binary as-is).
    pub fn into_data(self) -> Vec<u8> {
        match self {
            Message::Text(s) => s.into_bytes(),
            Message::Binary(b) => b.to_vec(),
            Message::Ping(d) | Message::Pong(d) => d,
            Message::Close(_) => Vec::new(),
        }
    }
}

pub(crate) fn close_frame_to_tungstenite(
    frame: CloseFrame,
) -> tungstenite::protocol::CloseFrame<'static> {
    tungstenite::protocol::CloseFrame {
        code: tungstenite::protocol::frame::coding::CloseCode::from(frame.code.0),
        reason: frame.reason.into(),
    }
}

impl From<Message> for tungstenite::Message {
    fn from(msg: Message) -> Self {
        match msg {
            Message::Text(s) => tungstenite::Message::Text(s),
            Message::Binary(b) => tungstenite::Message::Binary(b.to_vec()),
            Message::Ping(d) => tungstenite::Message::Ping(d),
            Message::Pong(d) => tungstenite::Message::Pong(d),
            Message::Close(frame) => {
                tungstenite::Message::Close(frame.map(close_frame_to_tungstenite))
            }
        }
    }
}

impl From<tungstenite::Message> for Message {
    fn from(msg: tungstenite::Message) -> Self {
        match msg {
            tungstenite::Message::Text(s) => Message::Text(s.to_string()),
            tungstenite::Message::Binary(b) => Message::Binary(Bytes::from(b.to_vec())),
            tungstenite::Message::Ping(d) => Message::Ping(d.to_vec()),
            tungstenite::Message::Pong(d) => Message::Pong(d.to_vec()),
            tungstenite::Message::Close(frame) => Message::Close(frame.map(|f| CloseFrame {
                code: CloseCode(f.code.into()),
                reason: f.reason.to_string(),
            })),
            // Raw frames are never produced by `read`.
            tungstenite::Message::Frame(_) => Message::Binary(Bytes::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_codes() {
        assert_eq!(CloseCode::default(), CloseCode::NORMAL);
        let code: u16 = CloseCode::GOING_AWAY.into();
        assert_eq!(code, 1001);
    }

    #[test]
    fn test_message_conversion() {
        let back = Message::from(tungstenite::Message::from(Message::Text("hello".into())));
        assert_eq!(back.as_text(), Some("hello"));

        let close = Message::Close(Some(CloseFrame::new(CloseCode::NORMAL, "bye")));
        let back = Message::from(tungstenite::Message::from(close.clone()));
        assert_eq!(back, close);
        assert!(back.is_close());
    }

    #[test]
    fn test_into_data() {
        assert_eq!(Message::Text("test".into()).into_data(), b"test");
        assert_eq!(Message::Binary(Bytes::from_static(b"bin")).into_data(), b"bin");
    }
}
