//! Frame transport backed by tungstenite.
//!
//! Runs tungstenite's `WebSocket` in non-blocking mode over the stream the
//! handshake handed off. Messages are queued in both directions and moved
//! on each `poll`.

use super::message::{close_frame_to_tungstenite, CloseCode, CloseFrame, Message};
use super::peer::{BufferSizes, EstablishedPeer, PeerContext, PeerRole};
use crate::base::neterror::NetError;
use crate::socket::stream::{PartialIo, StreamPeer};
use std::collections::VecDeque;
use std::io;
use tokio_tungstenite::tungstenite::{
    self,
    protocol::{Role, WebSocketConfig},
    WebSocket,
};

type Socket = WebSocket<PartialIo<dyn StreamPeer>>;

/// Default [`EstablishedPeer`]: RFC 6455 framing, masking and control frames.
///
/// # Example
/// ```ignore
/// client.poll();
/// if client.connection_status() == ConnectionStatus::Connected {
///     let peer = client.peer_mut();
///     peer.send(Message::Text("hello".into()))?;
///     while let Some(msg) = peer.recv() { /* ... */ }
/// }
/// ```
#[derive(Default)]
pub struct FramedPeer {
    socket: Option<Socket>,
    id: u32,
    buffers: BufferSizes,
    inbound: VecDeque<Message>,
    outbound: VecDeque<Message>,
    close_code: Option<u16>,
}

fn would_block(e: &tungstenite::Error) -> bool {
    matches!(e, tungstenite::Error::Io(io) if io.kind() == io::ErrorKind::WouldBlock)
}

impl FramedPeer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Queue a message for sending on the next `poll`.
    pub fn send(&mut self, msg: Message) -> Result<(), NetError> {
        if self.socket.is_none() {
            return Err(NetError::SocketNotConnected);
        }
        let len = match &msg {
            Message::Text(s) => s.len(),
            Message::Binary(b) => b.len(),
            Message::Ping(d) | Message::Pong(d) => d.len(),
            Message::Close(_) => 0,
        };
        if len > self.buffers.max_packet_size() {
            return Err(NetError::MessageTooBig);
        }
        if self.outbound.len() >= self.buffers.out_packet_limit() {
            return Err(NetError::BufferFull);
        }
        self.outbound.push_back(msg);
        Ok(())
    }

    /// Next received message, oldest first.
    pub fn recv(&mut self) -> Option<Message> {
        self.inbound.pop_front()
    }

    pub fn available_packets(&self) -> usize {
        self.inbound.len()
    }

    fn drop_socket(&mut self, why: &str, error: &tungstenite::Error) {
        tracing::debug!(peer = self.id, error = %error, "{}", why);
        self.socket = None;
        self.outbound.clear();
    }

    fn write_pending(&mut self) {
        let Some(socket) = self.socket.as_mut() else {
            return;
        };
        while let Some(msg) = self.outbound.pop_front() {
            match socket.write(msg.into()) {
                Ok(()) => {}
                Err(e) if would_block(&e) => break,
                Err(tungstenite::Error::WriteBufferFull(msg)) => {
                    self.outbound.push_front(msg.into());
                    break;
                }
                Err(e) => return self.drop_socket("write failed", &e),
            }
        }
        if let Some(socket) = self.socket.as_mut() {
            match socket.flush() {
                Ok(()) => {}
                Err(e) if would_block(&e) => {}
                Err(e) => self.drop_socket("flush failed", &e),
            }
        }
    }

    fn read_available(&mut self) {
        while let Some(socket) = self.socket.as_mut() {
            match socket.read() {
                Ok(tungstenite::Message::Close(frame)) => {
                    self.close_code = Some(frame.as_ref().map_or(CloseCode::NO_STATUS.0, |f| f.code.into()));
                    tracing::debug!(peer = self.id, code = ?self.close_code, "close frame received");
                }
                Ok(msg) => {
                    if self.inbound.len() >= self.buffers.in_packet_limit() {
                        tracing::warn!(peer = self.id, "inbound queue full, dropping message");
                        continue;
                    }
                    self.inbound.push_back(msg.into());
                }
                Err(e) if would_block(&e) => break,
                Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                    tracing::debug!(peer = self.id, "connection closed");
                    self.socket = None;
                }
                Err(e) => self.drop_socket("read failed", &e),
            }
        }
    }
}

impl EstablishedPeer for FramedPeer {
    fn make_context(&mut self, context: PeerContext) {
        let role = match context.role {
            PeerRole::Client => Role::Client,
            PeerRole::Server => Role::Server,
        };

        let buffers = context.buffers;
        let mut config = WebSocketConfig::default();
        config.max_message_size = Some(buffers.in_buffer_bytes());
        config.max_frame_size = Some(buffers.in_buffer_bytes());
        // Frames go straight to the stream; bytes it cannot take yet wait here.
        config.write_buffer_size = 0;
        config.max_write_buffer_size = buffers.out_buffer_bytes();

        self.socket = Some(WebSocket::from_raw_socket(
            PartialIo::new(context.stream),
            role,
            Some(config),
        ));
        self.id = context.id;
        self.buffers = buffers;
        self.inbound.clear();
        self.outbound.clear();
        self.close_code = None;
        tracing::debug!(peer = self.id, ?role, "peer established");
    }

    fn poll(&mut self) {
        self.write_pending();
        self.read_available();
    }

    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    fn close_code(&self) -> Option<u16> {
        self.close_code
    }

    fn close(&mut self, code: CloseCode, reason: &str) {
        let Some(socket) = self.socket.as_mut() else {
            return;
        };
        let frame = close_frame_to_tungstenite(CloseFrame::new(code, reason));
        match socket.close(Some(frame)) {
            Ok(()) => {}
            Err(e) if would_block(&e) => {}
            Err(e) => self.drop_socket("close failed", &e),
        }
    }
}
