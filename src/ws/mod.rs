//! WebSocket client connection engine.
//!
//! - [`client`]: the poll-driven connection state machine
//! - [`handshake`]: upgrade request encoding and response validation
//! - [`peer`]: handoff of a validated stream to the frame transport
//! - [`framed`]: the default frame transport, built on tungstenite
//!
//! # Example
//! ```ignore
//! use wsdial::ws::{ClientEvent, WebSocketClient};
//!
//! let mut client: WebSocketClient = WebSocketClient::with_runtime(handle);
//! client.connect("example.com", "/chat", 80, false, &["chat".into()], &[])?;
//! while client.next_event().is_none() {
//!     client.poll();
//! }
//! ```

pub mod client;
pub mod framed;
pub mod handshake;
pub mod message;
pub mod peer;

pub use client::{ClientEvent, ClientOptions, WebSocketClient};
pub use framed::FramedPeer;
pub use message::{CloseCode, CloseFrame, Message};
pub use peer::{BufferSizes, EstablishedPeer, PeerContext, PeerRole};
