//! # wsdial
//!
//! A non-blocking, poll-driven WebSocket client connection engine.
//!
//! `wsdial` takes a single outbound connection from a hostname to an
//! established WebSocket: name resolution, TCP connect, optional TLS, the
//! HTTP/1.1 Upgrade handshake and its validation, then handoff to a frame
//! transport. The caller owns the loop; nothing blocks and no thread is
//! dedicated to the connection.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wsdial::ws::{ClientEvent, Message, WebSocketClient};
//!
//! let runtime = tokio::runtime::Runtime::new()?;
//! let mut client: WebSocketClient = WebSocketClient::with_runtime(runtime.handle().clone());
//! client.connect_to_url("ws://127.0.0.1:8080/chat", &["chat".into()], &[])?;
//!
//! loop {
//!     client.poll();
//!     match client.next_event() {
//!         Some(ClientEvent::Connected { protocol }) => {
//!             client.peer_mut().send(Message::Text(format!("hi over {protocol}")))?;
//!         }
//!         Some(ClientEvent::Error(e)) => return Err(e.into()),
//!         _ => {}
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error codes and connection states
//! - [`dns`] - Pollable, queued hostname resolution
//! - [`socket`] - Non-blocking TCP and TLS streams
//! - [`ws`] - Handshake codec, client state machine and frame transport

pub mod base;
pub mod dns;
pub mod socket;
pub mod ws;
