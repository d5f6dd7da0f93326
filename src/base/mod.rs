//! Base types and error handling.
//!
//! Provides foundational types shared by every stage of a connection:
//! - [`NetError`](neterror::NetError): error codes for setup, transport and handshake failures
//! - [`ConnectionStatus`](loadstate::ConnectionStatus) and [`LoadState`](loadstate::LoadState)

pub mod context;
pub mod loadstate;
pub mod neterror;

#[cfg(test)]
mod tests;
