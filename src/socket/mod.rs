//! Socket and connection management.
//!
//! Provides the non-blocking stream layer mirroring Chromium's `net/socket/`:
//! - [`stream`]: partial-I/O stream traits and the `std::io` adapter
//! - [`tcp`]: TCP transport with a background connect
//! - [`tls`]: TLS configuration and sessions with BoringSSL
//! - [`connectjob`]: candidate address iteration
//! - [`connector`]: transport/TLS factory used by the client

pub mod connectjob;
pub mod connector;
pub mod stream;
pub mod tcp;
pub mod tls;
