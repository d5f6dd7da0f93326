//! Non-blocking stream abstractions.
//!
//! Every stage of a connection moves bytes through [`StreamPeer`], whose
//! reads and writes may transfer 0 bytes without that being an error. The
//! same stream object is passed along as ownership moves from the raw
//! transport, to the TLS session, to the established peer.
//!
//! Based on Chromium's `StreamSocket` interface which provides polymorphism
//! for `TcpClientSocket` and `SSLClientSocket`.

use crate::base::neterror::NetError;
use std::io;
use std::net::SocketAddr;

/// A connected byte stream with partial, non-blocking I/O.
///
/// Chromium equivalent: `net::StreamSocket`
pub trait StreamPeer: Send {
    /// Write as much of `buf` as possible without blocking.
    ///
    /// `Ok(0)` means the stream cannot accept bytes right now.
    fn write_partial(&mut self, buf: &[u8]) -> Result<usize, NetError>;

    /// Read up to `buf.len()` bytes without blocking.
    ///
    /// `Ok(0)` means no data is available yet. End of stream is reported
    /// as `Err(NetError::PeerEof)`.
    fn read_partial(&mut self, buf: &mut [u8]) -> Result<usize, NetError>;

    /// Enable or disable write coalescing (Nagle).
    fn set_no_delay(&mut self, enabled: bool) -> Result<(), NetError>;

    /// Close the stream. Further I/O fails.
    fn close(&mut self);
}

/// Connection progress of a [`TransportStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStatus {
    /// Never connected, or closed.
    None,
    Connecting,
    Connected,
    Error,
}

/// A raw transport that connects in the background and is driven by `poll`.
pub trait TransportStream: StreamPeer {
    /// Begin connecting to `addr`.
    ///
    /// An `Err` means the attempt could not even be started; an attempt that
    /// is refused later surfaces as `TransportStatus::Error` from `status`.
    fn connect(&mut self, addr: SocketAddr) -> Result<(), NetError>;

    /// Advance the connect without blocking.
    fn poll(&mut self);

    fn status(&self) -> TransportStatus;

    /// Give up the transport-specific API and keep only the byte stream.
    fn into_stream(self: Box<Self>) -> Box<dyn StreamPeer>;
}

/// `std::io` adapter over a [`StreamPeer`].
///
/// Libraries that expect `Read + Write` over a non-blocking socket (boring,
/// tungstenite) see a 0-byte partial transfer as `WouldBlock` and end of
/// stream as `Ok(0)`.
pub struct PartialIo<S: ?Sized> {
    inner: Box<S>,
}

impl<S: StreamPeer + ?Sized> PartialIo<S> {
    pub fn new(inner: Box<S>) -> Self {
        Self { inner }
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> Box<S> {
        self.inner
    }
}

fn to_io_error(e: NetError) -> io::Error {
    match e {
        NetError::TransportError(kind) => io::Error::new(kind, e),
        NetError::SocketNotConnected => io::Error::new(io::ErrorKind::NotConnected, e),
        other => io::Error::other(other),
    }
}

impl<S: StreamPeer + ?Sized> io::Read for PartialIo<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.inner.read_partial(buf) {
            Ok(0) => Err(io::ErrorKind::WouldBlock.into()),
            Ok(n) => Ok(n),
            Err(NetError::PeerEof) => Ok(0),
            Err(e) => Err(to_io_error(e)),
        }
    }
}

impl<S: StreamPeer + ?Sized> io::Write for PartialIo<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.inner.write_partial(buf) {
            Ok(0) => Err(io::ErrorKind::WouldBlock.into()),
            Ok(n) => Ok(n),
            Err(e) => Err(to_io_error(e)),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
