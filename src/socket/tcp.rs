//! TCP transport with a background connect.
//!
//! The connect itself runs as a task on a tokio runtime so the caller's poll
//! loop never blocks. Once connected, the socket is taken back out of tokio
//! as a non-blocking `std::net::TcpStream` and driven with plain partial
//! reads and writes.

use super::stream::{StreamPeer, TransportStatus, TransportStream};
use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};

enum TcpState {
    Idle,
    Connecting(oneshot::Receiver<io::Result<TcpStream>>),
    Connected(TcpStream),
    Failed,
}

/// Non-blocking TCP client socket.
///
/// Chromium equivalent: `net::TCPClientSocket`
pub struct TcpTransport {
    runtime: Handle,
    state: TcpState,
    remote: Option<SocketAddr>,
}

impl TcpTransport {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            state: TcpState::Idle,
            remote: None,
        }
    }

    /// Address passed to the last `connect`.
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote
    }

    fn connected(&mut self) -> Result<&mut TcpStream, NetError> {
        match &mut self.state {
            TcpState::Connected(stream) => Ok(stream),
            _ => Err(NetError::SocketNotConnected),
        }
    }

    fn addr_label(&self) -> String {
        self.remote.map(|a| a.to_string()).unwrap_or_default()
    }
}

impl StreamPeer for TcpTransport {
    fn write_partial(&mut self, buf: &[u8]) -> Result<usize, NetError> {
        let addr = self.addr_label();
        match self.connected()?.write(buf) {
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
                Ok(0)
            }
            Err(e) => Err(e).transport_context("write", addr),
        }
    }

    fn read_partial(&mut self, buf: &mut [u8]) -> Result<usize, NetError> {
        if buf.is_empty() {
            return Ok(0);
        }
        let addr = self.addr_label();
        match self.connected()?.read(buf) {
            Ok(0) => Err(NetError::PeerEof),
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
                Ok(0)
            }
            Err(e) => Err(e).transport_context("read", addr),
        }
    }

    fn set_no_delay(&mut self, enabled: bool) -> Result<(), NetError> {
        let addr = self.addr_label();
        self.connected()?
            .set_nodelay(enabled)
            .transport_context("set_nodelay", addr)
    }

    fn close(&mut self) {
        if let TcpState::Connected(stream) = &self.state {
            let _ = stream.shutdown(Shutdown::Both);
        }
        // Dropping the receiver abandons an in-flight connect.
        self.state = TcpState::Idle;
    }
}

impl TransportStream for TcpTransport {
    fn connect(&mut self, addr: SocketAddr) -> Result<(), NetError> {
        self.close();

        let (tx, rx) = oneshot::channel();
        self.runtime.spawn(async move {
            let result = match tokio::net::TcpStream::connect(addr).await {
                Ok(stream) => stream.into_std(),
                Err(e) => Err(e),
            };
            let _ = tx.send(result);
        });

        tracing::debug!(%addr, "TCP connect started");
        self.remote = Some(addr);
        self.state = TcpState::Connecting(rx);
        Ok(())
    }

    fn poll(&mut self) {
        let TcpState::Connecting(rx) = &mut self.state else {
            return;
        };
        let next = match rx.try_recv() {
            Err(TryRecvError::Empty) => return,
            Ok(Ok(stream)) => {
                tracing::debug!(addr = %self.addr_label(), "TCP connected");
                TcpState::Connected(stream)
            }
            Ok(Err(e)) => {
                tracing::debug!(addr = %self.addr_label(), error = %e, "TCP connect failed");
                TcpState::Failed
            }
            Err(TryRecvError::Closed) => TcpState::Failed,
        };
        self.state = next;
    }

    fn status(&self) -> TransportStatus {
        match self.state {
            TcpState::Idle => TransportStatus::None,
            TcpState::Connecting(_) => TransportStatus::Connecting,
            TcpState::Connected(_) => TransportStatus::Connected,
            TcpState::Failed => TransportStatus::Error,
        }
    }

    fn into_stream(self: Box<Self>) -> Box<dyn StreamPeer> {
        self
    }
}
