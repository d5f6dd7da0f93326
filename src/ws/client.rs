//! Poll-driven WebSocket client.
//!
//! [`WebSocketClient`] walks one connection through name resolution, TCP
//! connect, optional TLS and the HTTP/1.1 upgrade, then hands the stream to
//! an [`EstablishedPeer`]. Nothing blocks: every stage does what it can on
//! each [`poll`](WebSocketClient::poll) and picks up where it left off on
//! the next one. Outcomes are queued as [`ClientEvent`]s.

use super::framed::FramedPeer;
use super::handshake::{
    generate_key, validate_response, HandshakeRequest, ResponseAccumulator, UpgradeRequest,
    MAX_HEADER_SIZE,
};
use super::message::CloseCode;
use super::peer::{hand_off, BufferSizes, EstablishedPeer};
use crate::base::loadstate::{ConnectionStatus, LoadState};
use crate::base::neterror::NetError;
use crate::dns::{parse_ip_literal, AddressResolver, LookupToken, QueuedResolver, ResolverStatus};
use crate::socket::connectjob::CandidateList;
use crate::socket::connector::{Connector, TokioConnector};
use crate::socket::stream::{StreamPeer, TransportStatus, TransportStream};
use crate::socket::tls::{TlsOptions, TlsSession, TlsStatus};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::runtime::Handle;
use url::Url;

/// Per-client settings.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Capacity of the response header buffer.
    pub max_header_size: usize,
    pub buffers: BufferSizes,
    pub tls: TlsOptions,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            max_header_size: MAX_HEADER_SIZE,
            buffers: BufferSizes::default(),
            tls: TlsOptions::default(),
        }
    }
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_header_size(mut self, size: usize) -> Self {
        self.max_header_size = size;
        self
    }

    pub fn buffers(mut self, buffers: BufferSizes) -> Self {
        self.buffers = buffers;
        self
    }

    pub fn tls(mut self, tls: TlsOptions) -> Self {
        self.tls = tls;
        self
    }

    /// Skip certificate and hostname verification.
    pub fn verify_peer(mut self, verify: bool) -> Self {
        self.tls.verify_peer = verify;
        self
    }

    /// Trust an extra PEM-encoded CA certificate.
    pub fn trusted_ca_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.tls.trusted_ca_pem = Some(pem.into());
        self
    }
}

/// Outcome notifications, drained with [`WebSocketClient::next_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Handshake validated; `protocol` is empty when none was negotiated.
    Connected { protocol: String },
    /// The established peer went away. `was_clean` is true when a close
    /// frame was received.
    Disconnected { was_clean: bool },
    /// The attempt failed and was torn down.
    Error(NetError),
}

/// Where the attempt's bytes currently flow.
enum Link {
    Plain(Box<dyn TransportStream>),
    Tls(Box<dyn TlsSession>),
}

impl Link {
    fn write_partial(&mut self, buf: &[u8]) -> Result<usize, NetError> {
        match self {
            Link::Plain(transport) => transport.write_partial(buf),
            Link::Tls(session) => session.write_partial(buf),
        }
    }

    fn read_partial(&mut self, buf: &mut [u8]) -> Result<usize, NetError> {
        match self {
            Link::Plain(transport) => transport.read_partial(buf),
            Link::Tls(session) => session.read_partial(buf),
        }
    }

    fn close(&mut self) {
        match self {
            Link::Plain(transport) => transport.close(),
            Link::Tls(session) => session.close(),
        }
    }

    fn into_stream(self) -> Box<dyn StreamPeer> {
        match self {
            Link::Plain(transport) => transport.into_stream(),
            Link::Tls(session) => session.into_stream(),
        }
    }
}

enum Progress {
    Pending,
    Validated(String),
}

/// State owned by one connection attempt, dropped as a unit on teardown.
struct Attempt {
    host: String,
    use_tls: bool,
    protocols: Vec<String>,
    key: String,
    request: HandshakeRequest,
    response: ResponseAccumulator,
    lookup: Option<LookupToken>,
    candidates: CandidateList,
    link: Option<Link>,
    remote: Option<SocketAddr>,
}

impl Attempt {
    /// Start a transport on the next candidate that accepts a connect.
    fn start_next(&mut self, connector: &dyn Connector) -> Result<(), NetError> {
        let (transport, addr) = self.candidates.connect_next(connector)?;
        self.link = Some(Link::Plain(transport));
        self.remote = Some(addr);
        Ok(())
    }

    fn load_state(&self) -> LoadState {
        match &self.link {
            None => LoadState::ResolvingHost,
            Some(Link::Plain(transport)) => match transport.status() {
                TransportStatus::Connected if self.use_tls => LoadState::TlsHandshake,
                TransportStatus::Connected => self.io_state(),
                _ => LoadState::Connecting,
            },
            Some(Link::Tls(session)) => match session.status() {
                TlsStatus::Connected => self.io_state(),
                _ => LoadState::TlsHandshake,
            },
        }
    }

    fn io_state(&self) -> LoadState {
        if self.request.is_sent() {
            LoadState::WaitingForResponse
        } else {
            LoadState::SendingRequest
        }
    }

    /// Bring the link up. Returns `false` while the transport or TLS
    /// session still needs polling.
    fn drive_link(&mut self, connector: &dyn Connector, tls: &TlsOptions) -> Result<bool, NetError> {
        let Some(link) = self.link.take() else {
            return Ok(false);
        };

        let mut session = match link {
            Link::Tls(mut session) => {
                session.poll();
                session
            }
            Link::Plain(mut transport) => {
                transport.poll();
                match transport.status() {
                    TransportStatus::Connecting => {
                        self.link = Some(Link::Plain(transport));
                        return Ok(false);
                    }
                    TransportStatus::Error => {
                        tracing::debug!(addr = ?self.remote, "candidate failed, trying next");
                        transport.close();
                        self.start_next(connector)?;
                        return Ok(false);
                    }
                    // Closed underneath us before the upgrade.
                    TransportStatus::None => return Err(NetError::PeerEof),
                    TransportStatus::Connected => {}
                }

                self.candidates.clear();
                if !self.use_tls {
                    self.link = Some(Link::Plain(transport));
                    return Ok(true);
                }
                connector.wrap_tls(transport, &self.host, tls).map_err(|e| {
                    tracing::warn!(host = %self.host, error = %e, "TLS setup failed");
                    NetError::TlsFailure
                })?
            }
        };

        match session.status() {
            TlsStatus::Handshaking => {
                self.link = Some(Link::Tls(session));
                Ok(false)
            }
            TlsStatus::Connected => {
                self.link = Some(Link::Tls(session));
                Ok(true)
            }
            TlsStatus::Error => {
                session.close();
                Err(NetError::TlsFailure)
            }
        }
    }

    /// Write the request, then read the response one byte at a time.
    fn exchange(&mut self) -> Result<Progress, NetError> {
        let Some(stream) = self.link.as_mut() else {
            return Ok(Progress::Pending);
        };

        if !self.request.is_sent() {
            let written = stream.write_partial(self.request.remaining())?;
            self.request.advance(written);
            if !self.request.is_sent() {
                return Ok(Progress::Pending);
            }
            tracing::debug!(host = %self.host, bytes = self.request.sent(), "upgrade request sent");
        }

        let mut byte = [0u8; 1];
        loop {
            if self.response.is_full() {
                return Err(NetError::HeaderTooLarge);
            }
            let read = match stream.read_partial(&mut byte) {
                Ok(n) => n,
                Err(NetError::PeerEof) => return Err(NetError::PeerEof),
                Err(NetError::TransportError(kind)) => return Err(NetError::TransportError(kind)),
                Err(e) => {
                    tracing::debug!(error = %e, "response read failed");
                    return Err(NetError::TransportError(std::io::ErrorKind::Other));
                }
            };
            if read == 0 {
                return Ok(Progress::Pending);
            }
            if self.response.push(byte[0])? {
                let protocol =
                    validate_response(self.response.header_block(), &self.key, &self.protocols)?;
                return Ok(Progress::Validated(protocol));
            }
        }
    }
}

/// Non-blocking WebSocket client for a single connection.
///
/// Drive it by calling [`poll`](Self::poll) from your own loop and drain
/// [`next_event`](Self::next_event) afterwards.
///
/// # Example
/// ```rust,ignore
/// use wsdial::ws::{ClientEvent, WebSocketClient};
///
/// let mut client: WebSocketClient = WebSocketClient::with_runtime(runtime.handle().clone());
/// client.connect_to_url("ws://127.0.0.1:8080/chat", &["chat".into()], &[])?;
/// loop {
///     client.poll();
///     while let Some(event) = client.next_event() {
///         println!("{event:?}");
///     }
/// }
/// ```
pub struct WebSocketClient<P: EstablishedPeer + Default = FramedPeer> {
    resolver: Arc<dyn AddressResolver>,
    connector: Arc<dyn Connector>,
    options: ClientOptions,
    status: ConnectionStatus,
    attempt: Option<Attempt>,
    peer: P,
    connected_addr: Option<SocketAddr>,
    events: VecDeque<ClientEvent>,
}

impl<P: EstablishedPeer + Default> WebSocketClient<P> {
    pub fn new(resolver: Arc<dyn AddressResolver>, connector: Arc<dyn Connector>) -> Self {
        Self::with_options(resolver, connector, ClientOptions::default())
    }

    pub fn with_options(
        resolver: Arc<dyn AddressResolver>,
        connector: Arc<dyn Connector>,
        options: ClientOptions,
    ) -> Self {
        Self {
            resolver,
            connector,
            options,
            status: ConnectionStatus::Disconnected,
            attempt: None,
            peer: P::default(),
            connected_addr: None,
            events: VecDeque::new(),
        }
    }

    /// System resolver and TCP/BoringSSL connector, both running their
    /// background work on `runtime`.
    pub fn with_runtime(runtime: Handle) -> Self {
        Self::new(
            Arc::new(QueuedResolver::new(runtime.clone())),
            Arc::new(TokioConnector::new(runtime)),
        )
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    fn in_use(&self) -> bool {
        self.attempt.is_some() || self.connection_status() == ConnectionStatus::Connected
    }

    /// Start connecting to `host:port` and request `path`.
    ///
    /// `extra_headers` are raw header lines without line endings. Errors
    /// returned here are precondition failures; everything after that is
    /// reported through [`next_event`](Self::next_event).
    pub fn connect(
        &mut self,
        host: &str,
        path: &str,
        port: u16,
        use_tls: bool,
        protocols: &[String],
        extra_headers: &[String],
    ) -> Result<(), NetError> {
        if self.in_use() {
            return Err(NetError::AlreadyInUse);
        }
        if path.is_empty() {
            return Err(NetError::InvalidParameter);
        }
        if extra_headers.iter().any(|line| line.contains(['\r', '\n'])) {
            return Err(NetError::InvalidParameter);
        }

        let protocols: Vec<String> = protocols.iter().map(|p| p.trim().to_string()).collect();
        let key = generate_key()?;
        let request = HandshakeRequest::new(&UpgradeRequest {
            host,
            path,
            port,
            use_tls,
            key: &key,
            protocols: &protocols,
            custom_headers: extra_headers,
        });

        let mut attempt = Attempt {
            host: host.to_string(),
            use_tls,
            protocols,
            key,
            request,
            response: ResponseAccumulator::new(self.options.max_header_size),
            lookup: None,
            candidates: CandidateList::new(port),
            link: None,
            remote: None,
        };

        if let Some(ip) = parse_ip_literal(host) {
            attempt.candidates.seed([ip]);
        } else {
            let token = self.resolver.submit(host)?;
            match self.resolver.status(token) {
                ResolverStatus::Waiting => {
                    tracing::debug!(host, token = token.0, "waiting for lookup");
                    attempt.lookup = Some(token);
                }
                ResolverStatus::Done => {
                    attempt.candidates.seed(self.resolver.addresses(token));
                    self.resolver.release(token);
                }
                ResolverStatus::Error => {
                    tracing::debug!(host, "lookup failed immediately");
                    self.resolver.release(token);
                }
            }
        }

        self.status = ConnectionStatus::Connecting;
        self.connected_addr = None;
        let pending = attempt.lookup.is_some();
        let started = if pending {
            Ok(())
        } else {
            attempt.start_next(self.connector.as_ref())
        };
        self.attempt = Some(attempt);

        if let Err(e) = started {
            self.fail(e);
            return Err(e);
        }
        Ok(())
    }

    /// Connect to a `ws://` or `wss://` URL.
    pub fn connect_to_url(
        &mut self,
        url: &str,
        protocols: &[String],
        extra_headers: &[String],
    ) -> Result<(), NetError> {
        let url = Url::parse(url).map_err(|_| NetError::InvalidUrl)?;
        let use_tls = match url.scheme() {
            "ws" => false,
            "wss" => true,
            _ => return Err(NetError::InvalidUrl),
        };
        let host = url.host_str().ok_or(NetError::InvalidUrl)?;
        let port = url.port_or_known_default().ok_or(NetError::InvalidUrl)?;

        let mut path = match url.path() {
            "" => "/".to_string(),
            p => p.to_string(),
        };
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }

        self.connect(host, &path, port, use_tls, protocols, extra_headers)
    }

    /// Advance the connection without blocking.
    pub fn poll(&mut self) {
        if let Err(e) = self.poll_lookup() {
            self.fail(e);
            return;
        }

        if self.peer.is_connected() || self.status == ConnectionStatus::Connected {
            self.peer.poll();
            if !self.peer.is_connected() {
                let was_clean = self.peer.close_code().is_some();
                tracing::debug!(was_clean, "peer disconnected");
                self.teardown(CloseCode::NORMAL, "");
                self.events.push_back(ClientEvent::Disconnected { was_clean });
            }
            return;
        }

        let Some(attempt) = self.attempt.as_mut() else {
            return;
        };

        let progress = attempt
            .drive_link(self.connector.as_ref(), &self.options.tls)
            .and_then(|ready| if ready { attempt.exchange() } else { Ok(Progress::Pending) });

        match progress {
            Ok(Progress::Pending) => {}
            Ok(Progress::Validated(protocol)) => self.establish(protocol),
            Err(e) => self.fail(e),
        }
    }

    /// Move a finished lookup's addresses into the candidate list.
    fn poll_lookup(&mut self) -> Result<(), NetError> {
        let Some(attempt) = self.attempt.as_mut() else {
            return Ok(());
        };
        let Some(token) = attempt.lookup else {
            return Ok(());
        };

        match self.resolver.status(token) {
            ResolverStatus::Waiting => Ok(()),
            ResolverStatus::Done => {
                let addrs = self.resolver.addresses(token);
                tracing::debug!(host = %attempt.host, count = addrs.len(), "lookup done");
                attempt.candidates.seed(addrs);
                attempt.lookup = None;
                self.resolver.release(token);
                attempt.start_next(self.connector.as_ref())
            }
            ResolverStatus::Error => {
                attempt.lookup = None;
                self.resolver.release(token);
                Err(NetError::NameNotResolved)
            }
        }
    }

    fn establish(&mut self, protocol: String) {
        let Some(mut attempt) = self.attempt.take() else {
            return;
        };
        let Some(link) = attempt.link.take() else {
            return;
        };

        tracing::debug!(host = %attempt.host, protocol = %protocol, "handshake complete");
        hand_off(&mut self.peer, link.into_stream(), self.options.buffers);
        self.connected_addr = attempt.remote;
        self.status = ConnectionStatus::Connected;
        self.events.push_back(ClientEvent::Connected { protocol });
    }

    fn fail(&mut self, error: NetError) {
        tracing::warn!(error = %error, code = error.as_i32(), "connection attempt failed");
        self.teardown(CloseCode::NORMAL, "");
        self.status = ConnectionStatus::Error;
        self.events.push_back(ClientEvent::Error(error));
    }

    fn teardown(&mut self, code: CloseCode, reason: &str) {
        if self.peer.is_connected() {
            self.peer.close(code, reason);
        }
        if let Some(mut attempt) = self.attempt.take() {
            if let Some(token) = attempt.lookup.take() {
                self.resolver.release(token);
            }
            if let Some(mut link) = attempt.link.take() {
                link.close();
            }
        }
        self.connected_addr = None;
        self.status = ConnectionStatus::Disconnected;
    }

    /// Tear everything down. Safe to call in any state, any number of times.
    ///
    /// An established peer is asked to close with `code` and `reason`; keep
    /// polling to let the close handshake finish.
    pub fn disconnect_from_host(&mut self, code: CloseCode, reason: &str) {
        self.teardown(code, reason);
    }

    /// `Connected` while the peer is connected, even after a local
    /// disconnect, so a close handshake can complete.
    pub fn connection_status(&self) -> ConnectionStatus {
        if self.peer.is_connected() {
            return ConnectionStatus::Connected;
        }
        self.status
    }

    pub fn load_state(&self) -> LoadState {
        if self.peer.is_connected() {
            return LoadState::Established;
        }
        self.attempt
            .as_ref()
            .map_or(LoadState::Idle, Attempt::load_state)
    }

    pub fn next_event(&mut self) -> Option<ClientEvent> {
        self.events.pop_front()
    }

    /// Address of the server while connected.
    pub fn connected_addr(&self) -> Option<SocketAddr> {
        self.connected_addr
    }

    pub fn peer(&self) -> &P {
        &self.peer
    }

    pub fn peer_mut(&mut self) -> &mut P {
        &mut self.peer
    }

    /// Size the peer's buffers, in kibibytes and packet counts. Each value
    /// is rounded up to a power of two.
    pub fn set_buffers(
        &mut self,
        in_kb: u32,
        in_packets: u32,
        out_kb: u32,
        out_packets: u32,
    ) -> Result<(), NetError> {
        if self.in_use() {
            return Err(NetError::AlreadyInUse);
        }
        self.options.buffers = BufferSizes::from_limits(in_kb, in_packets, out_kb, out_packets);
        Ok(())
    }

    pub fn max_packet_size(&self) -> usize {
        self.options.buffers.max_packet_size()
    }
}

impl<P: EstablishedPeer + Default> Drop for WebSocketClient<P> {
    fn drop(&mut self) {
        self.teardown(CloseCode::GOING_AWAY, "");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = ClientOptions::new()
            .max_header_size(128)
            .verify_peer(false)
            .trusted_ca_pem(b"pem".to_vec());
        assert_eq!(options.max_header_size, 128);
        assert!(!options.tls.verify_peer);
        assert_eq!(options.tls.trusted_ca_pem.as_deref(), Some(&b"pem"[..]));
        assert_eq!(options.buffers, BufferSizes::default());
    }
}
