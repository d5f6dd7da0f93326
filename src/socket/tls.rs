use super::stream::{PartialIo, StreamPeer, TransportStream};
use crate::base::neterror::NetError;
use boring::ssl::{
    HandshakeError, MidHandshakeSslStream, SslConnector, SslConnectorBuilder, SslMethod,
    SslStream, SslVerifyMode, SslVersion,
};
use boring::x509::X509;
use std::io::{self, Read, Write};

/// Connector-wide TLS settings.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub min_version: Option<SslVersion>,
    pub max_version: Option<SslVersion>,
    pub cipher_list: String,
    pub alpn_protos: Vec<String>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            min_version: Some(SslVersion::TLS1_2),
            max_version: Some(SslVersion::TLS1_3),
            cipher_list: "ECDHE-ECDSA-AES128-GCM-SHA256:ECDHE-RSA-AES128-GCM-SHA256:\
                ECDHE-ECDSA-AES256-GCM-SHA384:ECDHE-RSA-AES256-GCM-SHA384:\
                ECDHE-ECDSA-CHACHA20-POLY1305:ECDHE-RSA-CHACHA20-POLY1305"
                .to_string(),
            // The upgrade handshake is HTTP/1.1 only.
            alpn_protos: vec!["http/1.1".to_string()],
        }
    }
}

impl TlsConfig {
    /// Apply this configuration to an SSL connector builder.
    pub fn apply_to_builder(&self, builder: &mut SslConnectorBuilder) -> Result<(), NetError> {
        if let Some(min) = self.min_version {
            builder.set_min_proto_version(Some(min)).map_err(|_| NetError::TlsFailure)?;
        }
        if let Some(max) = self.max_version {
            builder.set_max_proto_version(Some(max)).map_err(|_| NetError::TlsFailure)?;
        }

        if !self.cipher_list.is_empty() {
            builder.set_cipher_list(&self.cipher_list).map_err(|_| NetError::TlsFailure)?;
        }

        if !self.alpn_protos.is_empty() {
            builder
                .set_alpn_protos(&Self::alpn_wire(&self.alpn_protos)?)
                .map_err(|_| NetError::TlsFailure)?;
        }

        builder.set_verify(SslVerifyMode::PEER);
        Ok(())
    }

    /// Length-prefixed ALPN list, e.g. `"\x08http/1.1"`.
    fn alpn_wire(protos: &[String]) -> Result<Vec<u8>, NetError> {
        let mut wire = Vec::new();
        for proto in protos {
            let len = u8::try_from(proto.len()).map_err(|_| NetError::InvalidParameter)?;
            wire.push(len);
            wire.extend_from_slice(proto.as_bytes());
        }
        Ok(wire)
    }

    /// Build a connector, trusting `extra_ca_pem` in addition to the system roots.
    pub fn build_connector(&self, extra_ca_pem: Option<&[u8]>) -> Result<SslConnector, NetError> {
        let mut builder = SslConnector::builder(SslMethod::tls()).map_err(|_| NetError::TlsFailure)?;
        self.apply_to_builder(&mut builder)?;
        if let Some(pem) = extra_ca_pem {
            let cert = X509::from_pem(pem).map_err(|_| NetError::InvalidParameter)?;
            builder
                .cert_store_mut()
                .add_cert(cert)
                .map_err(|_| NetError::TlsFailure)?;
        }
        Ok(builder.build())
    }

    /// Check if SNI (Server Name Indication) should be set for this host.
    /// Per RFC 6066, SNI MUST NOT be set for raw IP addresses.
    pub fn should_set_sni(host: &str) -> bool {
        crate::dns::parse_ip_literal(host).is_none()
    }
}

/// Per-connection TLS choices made by the caller of `connect`.
#[derive(Debug, Clone)]
pub struct TlsOptions {
    /// Verify the certificate chain and hostname.
    pub verify_peer: bool,
    /// Extra PEM-encoded CA certificate to trust.
    pub trusted_ca_pem: Option<Vec<u8>>,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self {
            verify_peer: true,
            trusted_ca_pem: None,
        }
    }
}

/// Handshake progress of a [`TlsSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsStatus {
    Handshaking,
    Connected,
    Error,
}

/// A TLS layer over a transport that negotiates without blocking.
pub trait TlsSession: StreamPeer {
    /// Advance the handshake.
    fn poll(&mut self);

    fn status(&self) -> TlsStatus;

    fn into_stream(self: Box<Self>) -> Box<dyn StreamPeer>;
}

type BoxedIo = PartialIo<dyn TransportStream>;

enum SessionState {
    Handshaking(MidHandshakeSslStream<BoxedIo>),
    Connected(SslStream<BoxedIo>),
    Failed,
}

/// BoringSSL client session driven by `poll`.
pub struct BoringTlsSession {
    state: SessionState,
    host: String,
}

impl BoringTlsSession {
    /// Start a client handshake over an already connected transport.
    pub fn connect(
        transport: Box<dyn TransportStream>,
        host: &str,
        config: &TlsConfig,
        options: &TlsOptions,
    ) -> Result<Self, NetError> {
        let connector = config.build_connector(options.trusted_ca_pem.as_deref())?;
        let mut configuration = connector.configure().map_err(|_| NetError::TlsFailure)?;
        configuration.set_use_server_name_indication(TlsConfig::should_set_sni(host));
        if !options.verify_peer {
            configuration.set_verify_hostname(false);
            configuration.set_verify(SslVerifyMode::NONE);
        }

        // `connect` expects a bare hostname.
        let domain = host.trim_start_matches('[').trim_end_matches(']');
        tracing::debug!(host, verify = options.verify_peer, "TLS handshake started");

        let state = match configuration.connect(domain, PartialIo::new(transport)) {
            Ok(stream) => SessionState::Connected(stream),
            Err(HandshakeError::WouldBlock(mid)) => SessionState::Handshaking(mid),
            Err(e) => {
                tracing::debug!(host, error = %describe(&e), "TLS handshake setup failed");
                return Err(NetError::TlsFailure);
            }
        };
        Ok(Self {
            state,
            host: host.to_string(),
        })
    }

    fn stream(&mut self) -> Result<&mut SslStream<BoxedIo>, NetError> {
        match &mut self.state {
            SessionState::Connected(stream) => Ok(stream),
            _ => Err(NetError::SocketNotConnected),
        }
    }
}

fn describe<S>(e: &HandshakeError<S>) -> String {
    match e {
        HandshakeError::SetupFailure(stack) => stack.to_string(),
        HandshakeError::Failure(mid) | HandshakeError::WouldBlock(mid) => mid.error().to_string(),
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted)
}

impl StreamPeer for BoringTlsSession {
    fn write_partial(&mut self, buf: &[u8]) -> Result<usize, NetError> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.stream()?.write(buf) {
            Ok(n) => Ok(n),
            Err(e) if is_transient(&e) => Ok(0),
            Err(e) => Err(NetError::from(e)),
        }
    }

    fn read_partial(&mut self, buf: &mut [u8]) -> Result<usize, NetError> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.stream()?.read(buf) {
            Ok(0) => Err(NetError::PeerEof),
            Ok(n) => Ok(n),
            Err(e) if is_transient(&e) => Ok(0),
            Err(e) => Err(NetError::from(e)),
        }
    }

    fn set_no_delay(&mut self, enabled: bool) -> Result<(), NetError> {
        self.stream()?.get_mut().get_mut().set_no_delay(enabled)
    }

    fn close(&mut self) {
        if let SessionState::Connected(stream) = &mut self.state {
            // Best effort close_notify; the transport goes away regardless.
            let _ = stream.shutdown();
            stream.get_mut().get_mut().close();
        }
        self.state = SessionState::Failed;
    }
}

impl TlsSession for BoringTlsSession {
    fn poll(&mut self) {
        let state = std::mem::replace(&mut self.state, SessionState::Failed);
        self.state = match state {
            SessionState::Handshaking(mid) => match mid.handshake() {
                Ok(stream) => {
                    tracing::debug!(host = %self.host, "TLS handshake complete");
                    SessionState::Connected(stream)
                }
                Err(HandshakeError::WouldBlock(mid)) => SessionState::Handshaking(mid),
                Err(e) => {
                    tracing::debug!(host = %self.host, error = %describe(&e), "TLS handshake failed");
                    SessionState::Failed
                }
            },
            other => other,
        };
    }

    fn status(&self) -> TlsStatus {
        match self.state {
            SessionState::Handshaking(_) => TlsStatus::Handshaking,
            SessionState::Connected(_) => TlsStatus::Connected,
            SessionState::Failed => TlsStatus::Error,
        }
    }

    fn into_stream(self: Box<Self>) -> Box<dyn StreamPeer> {
        self
    }
}
