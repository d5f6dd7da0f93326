//! Factory for transports and TLS sessions.
//!
//! The connection state machine never names a concrete socket type; it asks
//! a [`Connector`] for a fresh transport per candidate and for a TLS session
//! once the transport is up.

use super::stream::TransportStream;
use super::tcp::TcpTransport;
use super::tls::{BoringTlsSession, TlsConfig, TlsOptions, TlsSession};
use crate::base::neterror::NetError;
use tokio::runtime::Handle;

pub trait Connector: Send + Sync {
    /// A transport that has not connected yet.
    fn new_transport(&self) -> Box<dyn TransportStream>;

    /// Wrap a connected transport and start a non-blocking TLS handshake.
    fn wrap_tls(
        &self,
        transport: Box<dyn TransportStream>,
        host: &str,
        options: &TlsOptions,
    ) -> Result<Box<dyn TlsSession>, NetError>;
}

/// TCP through tokio, TLS through BoringSSL.
#[derive(Debug, Clone)]
pub struct TokioConnector {
    runtime: Handle,
    tls: TlsConfig,
}

impl TokioConnector {
    pub fn new(runtime: Handle) -> Self {
        Self::with_tls_config(runtime, TlsConfig::default())
    }

    pub fn with_tls_config(runtime: Handle, tls: TlsConfig) -> Self {
        Self { runtime, tls }
    }

    pub fn tls_config(&self) -> &TlsConfig {
        &self.tls
    }
}

impl Connector for TokioConnector {
    fn new_transport(&self) -> Box<dyn TransportStream> {
        Box::new(TcpTransport::new(self.runtime.clone()))
    }

    fn wrap_tls(
        &self,
        transport: Box<dyn TransportStream>,
        host: &str,
        options: &TlsOptions,
    ) -> Result<Box<dyn TlsSession>, NetError> {
        let session = BoringTlsSession::connect(transport, host, &self.tls, options)?;
        Ok(Box::new(session))
    }
}
