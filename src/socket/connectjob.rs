use super::connector::Connector;
use super::stream::TransportStream;
use crate::base::neterror::NetError;
use std::collections::VecDeque;
use std::net::{IpAddr, SocketAddr};

/// Ordered connect candidates for one host.
/// Roughly equivalent to the address-list walk in net::TransportConnectJob.
#[derive(Debug, Default)]
pub struct CandidateList {
    addrs: VecDeque<IpAddr>,
    port: u16,
}

impl CandidateList {
    pub fn new(port: u16) -> Self {
        Self {
            addrs: VecDeque::new(),
            port,
        }
    }

    /// Replace the candidates, keeping their order.
    pub fn seed(&mut self, addrs: impl IntoIterator<Item = IpAddr>) {
        self.addrs = addrs.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.addrs.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Pop candidates front to back until one accepts a connect.
    ///
    /// Returns the fresh transport and the address it is connecting to.
    /// Candidates that fail to start are consumed; the list is left holding
    /// only the untried ones.
    pub fn connect_next(
        &mut self,
        connector: &dyn Connector,
    ) -> Result<(Box<dyn TransportStream>, SocketAddr), NetError> {
        while let Some(ip) = self.addrs.pop_front() {
            let addr = SocketAddr::new(ip, self.port);
            let mut transport = connector.new_transport();
            match transport.connect(addr) {
                Ok(()) => {
                    tracing::debug!(%addr, remaining = self.addrs.len(), "trying candidate");
                    return Ok((transport, addr));
                }
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "candidate rejected connect");
                }
            }
        }
        Err(NetError::ConnectFailed)
    }
}
