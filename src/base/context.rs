//! Ergonomic error context helpers.
//!
//! Provides an extension trait for converting IO errors from transport
//! primitives into `NetError` variants, logging the failing operation.

use crate::base::neterror::NetError;
use std::io;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Convert an IO error raised while talking to a peer.
    ///
    /// # Example
    /// ```ignore
    /// use wsdial::base::context::IoResultExt;
    ///
    /// let n = stream.read(&mut buf).transport_context("read", addr)?;
    /// // debug log: "read on 127.0.0.1:8080 failed: connection reset"
    /// ```
    fn transport_context(self, op: &str, addr: impl std::fmt::Display) -> Result<T, NetError>;

    /// Convert an IO error raised while resolving `domain`.
    fn dns_context(self, domain: &str) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn transport_context(self, op: &str, addr: impl std::fmt::Display) -> Result<T, NetError> {
        self.map_err(|e| {
            tracing::debug!(op, addr = %addr, error = %e, "transport operation failed");
            NetError::from(e)
        })
    }

    fn dns_context(self, domain: &str) -> Result<T, NetError> {
        self.map_err(|e| {
            tracing::debug!(domain, error = %e, "name resolution failed");
            NetError::NameNotResolved
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_transport_context() {
        let result: Result<(), io::Error> = Err(Error::new(ErrorKind::ConnectionReset, "reset"));
        let err = result.transport_context("read", "127.0.0.1:80").unwrap_err();
        assert_eq!(err, NetError::TransportError(ErrorKind::ConnectionReset));
    }

    #[test]
    fn test_transport_context_eof() {
        let result: Result<(), io::Error> = Err(Error::new(ErrorKind::UnexpectedEof, "eof"));
        let err = result.transport_context("read", "127.0.0.1:80").unwrap_err();
        assert_eq!(err, NetError::PeerEof);
    }

    #[test]
    fn test_dns_context() {
        let result: Result<(), io::Error> = Err(Error::new(ErrorKind::NotFound, "no such host"));
        let err = result.dns_context("unknown.example.com").unwrap_err();
        assert_eq!(err, NetError::NameNotResolved);
    }
}
