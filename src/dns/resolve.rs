//! Core DNS resolution types and traits.
//!
//! Two layers live here:
//! - [`Resolve`]: an async backend that turns a [`Name`] into addresses.
//! - [`AddressResolver`]: the pollable, token-based queue the connection
//!   state machine talks to. It never blocks and never hands out futures.

use crate::base::neterror::NetError;
use std::{fmt, future::Future, net::IpAddr, pin::Pin, sync::Arc};

/// A domain name to resolve into IP addresses.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct Name {
    host: Box<str>,
}

impl Name {
    /// Creates a new [`Name`] from any string-like type.
    #[inline]
    pub fn new(host: impl Into<Box<str>>) -> Self {
        Self { host: host.into() }
    }

    /// View the hostname as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.host
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.host, f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.host, f)
    }
}

/// Alias for the `Future` type returned by a resolver backend.
pub type Resolving = Pin<Box<dyn Future<Output = Result<Vec<IpAddr>, NetError>> + Send>>;

/// Async lookup backend.
///
/// Implementations must be thread-safe; lookups are spawned onto a tokio
/// runtime by [`QueuedResolver`](super::QueuedResolver).
pub trait Resolve: Send + Sync {
    /// Resolves a domain name to IP addresses, in preference order.
    fn resolve(&self, name: Name) -> Resolving;
}

impl<R: Resolve + ?Sized> Resolve for Arc<R> {
    fn resolve(&self, name: Name) -> Resolving {
        (**self).resolve(name)
    }
}

/// Handle to a queued lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LookupToken(pub u64);

/// Progress of a queued lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverStatus {
    /// Still running.
    Waiting,
    /// Addresses are available through [`AddressResolver::addresses`].
    Done,
    /// The lookup failed or the token is unknown.
    Error,
}

/// Queued, pollable hostname resolution.
///
/// The connection state machine holds only a [`LookupToken`]; the resolver
/// itself is shared and its lifecycle is managed by the caller.
pub trait AddressResolver: Send + Sync {
    /// Queue a lookup. Fails with `InvalidParameter` for an unusable host.
    ///
    /// A lookup answered from cache is already `Done` when this returns.
    fn submit(&self, host: &str) -> Result<LookupToken, NetError>;

    fn status(&self, token: LookupToken) -> ResolverStatus;

    /// Resolved addresses, empty unless the lookup is `Done`.
    fn addresses(&self, token: LookupToken) -> Vec<IpAddr>;

    /// Forget the lookup, cancelling it if it is still running.
    fn release(&self, token: LookupToken);
}

impl<R: AddressResolver + ?Sized> AddressResolver for Arc<R> {
    fn submit(&self, host: &str) -> Result<LookupToken, NetError> {
        (**self).submit(host)
    }

    fn status(&self, token: LookupToken) -> ResolverStatus {
        (**self).status(token)
    }

    fn addresses(&self, token: LookupToken) -> Vec<IpAddr> {
        (**self).addresses(token)
    }

    fn release(&self, token: LookupToken) {
        (**self).release(token)
    }
}

/// Parse `host` as an IP literal, accepting bracketed IPv6 (`[::1]`).
pub fn parse_ip_literal(host: &str) -> Option<IpAddr> {
    let bare = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    bare.parse().ok()
}
