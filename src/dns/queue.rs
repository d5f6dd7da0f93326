//! Token-based lookup queue over an async [`Resolve`] backend.
//!
//! Each submitted hostname becomes a background task on a tokio runtime.
//! Callers poll the task's status through a [`LookupToken`] from a plain,
//! non-async loop. Successful lookups are cached per hostname, so a second
//! submission for the same host is `Done` immediately.

use super::resolve::{
    parse_ip_literal, AddressResolver, LookupToken, Name, Resolve, ResolverStatus,
};
use super::GaiResolver;
use crate::base::neterror::NetError;
use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

enum Lookup {
    /// The abort handle is filled in right after the task is spawned.
    Waiting(Option<AbortHandle>),
    Done(Vec<IpAddr>),
    Failed,
}

/// Pollable resolver running lookups on a tokio runtime.
///
/// # Example
///
/// ```rust,ignore
/// use wsdial::dns::{AddressResolver, QueuedResolver, ResolverStatus};
///
/// let resolver = QueuedResolver::new(runtime.handle().clone());
/// let token = resolver.submit("example.com")?;
/// while resolver.status(token) == ResolverStatus::Waiting {
///     // do other work
/// }
/// let addrs = resolver.addresses(token);
/// resolver.release(token);
/// ```
pub struct QueuedResolver {
    runtime: Handle,
    backend: Arc<dyn Resolve>,
    items: Arc<DashMap<LookupToken, Lookup>>,
    cache: Arc<DashMap<Box<str>, Vec<IpAddr>>>,
    next_id: AtomicU64,
}

impl QueuedResolver {
    /// Queue backed by the system resolver.
    pub fn new(runtime: Handle) -> Self {
        Self::with_backend(runtime, Arc::new(GaiResolver::new()))
    }

    pub fn with_backend(runtime: Handle, backend: Arc<dyn Resolve>) -> Self {
        Self {
            runtime,
            backend,
            items: Arc::new(DashMap::new()),
            cache: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Drop cached results for `host`, or for every host when `None`.
    pub fn clear_cache(&self, host: Option<&str>) {
        match host {
            Some(host) => {
                self.cache.remove(host);
            }
            None => self.cache.clear(),
        }
    }

    /// Number of lookups that have not been released yet.
    pub fn outstanding(&self) -> usize {
        self.items.len()
    }

    fn spawn_lookup(&self, token: LookupToken, host: &str) {
        let backend = Arc::clone(&self.backend);
        let items = Arc::clone(&self.items);
        let cache = Arc::clone(&self.cache);
        let host: Box<str> = host.into();

        let task = self.runtime.spawn(async move {
            let result = backend.resolve(Name::new(host.clone())).await;
            let outcome = match result {
                Ok(addrs) if !addrs.is_empty() => {
                    cache.insert(host, addrs.clone());
                    Lookup::Done(addrs)
                }
                Ok(_) | Err(_) => Lookup::Failed,
            };
            // A released token is gone from the map; its result is discarded.
            if let Some(mut item) = items.get_mut(&token) {
                *item = outcome;
            }
        });

        if let Some(mut item) = self.items.get_mut(&token) {
            if let Lookup::Waiting(slot) = item.value_mut() {
                *slot = Some(task.abort_handle());
            }
        }
    }
}

impl AddressResolver for QueuedResolver {
    fn submit(&self, host: &str) -> Result<LookupToken, NetError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(NetError::InvalidParameter);
        }

        let token = LookupToken(self.next_id.fetch_add(1, Ordering::Relaxed));

        if let Some(ip) = parse_ip_literal(host) {
            self.items.insert(token, Lookup::Done(vec![ip]));
            return Ok(token);
        }

        let cached = self.cache.get(host).map(|entry| entry.value().clone());
        if let Some(addrs) = cached {
            tracing::debug!(host, count = addrs.len(), "lookup answered from cache");
            self.items.insert(token, Lookup::Done(addrs));
            return Ok(token);
        }

        tracing::debug!(host, token = token.0, "queued hostname lookup");
        self.items.insert(token, Lookup::Waiting(None));
        self.spawn_lookup(token, host);
        Ok(token)
    }

    fn status(&self, token: LookupToken) -> ResolverStatus {
        match self.items.get(&token).as_deref() {
            Some(Lookup::Waiting(_)) => ResolverStatus::Waiting,
            Some(Lookup::Done(_)) => ResolverStatus::Done,
            Some(Lookup::Failed) | None => ResolverStatus::Error,
        }
    }

    fn addresses(&self, token: LookupToken) -> Vec<IpAddr> {
        match self.items.get(&token).as_deref() {
            Some(Lookup::Done(addrs)) => addrs.clone(),
            _ => Vec::new(),
        }
    }

    fn release(&self, token: LookupToken) {
        if let Some((_, Lookup::Waiting(Some(task)))) = self.items.remove(&token) {
            task.abort();
        }
    }
}
