//! DNS Module Tests
//!
//! Covers:
//! - `Name` struct
//! - `QueuedResolver` token lifecycle using a MockResolver backend
//! - `GaiResolver` (Basic System Resolver)

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wsdial::base::neterror::NetError;
use wsdial::dns::{
    AddressResolver, GaiResolver, Name, QueuedResolver, Resolve, ResolverStatus, Resolving,
};

#[derive(Default)]
struct MockResolver {
    hosts: HashMap<String, Vec<IpAddr>>,
    /// Hosts whose lookup never completes.
    stalled: Vec<String>,
    calls: AtomicUsize,
}

impl MockResolver {
    fn with_host(host: &str, addrs: Vec<IpAddr>) -> Self {
        let mut hosts = HashMap::new();
        hosts.insert(host.to_string(), addrs);
        Self {
            hosts,
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Resolve for MockResolver {
    fn resolve(&self, name: Name) -> Resolving {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.stalled.iter().any(|h| h == name.as_str()) {
            return Box::pin(std::future::pending::<Result<Vec<IpAddr>, NetError>>());
        }
        let result = self
            .hosts
            .get(name.as_str())
            .cloned()
            .ok_or(NetError::NameNotResolved);
        Box::pin(async move { result })
    }
}

fn queued(backend: &Arc<MockResolver>) -> QueuedResolver {
    QueuedResolver::with_backend(tokio::runtime::Handle::current(), backend.clone())
}

async fn settle(resolver: &QueuedResolver, token: wsdial::dns::LookupToken) -> ResolverStatus {
    for _ in 0..100 {
        let status = resolver.status(token);
        if status != ResolverStatus::Waiting {
            return status;
        }
        tokio::task::yield_now().await;
    }
    resolver.status(token)
}

#[test]
fn test_name_api() {
    let name = Name::new("example.com");
    assert_eq!(name.as_str(), "example.com");
    assert_eq!(name.to_string(), "example.com");
}

#[tokio::test]
async fn test_ip_literal_is_done_immediately() {
    let backend = Arc::new(MockResolver::default());
    let resolver = queued(&backend);

    let token = resolver.submit("192.168.1.10").unwrap();
    assert_eq!(resolver.status(token), ResolverStatus::Done);
    assert_eq!(
        resolver.addresses(token),
        vec![IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10))]
    );

    let token = resolver.submit("[::1]").unwrap();
    assert_eq!(
        resolver.addresses(token),
        vec![IpAddr::V6(Ipv6Addr::LOCALHOST)]
    );
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_hostname_lookup_lifecycle() {
    let addrs = vec![
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
    ];
    let backend = Arc::new(MockResolver::with_host("example.test", addrs.clone()));
    let resolver = queued(&backend);

    let token = resolver.submit("example.test").unwrap();
    // The spawned task has not run yet on this single-threaded runtime.
    assert_eq!(resolver.status(token), ResolverStatus::Waiting);
    assert!(resolver.addresses(token).is_empty());

    assert_eq!(settle(&resolver, token).await, ResolverStatus::Done);
    assert_eq!(resolver.addresses(token), addrs);
    assert_eq!(resolver.outstanding(), 1);

    resolver.release(token);
    assert_eq!(resolver.outstanding(), 0);
    assert_eq!(resolver.status(token), ResolverStatus::Error);
}

#[tokio::test]
async fn test_results_are_cached() {
    let addrs = vec![IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))];
    let backend = Arc::new(MockResolver::with_host("cached.test", addrs.clone()));
    let resolver = queued(&backend);

    let first = resolver.submit("cached.test").unwrap();
    settle(&resolver, first).await;
    resolver.release(first);

    let second = resolver.submit("cached.test").unwrap();
    assert_ne!(first, second);
    assert_eq!(resolver.status(second), ResolverStatus::Done);
    assert_eq!(resolver.addresses(second), addrs);
    assert_eq!(backend.calls(), 1);

    resolver.clear_cache(Some("cached.test"));
    let third = resolver.submit("cached.test").unwrap();
    assert_eq!(resolver.status(third), ResolverStatus::Waiting);
    assert_eq!(settle(&resolver, third).await, ResolverStatus::Done);
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn test_failed_lookup_is_not_cached() {
    let backend = Arc::new(MockResolver::default());
    let resolver = queued(&backend);

    let token = resolver.submit("missing.test").unwrap();
    assert_eq!(settle(&resolver, token).await, ResolverStatus::Error);
    assert!(resolver.addresses(token).is_empty());

    let again = resolver.submit("missing.test").unwrap();
    assert_eq!(resolver.status(again), ResolverStatus::Waiting);
    settle(&resolver, again).await;
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn test_empty_host_is_rejected() {
    let backend = Arc::new(MockResolver::default());
    let resolver = queued(&backend);
    assert_eq!(resolver.submit(""), Err(NetError::InvalidParameter));
    assert_eq!(resolver.submit("   "), Err(NetError::InvalidParameter));
    assert_eq!(resolver.outstanding(), 0);
}

#[tokio::test]
async fn test_release_cancels_pending_lookup() {
    let backend = Arc::new(MockResolver {
        stalled: vec!["slow.test".to_string()],
        ..Default::default()
    });
    let resolver = queued(&backend);

    let token = resolver.submit("slow.test").unwrap();
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    assert_eq!(resolver.status(token), ResolverStatus::Waiting);
    assert_eq!(backend.calls(), 1);

    resolver.release(token);
    assert_eq!(resolver.outstanding(), 0);
    assert_eq!(resolver.status(token), ResolverStatus::Error);
}

#[tokio::test]
async fn test_gai_resolver_localhost() {
    let resolver = GaiResolver::new();
    let addrs = resolver.resolve(Name::new("127.0.0.1")).await.unwrap();
    assert_eq!(addrs, vec![IpAddr::V4(Ipv4Addr::LOCALHOST)]);
}
