//! DNS Resolution Module
//!
//! Provides pluggable, pollable DNS resolution:
//! - [`AddressResolver`]: the token/status interface used by the connection
//!   state machine
//! - [`QueuedResolver`]: runs lookups as tokio tasks and caches results
//! - [`GaiResolver`] / [`HickoryResolver`]: async lookup backends
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wsdial::dns::{HickoryResolver, QueuedResolver};
//!
//! let resolver = QueuedResolver::with_backend(handle, Arc::new(HickoryResolver::new()));
//! ```

mod gai;
mod hickory;
mod queue;
mod resolve;

pub use gai::GaiResolver;
pub use hickory::HickoryResolver;
pub use queue::QueuedResolver;
pub use resolve::{
    parse_ip_literal, AddressResolver, LookupToken, Name, Resolve, ResolverStatus, Resolving,
};
