//! The routing substrate seam.
//!
//! namesys needs only two operations from the network: a best-effort
//! `put` of a blob under a key, and a lazy multi-value `get` that reports
//! what each peer holds as answers arrive. Peer discovery, replication and
//! storage policy belong to the implementation.
//!
//! # Implementations
//!
//! - [`memory`]: in-process multi-peer routing server for tests and
//!   simulations.
//! - [`fs`]: directory-backed substrate for local, multi-process use.

pub mod fs;
pub mod memory;

pub use fs::FsRouting;
pub use memory::MemoryRouting;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::context::Context;

/// Opaque key in the routing substrate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoutingKey(Vec<u8>);

impl RoutingKey {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keys are a readable `/namespace/` followed by binary; show the binary as hex.
        let split = match self.0.first() {
            Some(b'/') => self.0[1..].iter().position(|b| *b == b'/').map(|i| i + 1),
            _ => None,
        };
        match split {
            Some(split) if self.0[..=split].is_ascii() => write!(
                f,
                "{}{}",
                String::from_utf8_lossy(&self.0[..=split]),
                hex::encode(&self.0[split + 1..])
            ),
            _ => write!(f, "{}", hex::encode(&self.0)),
        }
    }
}

/// Identifier of a peer that answered a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(pub String);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Substrate-level failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    #[error("no reachable peers: {0}")]
    Unavailable(String),

    #[error("value rejected: {0}")]
    Rejected(String),

    #[error("routing operation timed out")]
    Timeout,

    #[error("routing IO error: {0}")]
    Io(String),
}

/// One answer arriving during a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupEvent {
    /// A peer returned a stored blob.
    Value { peer: PeerId, bytes: Vec<u8> },
    /// A peer is known to serve the key but returned no value.
    Presence { peer: PeerId },
    /// A peer could not be queried.
    PeerFailed { peer: PeerId, error: RoutingError },
}

/// Best-effort distributed put and multi-value get.
#[async_trait]
pub trait RoutingSubstrate: Send + Sync {
    /// Store `value` under `key`. Errors only on definite failure or when
    /// `ctx` finishes first.
    async fn put(&self, key: &RoutingKey, value: Vec<u8>, ctx: &Context)
        -> Result<(), RoutingError>;

    /// Lazily report what peers hold for `key`, in arrival order. The stream
    /// is finite, ends once `ctx` finishes, and may be dropped early.
    fn get<'a>(&'a self, key: &'a RoutingKey, ctx: &'a Context) -> BoxStream<'a, LookupEvent>;
}

#[async_trait]
impl<T: RoutingSubstrate + ?Sized> RoutingSubstrate for Arc<T> {
    async fn put(
        &self,
        key: &RoutingKey,
        value: Vec<u8>,
        ctx: &Context,
    ) -> Result<(), RoutingError> {
        (**self).put(key, value, ctx).await
    }

    fn get<'a>(&'a self, key: &'a RoutingKey, ctx: &'a Context) -> BoxStream<'a, LookupEvent> {
        (**self).get(key, ctx)
    }
}
