//! In-process multi-peer routing server.
//!
//! Every `MemoryRouting` handle cloned from the same server sees the same
//! set of simulated peers. A `put` lands on the `replication` peers whose
//! id hash is XOR-closest to the key; a `get` queries every peer with
//! bounded concurrency and streams back one event per peer that holds
//! something, in the order the answers complete. Peers can be given
//! latency, made to fail, or seeded with arbitrary blobs.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};

use crate::context::Context;

use super::{LookupEvent, PeerId, RoutingError, RoutingKey, RoutingSubstrate};

/// Concurrent peer queries per lookup.
pub const DEFAULT_FANOUT: usize = 3;
/// Peers that receive each put.
pub const DEFAULT_REPLICATION: usize = 3;

#[derive(Debug)]
struct Peer {
    id: PeerId,
    id_hash: [u8; 32],
    records: HashMap<RoutingKey, Vec<u8>>,
    providing: HashSet<RoutingKey>,
    latency: Duration,
    failing: bool,
}

impl Peer {
    fn new(index: usize) -> Self {
        let id = PeerId(format!("peer-{index}"));
        let id_hash = Sha256::digest(id.0.as_bytes()).into();
        Self {
            id,
            id_hash,
            records: HashMap::new(),
            providing: HashSet::new(),
            latency: Duration::ZERO,
            failing: false,
        }
    }

    fn distance(&self, key_hash: &[u8; 32]) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = self.id_hash[i] ^ key_hash[i];
        }
        out
    }
}

/// What one peer would answer, captured under the lock.
struct PeerAnswer {
    peer: PeerId,
    latency: Duration,
    event: Option<LookupEvent>,
}

#[derive(Debug)]
struct Server {
    peers: RwLock<Vec<Peer>>,
    replication: usize,
    fanout: usize,
    puts: AtomicU64,
}

/// Shared handle to an in-memory routing server.
#[derive(Debug, Clone)]
pub struct MemoryRouting {
    server: Arc<Server>,
}

impl MemoryRouting {
    /// Create a server with `peer_count` peers and default replication and
    /// fan-out.
    pub fn new(peer_count: usize) -> Self {
        Self::with_options(peer_count, DEFAULT_REPLICATION, DEFAULT_FANOUT)
    }

    pub fn with_options(peer_count: usize, replication: usize, fanout: usize) -> Self {
        let peers = (0..peer_count).map(Peer::new).collect();
        Self {
            server: Arc::new(Server {
                peers: RwLock::new(peers),
                replication: replication.max(1),
                fanout: fanout.max(1),
                puts: AtomicU64::new(0),
            }),
        }
    }

    pub fn peer_count(&self) -> usize {
        self.server.peers.read().len()
    }

    /// Number of successful puts served.
    pub fn put_count(&self) -> u64 {
        self.server.puts.load(Ordering::Relaxed)
    }

    /// Simulated response time of one peer.
    pub fn set_latency(&self, peer: usize, latency: Duration) {
        if let Some(p) = self.server.peers.write().get_mut(peer) {
            p.latency = latency;
        }
    }

    /// Make one peer refuse stores and fail lookups.
    pub fn set_failing(&self, peer: usize, failing: bool) {
        if let Some(p) = self.server.peers.write().get_mut(peer) {
            p.failing = failing;
        }
    }

    /// Place a raw blob on one peer, bypassing replication. Used to seed
    /// stale, forged or malformed candidates.
    pub fn inject(&self, peer: usize, key: &RoutingKey, bytes: Vec<u8>) {
        if let Some(p) = self.server.peers.write().get_mut(peer) {
            p.records.insert(key.clone(), bytes);
        }
    }

    /// Mark a peer as serving `key` without holding a value for it.
    pub fn announce(&self, peer: usize, key: &RoutingKey) {
        if let Some(p) = self.server.peers.write().get_mut(peer) {
            p.providing.insert(key.clone());
        }
    }

    /// Drop every stored value and announcement for `key`.
    pub fn forget(&self, key: &RoutingKey) {
        for p in self.server.peers.write().iter_mut() {
            p.records.remove(key);
            p.providing.remove(key);
        }
    }

    /// All distinct blobs currently stored under `key`.
    pub fn values(&self, key: &RoutingKey) -> Vec<Vec<u8>> {
        let mut out: Vec<Vec<u8>> = Vec::new();
        for p in self.server.peers.read().iter() {
            if let Some(v) = p.records.get(key) {
                if !out.contains(v) {
                    out.push(v.clone());
                }
            }
        }
        out
    }

    /// Indices of the peers currently holding a value for `key`.
    pub fn holders(&self, key: &RoutingKey) -> Vec<usize> {
        self.server
            .peers
            .read()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.records.contains_key(key))
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices of the healthy peers closest to `key`.
    fn closest_peers(&self, key: &RoutingKey) -> Vec<usize> {
        let key_hash: [u8; 32] = Sha256::digest(key.as_bytes()).into();
        let peers = self.server.peers.read();
        let mut ranked: Vec<(usize, [u8; 32])> = peers
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.failing)
            .map(|(i, p)| (i, p.distance(&key_hash)))
            .collect();
        ranked.sort_by(|a, b| a.1.cmp(&b.1));
        ranked
            .into_iter()
            .take(self.server.replication)
            .map(|(i, _)| i)
            .collect()
    }

    fn snapshot(&self, key: &RoutingKey) -> Vec<PeerAnswer> {
        self.server
            .peers
            .read()
            .iter()
            .map(|p| {
                let event = if p.failing {
                    Some(LookupEvent::PeerFailed {
                        peer: p.id.clone(),
                        error: RoutingError::Unavailable(format!("{} unreachable", p.id)),
                    })
                } else if let Some(bytes) = p.records.get(key) {
                    Some(LookupEvent::Value {
                        peer: p.id.clone(),
                        bytes: bytes.clone(),
                    })
                } else if p.providing.contains(key) {
                    Some(LookupEvent::Presence { peer: p.id.clone() })
                } else {
                    None
                };
                PeerAnswer {
                    peer: p.id.clone(),
                    latency: p.latency,
                    event,
                }
            })
            .collect()
    }
}

#[async_trait]
impl RoutingSubstrate for MemoryRouting {
    async fn put(
        &self,
        key: &RoutingKey,
        value: Vec<u8>,
        ctx: &Context,
    ) -> Result<(), RoutingError> {
        if ctx.is_done() {
            return Err(RoutingError::Timeout);
        }
        let targets = self.closest_peers(key);
        if targets.is_empty() {
            return Err(RoutingError::Unavailable(format!("no healthy peers for {key}")));
        }

        let slowest = {
            let peers = self.server.peers.read();
            targets
                .iter()
                .filter_map(|i| peers.get(*i).map(|p| p.latency))
                .max()
                .unwrap_or_default()
        };
        if !slowest.is_zero() && ctx.sleep(slowest).await.is_err() {
            return Err(RoutingError::Timeout);
        }

        {
            let mut peers = self.server.peers.write();
            for i in &targets {
                if let Some(p) = peers.get_mut(*i) {
                    p.records.insert(key.clone(), value.clone());
                }
            }
        }
        self.server.puts.fetch_add(1, Ordering::Relaxed);
        log::debug!("stored {} bytes under {key} on {} peers", value.len(), targets.len());
        Ok(())
    }

    fn get<'a>(&'a self, key: &'a RoutingKey, ctx: &'a Context) -> BoxStream<'a, LookupEvent> {
        let answers = self.snapshot(key);
        stream::iter(answers)
            .map(|answer| async move {
                if !answer.latency.is_zero() {
                    tokio::time::sleep(answer.latency).await;
                }
                log::trace!("{} answered lookup", answer.peer);
                answer.event
            })
            .buffer_unordered(self.server.fanout)
            .filter_map(futures::future::ready)
            .take_until(Box::pin(ctx.done()))
            .boxed()
    }
}
