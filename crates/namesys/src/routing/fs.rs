//! Directory-backed routing substrate.
//!
//! Each key maps to a directory named by the hex of the key; every node
//! sharing the root writes its own slot file inside it, so several
//! processes (or a synced folder) behave like a small set of peers.
//!
//! ```text
//! {root}/
//! └── {hex(key)}/
//!     ├── {peer}.rec
//!     └── {other-peer}.rec
//! ```
//!
//! An existing key directory with no readable slots counts as presence.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use crate::context::Context;
use crate::record::MAX_RECORD_BYTES;

use super::{LookupEvent, PeerId, RoutingError, RoutingKey, RoutingSubstrate};

const SLOT_EXTENSION: &str = "rec";

/// A routing substrate stored under one directory.
#[derive(Debug, Clone)]
pub struct FsRouting {
    root: PathBuf,
    peer: PeerId,
}

impl FsRouting {
    /// Open (lazily creating) a substrate rooted at `root`, writing as `peer`.
    pub fn new(root: impl Into<PathBuf>, peer: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            peer: PeerId(peer.into()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn peer(&self) -> &PeerId {
        &self.peer
    }

    fn key_dir(&self, key: &RoutingKey) -> PathBuf {
        self.root.join(hex::encode(key.as_bytes()))
    }

    fn slot_path(&self, key: &RoutingKey, peer: &str) -> PathBuf {
        self.key_dir(key).join(format!("{peer}.{SLOT_EXTENSION}"))
    }

    /// Write `bytes` into another peer's slot. Used to stage candidates from
    /// elsewhere.
    pub async fn write_slot(
        &self,
        key: &RoutingKey,
        peer: &str,
        bytes: &[u8],
    ) -> Result<(), RoutingError> {
        check_label(peer)?;
        write_atomic(&self.slot_path(key, peer), bytes).await
    }

    /// Read every slot for `key`, sorted by peer label.
    async fn read_slots(&self, key: &RoutingKey) -> Result<Option<Vec<LookupEvent>>, RoutingError> {
        let dir = self.key_dir(key);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RoutingError::Io(e.to_string())),
        };

        let mut slots = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RoutingError::Io(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SLOT_EXTENSION) {
                continue;
            }
            let Some(label) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            slots.push((label.to_string(), path));
        }
        slots.sort();

        let mut events = Vec::with_capacity(slots.len());
        for (label, path) in slots {
            let peer = PeerId(label);
            let event = match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.len() > MAX_RECORD_BYTES as u64 => LookupEvent::PeerFailed {
                    peer,
                    error: RoutingError::Rejected(format!("{} bytes is oversized", meta.len())),
                },
                Ok(_) => match tokio::fs::read(&path).await {
                    Ok(bytes) => LookupEvent::Value { peer, bytes },
                    Err(e) => LookupEvent::PeerFailed {
                        peer,
                        error: RoutingError::Io(e.to_string()),
                    },
                },
                Err(e) => LookupEvent::PeerFailed {
                    peer,
                    error: RoutingError::Io(e.to_string()),
                },
            };
            events.push(event);
        }
        Ok(Some(events))
    }
}

#[async_trait]
impl RoutingSubstrate for FsRouting {
    async fn put(
        &self,
        key: &RoutingKey,
        value: Vec<u8>,
        ctx: &Context,
    ) -> Result<(), RoutingError> {
        if ctx.is_done() {
            return Err(RoutingError::Timeout);
        }
        if value.len() > MAX_RECORD_BYTES {
            return Err(RoutingError::Rejected(format!(
                "{} bytes exceeds limit of {MAX_RECORD_BYTES}",
                value.len()
            )));
        }
        check_label(&self.peer.0)?;
        let path = self.slot_path(key, &self.peer.0);
        tokio::select! {
            biased;
            _ = ctx.done() => Err(RoutingError::Timeout),
            res = write_atomic(&path, &value) => res,
        }
    }

    fn get<'a>(&'a self, key: &'a RoutingKey, ctx: &'a Context) -> BoxStream<'a, LookupEvent> {
        let peer = self.peer.clone();
        stream::once(async move {
            match self.read_slots(key).await {
                Ok(Some(events)) if events.is_empty() => vec![LookupEvent::Presence { peer }],
                Ok(Some(events)) => events,
                Ok(None) => Vec::new(),
                Err(error) => vec![LookupEvent::PeerFailed { peer, error }],
            }
        })
        .flat_map(stream::iter)
        .take_until(Box::pin(ctx.done()))
        .boxed()
    }
}

/// Peer labels become file names; keep them to a single plain component.
fn check_label(peer: &str) -> Result<(), RoutingError> {
    if peer.is_empty() || peer.contains(['/', '\\', '.']) {
        return Err(RoutingError::Rejected(format!("invalid peer label {peer:?}")));
    }
    Ok(())
}

/// Write via a sibling temp file and rename so readers never see a partial
/// slot.
async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), RoutingError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| RoutingError::Io(e.to_string()))?;
    }
    let tmp_path = path.with_extension(format!("{SLOT_EXTENSION}.tmp"));
    tokio::fs::write(&tmp_path, data)
        .await
        .map_err(|e| RoutingError::Io(e.to_string()))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| RoutingError::Io(e.to_string()))
}
