//! Resolution: find, verify and rank records for a name.
//!
//! A lookup consumes the substrate's event stream until it is exhausted,
//! enough valid candidates have been seen, or the context finishes.
//! Every blob is decoded, checked against the requested name and
//! verified; anything that fails is dropped silently. Survivors are
//! ranked with [`authority_cmp`](crate::record::authority_cmp).
//!
//! Failure classification:
//!
//! | situation                                   | error              |
//! |---------------------------------------------|--------------------|
//! | context done before any valid candidate     | `Timeout`          |
//! | no valid candidate, a peer signalled presence | `SearchIncomplete` |
//! | no valid candidate otherwise                | `NotFound`         |

use std::sync::Arc;

use futures::StreamExt;
use log::{debug, trace, warn};

use crate::config::ResolverConfig;
use crate::context::Context;
use crate::error::{NamesysError, Result};
use crate::identity::Name;
use crate::record::{Candidate, PointerPath, Record, Selection};
use crate::routing::{LookupEvent, PeerId, RoutingSubstrate};

/// Why a candidate blob was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Not a decodable record.
    Malformed,
    /// Signed by a key that does not fingerprint to the requested name.
    ForeignKey,
    /// Signature does not verify.
    BadSignature,
    /// Validity deadline has passed.
    Expired,
}

impl Rejection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::ForeignKey => "foreign key",
            Self::BadSignature => "bad signature",
            Self::Expired => "expired",
        }
    }
}

/// Decode and check one candidate blob found under `name`.
///
/// Pure and deterministic for a fixed `now_micros`; safe to call from any
/// thread.
pub fn check_candidate(
    name: &Name,
    bytes: &[u8],
    now_micros: u64,
) -> std::result::Result<Record, Rejection> {
    let record = Record::decode(bytes).map_err(|_| Rejection::Malformed)?;
    if !name.matches(record.public_key()) {
        return Err(Rejection::ForeignKey);
    }
    if !record.verify_signature() {
        return Err(Rejection::BadSignature);
    }
    if record.validity().is_expired_at(now_micros) {
        return Err(Rejection::Expired);
    }
    Ok(record)
}

/// One peer answer as seen by [`Resolver::inspect`].
#[derive(Debug, Clone)]
pub enum InspectedAnswer {
    Accepted { peer: PeerId, record: Record },
    Rejected { peer: PeerId, reason: Rejection },
    Presence { peer: PeerId },
    PeerFailed { peer: PeerId, error: String },
}

#[derive(Debug, Default)]
struct LookupTally {
    values: usize,
    rejected: usize,
    presence: usize,
    failed: usize,
}

/// Resolves names to pointer paths through a routing substrate.
#[derive(Clone)]
pub struct Resolver {
    routing: Arc<dyn RoutingSubstrate>,
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(routing: Arc<dyn RoutingSubstrate>, config: ResolverConfig) -> Self {
        Self { routing, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `name` to the value of its most authoritative valid record.
    pub async fn resolve(&self, name: &Name, ctx: &Context) -> Result<PointerPath> {
        self.resolve_record(name, ctx)
            .await
            .map(|record| record.value().clone())
    }

    /// Resolve `name` to its most authoritative valid record.
    ///
    /// `NotFound` and `SearchIncomplete` are retried per the configured
    /// policy while the context allows.
    pub async fn resolve_record(&self, name: &Name, ctx: &Context) -> Result<Record> {
        let policy = &self.config.retry;
        let mut attempt = 1;
        loop {
            let err = match self.lookup(name, ctx).await {
                Ok(candidate) => return Ok(candidate.record),
                Err(err) => err,
            };
            let retryable = matches!(
                err,
                NamesysError::NotFound | NamesysError::SearchIncomplete
            );
            if !retryable || attempt >= policy.max_attempts() {
                return Err(err);
            }
            attempt += 1;
            let backoff = policy.backoff_before(attempt);
            debug!("resolve {name}: {err}, retrying in {backoff:?} (attempt {attempt})");
            if ctx.sleep(backoff).await.is_err() {
                return Err(err);
            }
        }
    }

    /// One pass over the substrate.
    async fn lookup(&self, name: &Name, ctx: &Context) -> Result<Candidate> {
        if ctx.is_done() {
            return Err(NamesysError::Timeout);
        }

        let key = name.routing_key();
        let mut events = self.routing.get(&key, ctx);
        let mut selection = Selection::new();
        let mut tally = LookupTally::default();
        let limit = self.config.candidate_limit.max(1);

        let finished = loop {
            let event = tokio::select! {
                biased;
                _ = ctx.done() => break false,
                next = events.next() => next,
            };
            let Some(event) = event else {
                break true;
            };

            match event {
                LookupEvent::Value { peer, bytes } => {
                    tally.values += 1;
                    match check_candidate(name, &bytes, crate::time::now_micros()) {
                        Ok(record) => {
                            let sequence = record.sequence();
                            if selection.offer(Candidate::new(record, bytes)) {
                                trace!("{peer} raised {name} to sequence {sequence}");
                            }
                            if selection.accepted() >= limit {
                                break true;
                            }
                        }
                        Err(reason) => {
                            tally.rejected += 1;
                            debug!("discarding candidate for {name} from {peer}: {}", reason.as_str());
                        }
                    }
                }
                LookupEvent::Presence { peer } => {
                    tally.presence += 1;
                    trace!("{peer} holds {name} without a value");
                }
                LookupEvent::PeerFailed { peer, error } => {
                    tally.failed += 1;
                    warn!("peer {peer} failed during lookup of {name}: {error}");
                }
            }
        };
        // Abandon in-flight substrate work before classifying.
        drop(events);

        debug!(
            "lookup {name}: {} values, {} rejected, {} presence, {} failed peers",
            tally.values, tally.rejected, tally.presence, tally.failed
        );

        if let Some(best) = selection.into_best() {
            return Ok(best);
        }
        if !finished || ctx.is_done() {
            Err(NamesysError::Timeout)
        } else if tally.presence > 0 {
            Err(NamesysError::SearchIncomplete)
        } else {
            Err(NamesysError::NotFound)
        }
    }

    /// Highest sequence carrying a valid signature from the owner of
    /// `name`, expired or not. Used by the publisher to avoid regressing.
    ///
    /// Consumes the stream until it ends or the context finishes and
    /// reports whatever was observed by then.
    pub async fn observed_sequence(&self, name: &Name, ctx: &Context) -> Option<u64> {
        if ctx.is_done() {
            return None;
        }
        let key = name.routing_key();
        let mut events = self.routing.get(&key, ctx);
        let mut highest: Option<u64> = None;
        loop {
            let event = tokio::select! {
                biased;
                _ = ctx.done() => break,
                next = events.next() => next,
            };
            let Some(event) = event else { break };
            if let LookupEvent::Value { bytes, .. } = event {
                let Ok(record) = Record::decode(&bytes) else {
                    continue;
                };
                if name.matches(record.public_key()) && record.verify_signature() {
                    highest = highest.max(Some(record.sequence()));
                }
            }
        }
        highest
    }

    /// Report every answer for `name` with its classification. Diagnostic
    /// only; [`Resolver::resolve`] never exposes per-candidate outcomes.
    pub async fn inspect(&self, name: &Name, ctx: &Context) -> Vec<InspectedAnswer> {
        let key = name.routing_key();
        let mut events = self.routing.get(&key, ctx);
        let mut out = Vec::new();
        loop {
            let event = tokio::select! {
                biased;
                _ = ctx.done() => break,
                next = events.next() => next,
            };
            let Some(event) = event else { break };
            out.push(match event {
                LookupEvent::Value { peer, bytes } => {
                    match check_candidate(name, &bytes, crate::time::now_micros()) {
                        Ok(record) => InspectedAnswer::Accepted { peer, record },
                        Err(reason) => InspectedAnswer::Rejected { peer, reason },
                    }
                }
                LookupEvent::Presence { peer } => InspectedAnswer::Presence { peer },
                LookupEvent::PeerFailed { peer, error } => InspectedAnswer::PeerFailed {
                    peer,
                    error: error.to_string(),
                },
            });
        }
        out
    }
}
