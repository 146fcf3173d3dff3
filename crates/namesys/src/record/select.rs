//! Conflict resolution between valid candidates for one name.
//!
//! Highest sequence wins; equal sequences fall back to the latest
//! validity; a remaining tie is broken by the greater canonical encoding
//! so the same candidate set always yields the same winner.

use std::cmp::Ordering;

use super::record::Record;

/// A decoded, verified record together with the bytes it arrived as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub record: Record,
    pub encoded: Vec<u8>,
}

impl Candidate {
    pub fn new(record: Record, encoded: Vec<u8>) -> Self {
        Self { record, encoded }
    }
}

/// Total order on candidates: greater means more authoritative.
pub fn authority_cmp(a: &Candidate, b: &Candidate) -> Ordering {
    a.record
        .sequence()
        .cmp(&b.record.sequence())
        .then_with(|| a.record.validity().cmp(&b.record.validity()))
        .then_with(|| a.encoded.cmp(&b.encoded))
}

/// Running selection over candidates as they arrive.
///
/// The held winner only ever moves forward in [`authority_cmp`] order, so a
/// single resolution never goes backward relative to what it has observed.
#[derive(Debug, Default)]
pub struct Selection {
    best: Option<Candidate>,
    accepted: usize,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a valid candidate. Returns true if it became the new winner.
    pub fn offer(&mut self, candidate: Candidate) -> bool {
        self.accepted += 1;
        let replace = match &self.best {
            Some(best) => authority_cmp(&candidate, best) == Ordering::Greater,
            None => true,
        };
        if replace {
            self.best = Some(candidate);
        }
        replace
    }

    /// Number of valid candidates offered so far.
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.best.as_ref()
    }

    pub fn into_best(self) -> Option<Candidate> {
        self.best
    }
}

/// Pick the most authoritative candidate from a finished set.
pub fn select_best(candidates: impl IntoIterator<Item = Candidate>) -> Option<Candidate> {
    candidates.into_iter().max_by(authority_cmp)
}
