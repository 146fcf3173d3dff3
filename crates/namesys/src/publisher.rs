//! Publishing: sign a new record for an identity and push it to the
//! routing substrate.
//!
//! Each attempt runs the full cycle: look up the highest sequence the
//! network has seen for the name, take the maximum with the local counter,
//! sign `max + 1`, put. A retry never resends a previously signed record.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::{PublisherConfig, ResolverConfig};
use crate::context::Context;
use crate::error::{NamesysError, Result};
use crate::identity::Identity;
use crate::record::{PointerPath, Record, Validity};
use crate::resolver::Resolver;
use crate::routing::RoutingSubstrate;
use crate::storage::SequenceStore;

/// Publishes records for identities through a routing substrate.
#[derive(Clone)]
pub struct Publisher {
    routing: Arc<dyn RoutingSubstrate>,
    resolver: Resolver,
    sequences: Arc<dyn SequenceStore>,
    config: PublisherConfig,
}

impl Publisher {
    /// Create a publisher that looks up sequences with a default resolver
    /// over the same substrate.
    pub fn new(
        routing: Arc<dyn RoutingSubstrate>,
        sequences: Arc<dyn SequenceStore>,
        config: PublisherConfig,
    ) -> Self {
        let resolver = Resolver::new(Arc::clone(&routing), ResolverConfig::default());
        Self::with_resolver(routing, resolver, sequences, config)
    }

    pub fn with_resolver(
        routing: Arc<dyn RoutingSubstrate>,
        resolver: Resolver,
        sequences: Arc<dyn SequenceStore>,
        config: PublisherConfig,
    ) -> Self {
        Self {
            routing,
            resolver,
            sequences,
            config,
        }
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Validity for a record issued now under the configured lifetime.
    pub fn default_validity(&self) -> Validity {
        match self.config.record_lifetime {
            Some(lifetime) => Validity::Eol(crate::time::add_duration(
                crate::time::now_micros(),
                lifetime,
            )),
            None => Validity::NoExpiry,
        }
    }

    /// Publish `value` under `identity`'s name with the configured lifetime.
    pub async fn publish(
        &self,
        identity: &Identity,
        value: PointerPath,
        ctx: &Context,
    ) -> Result<Record> {
        let validity = self.default_validity();
        self.publish_with_validity(identity, value, validity, ctx).await
    }

    /// Publish `value` with an explicit validity.
    pub async fn publish_with_validity(
        &self,
        identity: &Identity,
        value: PointerPath,
        validity: Validity,
        ctx: &Context,
    ) -> Result<Record> {
        let policy = &self.config.retry;
        let mut attempt = 1;
        loop {
            let err = match self.attempt(identity, &value, validity, ctx).await {
                Ok(record) => return Ok(record),
                Err(err) => err,
            };
            if !matches!(err, NamesysError::Publish { .. }) || attempt >= policy.max_attempts() {
                return Err(err);
            }
            attempt += 1;
            let backoff = policy.backoff_before(attempt);
            warn!(
                "publish for {} failed: {err}; retrying in {backoff:?} (attempt {attempt})",
                identity.name()
            );
            if ctx.sleep(backoff).await.is_err() {
                return Err(err);
            }
        }
    }

    async fn attempt(
        &self,
        identity: &Identity,
        value: &PointerPath,
        validity: Validity,
        ctx: &Context,
    ) -> Result<Record> {
        let name = identity.name();
        let sequence = self.next_sequence(identity, ctx).await?;
        let record = Record::sign(identity, value.clone(), sequence, validity)?;
        let encoded = record
            .encode()
            .map_err(|e| NamesysError::Signing(e.to_string()))?;

        self.routing
            .put(&name.routing_key(), encoded, ctx)
            .await
            .map_err(|cause| NamesysError::Publish { cause })?;

        // The record is live; a lost counter is recovered from the network
        // on the next publish.
        if let Err(e) = self.sequences.record_issued(&name, sequence) {
            warn!("{name}: published sequence {sequence} but could not record it locally: {e}");
        }
        info!("published {name} -> {value} (sequence {sequence}, {validity})");
        Ok(record)
    }

    /// `max(local, observed) + 1`. The network lookup is bounded by
    /// `lookup_timeout` and its failure leaves the local counter in charge.
    pub async fn next_sequence(&self, identity: &Identity, ctx: &Context) -> Result<u64> {
        let name = identity.name();
        let local = self.sequences.last_issued(&name)?;

        let observed = if self.config.trust_local_sequence {
            None
        } else {
            let lookup_ctx = ctx.child_with_timeout(self.config.lookup_timeout);
            self.resolver.observed_sequence(&name, &lookup_ctx).await
        };
        match observed {
            Some(seen) if seen > local => {
                debug!("{name}: network holds sequence {seen}, local counter at {local}")
            }
            None => debug!("{name}: no sequence observed, using local counter {local}"),
            _ => {}
        }

        local
            .max(observed.unwrap_or(0))
            .checked_add(1)
            .ok_or_else(|| NamesysError::Signing("sequence space exhausted".into()))
    }
}
