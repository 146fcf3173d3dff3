//! Integration test: publish and resolve over a shared in-memory network.
//!
//! Covers the complete lifecycle:
//! 1. Create an identity and derive its name
//! 2. Publish two successive pointers
//! 3. Plant a forged high-sequence record under the same key
//! 4. Resolve from an independent resolver
//! 5. Lose local publisher state and keep publishing

use std::sync::Arc;
use std::time::Duration;

use namesys::{
    Context, Identity, MemoryRouting, MemorySequenceStore, NamesysError, PointerPath, Publisher,
    PublisherConfig, Record, Resolver, ResolverConfig, Validity,
};

fn path(s: &str) -> PointerPath {
    PointerPath::parse(s).expect("valid path")
}

fn publisher(routing: &MemoryRouting) -> Publisher {
    Publisher::new(
        Arc::new(routing.clone()),
        Arc::new(MemorySequenceStore::new()),
        PublisherConfig::default(),
    )
}

fn resolver(routing: &MemoryRouting) -> Resolver {
    Resolver::new(Arc::new(routing.clone()), ResolverConfig::default())
}

#[tokio::test]
async fn full_publish_resolve_with_forgery() {
    let routing = MemoryRouting::new(8);
    let ctx = Context::with_timeout(Duration::from_secs(10));

    // ── Step 1: Identity ────────────────────────────────────────────────
    let owner = Identity::generate(Some("site".into()));
    let name = owner.name();
    assert!(name.to_string().starts_with("Qm"));
    assert_eq!(name.to_string().len(), 46);

    // ── Step 2: Publish /x/a then /x/b ──────────────────────────────────
    let site = publisher(&routing);
    let first = site.publish(&owner, path("/x/a"), &ctx).await.unwrap();
    let second = site.publish(&owner, path("/x/b"), &ctx).await.unwrap();
    assert_eq!(first.sequence(), 1);
    assert_eq!(second.sequence(), 2);

    // ── Step 3: Forgery at a much higher sequence ───────────────────────
    let forger = Identity::generate(Some("mallory".into()));
    let forged = Record::sign(&forger, path("/x/evil"), 10, Validity::NoExpiry).unwrap();
    let key = name.routing_key();
    let holders = routing.holders(&key);
    let outsider = (0..routing.peer_count())
        .find(|i| !holders.contains(i))
        .expect("more peers than replicas");
    routing.inject(outsider, &key, forged.encode().unwrap());
    assert_eq!(routing.values(&key).len(), 2);

    // ── Step 4: Independent resolver sees /x/b ──────────────────────────
    let value = resolver(&routing).resolve(&name, &ctx).await.unwrap();
    assert_eq!(value.as_str(), "/x/b");

    let record = resolver(&routing).resolve_record(&name, &ctx).await.unwrap();
    assert_eq!(record.sequence(), 2);
    assert!(name.matches(record.public_key()));

    // ── Step 5: Fresh publisher state still moves forward ───────────────
    let third = publisher(&routing)
        .publish(&owner, path("/x/c"), &ctx)
        .await
        .unwrap();
    assert_eq!(third.sequence(), 3);
    let value = resolver(&routing).resolve(&name, &ctx).await.unwrap();
    assert_eq!(value.as_str(), "/x/c");
}

#[tokio::test]
async fn names_are_independent() {
    let routing = MemoryRouting::new(6);
    let ctx = Context::background();
    let alice = Identity::generate(Some("alice".into()));
    let bob = Identity::generate(Some("bob".into()));
    let publisher = publisher(&routing);

    publisher.publish(&alice, path("/ipfs/QmAlice"), &ctx).await.unwrap();
    publisher.publish(&bob, path("/ipfs/QmBob"), &ctx).await.unwrap();
    publisher.publish(&bob, path("/ipfs/QmBob2"), &ctx).await.unwrap();

    let resolver = resolver(&routing);
    assert_eq!(
        resolver.resolve(&alice.name(), &ctx).await.unwrap().as_str(),
        "/ipfs/QmAlice"
    );
    let bob_record = resolver.resolve_record(&bob.name(), &ctx).await.unwrap();
    assert_eq!(bob_record.value().as_str(), "/ipfs/QmBob2");
    assert_eq!(bob_record.sequence(), 2);
}

#[tokio::test]
async fn unpublished_name_is_not_found() {
    let routing = MemoryRouting::new(4);
    let stranger = Identity::generate(None);
    let err = resolver(&routing)
        .resolve(&stranger.name(), &Context::background())
        .await
        .unwrap_err();
    assert!(matches!(err, NamesysError::NotFound));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn expired_publication_stops_resolving() {
    let routing = MemoryRouting::new(4);
    let owner = Identity::generate(None);
    let ctx = Context::background();

    publisher(&routing)
        .publish_with_validity(&owner, path("/x/short"), Validity::Eol(1), &ctx)
        .await
        .unwrap();
    let err = resolver(&routing).resolve(&owner.name(), &ctx).await.unwrap_err();
    assert!(matches!(err, NamesysError::NotFound));

    // The expired record still counts toward the sequence.
    let next = publisher(&routing)
        .publish(&owner, path("/x/live"), &ctx)
        .await
        .unwrap();
    assert_eq!(next.sequence(), 2);
    assert_eq!(
        resolver(&routing).resolve(&owner.name(), &ctx).await.unwrap().as_str(),
        "/x/live"
    );
}

#[tokio::test]
async fn name_text_form_roundtrips_through_resolution() {
    let routing = MemoryRouting::new(4);
    let owner = Identity::generate(None);
    let ctx = Context::background();
    publisher(&routing).publish(&owner, path("/x/a"), &ctx).await.unwrap();

    let parsed: namesys::Name = owner.name().to_path_string().parse().unwrap();
    assert_eq!(parsed, owner.name());
    assert_eq!(resolver(&routing).resolve(&parsed, &ctx).await.unwrap().as_str(), "/x/a");
}
