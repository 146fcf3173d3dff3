//! Integration test: the on-disk workflow used by the CLI.
//!
//! Keys are sealed to files, sequence counters persist in a JSON store and
//! records travel through a shared routing directory, so several
//! "machines" can be simulated by pointing several `FsRouting` handles at
//! one root.

use std::sync::Arc;

use namesys::storage::{load_identity, read_summary, save_identity};
use namesys::{
    Context, FileSequenceStore, FsRouting, Identity, NamesysConfig, NamesysError, PointerPath,
    Publisher, Record, Resolver, RoutingSubstrate, SequenceStore, Validity,
};

fn path(s: &str) -> PointerPath {
    PointerPath::parse(s).expect("valid path")
}

fn publisher_at(root: &std::path::Path, peer: &str, sequence_file: &std::path::Path) -> Publisher {
    let config = NamesysConfig::default();
    Publisher::new(
        Arc::new(FsRouting::new(root, peer)),
        Arc::new(FileSequenceStore::new(sequence_file)),
        config.publisher,
    )
}

fn resolver_at(root: &std::path::Path, peer: &str) -> Resolver {
    Resolver::new(
        Arc::new(FsRouting::new(root, peer)),
        NamesysConfig::default().resolver,
    )
}

#[tokio::test]
async fn sealed_key_publish_and_resolve() {
    let home = tempfile::tempdir().unwrap();
    let key_path = home.path().join("keys").join("site.key");
    let routing_root = home.path().join("routing");
    let sequence_file = home.path().join("sequence.json");
    let ctx = Context::background();

    // ── Create and seal ─────────────────────────────────────────────────
    let identity = Identity::generate(Some("site".into()));
    save_identity(&identity, &key_path, "pass").unwrap();
    let summary = read_summary(&key_path).unwrap();
    assert_eq!(summary.name, identity.name());

    // ── Unlock and publish twice ────────────────────────────────────────
    let unlocked = load_identity(&key_path, "pass").unwrap();
    let publisher = publisher_at(&routing_root, "laptop", &sequence_file);
    publisher.publish(&unlocked, path("/ipfs/QmOne"), &ctx).await.unwrap();
    let record = publisher.publish(&unlocked, path("/ipfs/QmTwo"), &ctx).await.unwrap();
    assert_eq!(record.sequence(), 2);

    let store = FileSequenceStore::new(&sequence_file);
    assert_eq!(store.last_issued(&identity.name()).unwrap(), 2);

    // ── Anyone with the directory can resolve ───────────────────────────
    let value = resolver_at(&routing_root, "reader")
        .resolve(&summary.name, &ctx)
        .await
        .unwrap();
    assert_eq!(value.as_str(), "/ipfs/QmTwo");
}

#[tokio::test]
async fn second_machine_continues_the_sequence() {
    let shared = tempfile::tempdir().unwrap();
    let laptop_state = tempfile::tempdir().unwrap();
    let desktop_state = tempfile::tempdir().unwrap();
    let identity = Identity::generate(None);
    let ctx = Context::background();

    let laptop = publisher_at(shared.path(), "laptop", &laptop_state.path().join("seq.json"));
    for i in 0..3 {
        laptop
            .publish(&identity, path(&format!("/ipfs/QmLaptop{i}")), &ctx)
            .await
            .unwrap();
    }

    // The desktop has never published, yet must not regress.
    let desktop = publisher_at(shared.path(), "desktop", &desktop_state.path().join("seq.json"));
    let record = desktop
        .publish(&identity, path("/ipfs/QmDesktop"), &ctx)
        .await
        .unwrap();
    assert_eq!(record.sequence(), 4);

    let value = resolver_at(shared.path(), "reader")
        .resolve(&identity.name(), &ctx)
        .await
        .unwrap();
    assert_eq!(value.as_str(), "/ipfs/QmDesktop");
}

#[tokio::test]
async fn staged_forgery_and_garbage_are_ignored() {
    let root = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();
    let owner = Identity::generate(None);
    let forger = Identity::generate(None);
    let ctx = Context::background();

    publisher_at(root.path(), "owner", &state.path().join("seq.json"))
        .publish(&owner, path("/x/real"), &ctx)
        .await
        .unwrap();

    let routing = FsRouting::new(root.path(), "attacker");
    let key = owner.name().routing_key();
    let forged = Record::sign(&forger, path("/x/evil"), 99, Validity::NoExpiry).unwrap();
    routing.write_slot(&key, "attacker", &forged.encode().unwrap()).await.unwrap();
    routing.write_slot(&key, "noise", b"\x00\x01garbage").await.unwrap();

    let value = resolver_at(root.path(), "reader")
        .resolve(&owner.name(), &ctx)
        .await
        .unwrap();
    assert_eq!(value.as_str(), "/x/real");
}

#[tokio::test]
async fn garbage_is_not_found_but_empty_directory_is_incomplete() {
    let root = tempfile::tempdir().unwrap();
    let owner = Identity::generate(None);
    let routing = FsRouting::new(root.path(), "local");
    let key = owner.name().routing_key();
    routing.write_slot(&key, "junk", b"not a record").await.unwrap();

    // Only garbage: the peer answered but nothing verified.
    let err = resolver_at(root.path(), "reader")
        .resolve(&owner.name(), &Context::background())
        .await
        .unwrap_err();
    assert!(matches!(err, NamesysError::NotFound));

    // An empty key directory is an explicit presence signal.
    let other = Identity::generate(None);
    std::fs::create_dir_all(root.path().join(hex::encode(other.name().routing_key().as_bytes())))
        .unwrap();
    let err = resolver_at(root.path(), "reader")
        .resolve(&other.name(), &Context::background())
        .await
        .unwrap_err();
    assert!(matches!(err, NamesysError::SearchIncomplete));
}

#[tokio::test]
async fn put_through_trait_object() {
    let root = tempfile::tempdir().unwrap();
    let routing: Arc<dyn RoutingSubstrate> = Arc::new(FsRouting::new(root.path(), "local"));
    let owner = Identity::generate(None);
    let record = Record::sign(&owner, path("/x/direct"), 1, Validity::NoExpiry).unwrap();
    routing
        .put(&owner.name().routing_key(), record.encode().unwrap(), &Context::background())
        .await
        .unwrap();

    let resolver = Resolver::new(routing, NamesysConfig::default().resolver);
    let found = resolver
        .resolve_record(&owner.name(), &Context::background())
        .await
        .unwrap();
    assert_eq!(found, record);
}
