//! Stress test: many identities publish repeatedly on one shared network;
//! every name must resolve to its own latest pointer.

use std::sync::Arc;

use namesys::{
    Context, Identity, MemoryRouting, MemorySequenceStore, PointerPath, Publisher,
    PublisherConfig, Resolver, ResolverConfig,
};

const IDENTITIES: usize = 50;
const ROUNDS: u64 = 10;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stress_50_identities_10_rounds_each() {
    let routing = MemoryRouting::new(20);
    let publisher = Publisher::new(
        Arc::new(routing.clone()),
        Arc::new(MemorySequenceStore::new()),
        PublisherConfig::default(),
    );
    let identities: Vec<Arc<Identity>> = (0..IDENTITIES)
        .map(|i| Arc::new(Identity::generate(Some(format!("publisher-{i}")))))
        .collect();

    let mut tasks = Vec::new();
    for (i, identity) in identities.iter().enumerate() {
        let publisher = publisher.clone();
        let identity = Arc::clone(identity);
        tasks.push(tokio::spawn(async move {
            let ctx = Context::background();
            for round in 1..=ROUNDS {
                let value = PointerPath::parse(format!("/ipfs/Qm{i}/round-{round}")).unwrap();
                let record = publisher.publish(&identity, value, &ctx).await.unwrap();
                assert_eq!(record.sequence(), round, "identity {i} round {round}");
            }
        }));
    }
    for task in tasks {
        task.await.expect("publisher task panicked");
    }
    assert_eq!(routing.put_count(), IDENTITIES as u64 * ROUNDS);

    let resolver = Resolver::new(Arc::new(routing.clone()), ResolverConfig::default());
    let ctx = Context::background();
    for (i, identity) in identities.iter().enumerate() {
        let record = resolver.resolve_record(&identity.name(), &ctx).await.unwrap();
        assert_eq!(record.sequence(), ROUNDS);
        assert_eq!(record.value().as_str(), format!("/ipfs/Qm{i}/round-{ROUNDS}"));
    }
}

#[tokio::test]
async fn stress_names_are_unique() {
    let mut names: Vec<_> = (0..500).map(|_| Identity::generate(None).name()).collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 500);
}

#[tokio::test]
async fn stress_1000_sequential_publishes_single_identity() {
    let routing = MemoryRouting::with_options(5, 3, 5);
    let publisher = Publisher::new(
        Arc::new(routing.clone()),
        Arc::new(MemorySequenceStore::new()),
        PublisherConfig {
            trust_local_sequence: true,
            ..PublisherConfig::default()
        },
    );
    let identity = Identity::generate(None);
    let ctx = Context::background();

    let mut last = 0;
    for i in 0..1000 {
        let value = PointerPath::parse(format!("/x/{i}")).unwrap();
        let record = publisher.publish(&identity, value, &ctx).await.unwrap();
        assert!(record.sequence() > last, "sequence must strictly increase");
        last = record.sequence();
    }
    assert_eq!(last, 1000);

    let resolver = Resolver::new(Arc::new(routing), ResolverConfig::default());
    let value = resolver.resolve(&identity.name(), &ctx).await.unwrap();
    assert_eq!(value.as_str(), "/x/999");
}
