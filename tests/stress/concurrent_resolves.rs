//! Stress test: many concurrent resolvers over one shared network while a
//! publisher keeps moving the name forward. No resolve may go backward
//! relative to what it observed before it started.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use namesys::{
    Context, Identity, MemoryRouting, MemorySequenceStore, NamesysError, PointerPath, Publisher,
    PublisherConfig, Resolver, ResolverConfig,
};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stress_100_concurrent_resolves_same_name() {
    let routing = MemoryRouting::new(10);
    let owner = Identity::generate(None);
    let publisher = Publisher::new(
        Arc::new(routing.clone()),
        Arc::new(MemorySequenceStore::new()),
        PublisherConfig::default(),
    );
    let ctx = Context::background();
    publisher
        .publish(&owner, PointerPath::parse("/x/stable").unwrap(), &ctx)
        .await
        .unwrap();

    let resolver = Resolver::new(Arc::new(routing.clone()), ResolverConfig::default());
    let name = owner.name();
    let mut tasks = Vec::new();
    for _ in 0..100 {
        let resolver = resolver.clone();
        tasks.push(tokio::spawn(async move {
            resolver.resolve(&name, &Context::background()).await
        }));
    }
    for task in tasks {
        let value = task.await.unwrap().unwrap();
        assert_eq!(value.as_str(), "/x/stable");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stress_resolves_never_regress_during_publishing() {
    let routing = MemoryRouting::new(6);
    let owner = Arc::new(Identity::generate(None));
    let publisher = Publisher::new(
        Arc::new(routing.clone()),
        Arc::new(MemorySequenceStore::new()),
        PublisherConfig::default(),
    );
    let published = Arc::new(AtomicU64::new(0));

    let writer = {
        let owner = Arc::clone(&owner);
        let published = Arc::clone(&published);
        tokio::spawn(async move {
            let ctx = Context::background();
            for i in 1..=50u64 {
                let value = PointerPath::parse(format!("/x/{i}")).unwrap();
                let record = publisher.publish(&owner, value, &ctx).await.unwrap();
                published.store(record.sequence(), Ordering::SeqCst);
                tokio::task::yield_now().await;
            }
        })
    };

    let resolver = Resolver::new(Arc::new(routing.clone()), ResolverConfig::default());
    let mut readers = Vec::new();
    for _ in 0..8 {
        let resolver = resolver.clone();
        let published = Arc::clone(&published);
        let name = owner.name();
        readers.push(tokio::spawn(async move {
            for _ in 0..50 {
                let floor = published.load(Ordering::SeqCst);
                match resolver.resolve_record(&name, &Context::background()).await {
                    Ok(record) => assert!(
                        record.sequence() >= floor,
                        "resolved {} after {} was published",
                        record.sequence(),
                        floor
                    ),
                    Err(NamesysError::NotFound) => assert_eq!(floor, 0),
                    Err(e) => panic!("unexpected error: {e}"),
                }
                tokio::task::yield_now().await;
            }
        }));
    }

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn stress_cancellation_is_prompt_with_slow_peers() {
    let routing = MemoryRouting::with_options(30, 3, 30);
    let owner = Identity::generate(None);
    for peer in 0..30 {
        routing.set_latency(peer, Duration::from_secs(3600));
    }
    let resolver = Resolver::new(Arc::new(routing), ResolverConfig::default());

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let resolver = resolver.clone();
        let name = owner.name();
        tasks.push(tokio::spawn(async move {
            let ctx = Context::with_timeout(Duration::from_millis(200));
            let started = tokio::time::Instant::now();
            let err = resolver.resolve(&name, &ctx).await.unwrap_err();
            (err, started.elapsed())
        }));
    }
    for task in tasks {
        let (err, elapsed) = task.await.unwrap();
        assert!(matches!(err, NamesysError::Timeout));
        assert!(elapsed < Duration::from_secs(1), "took {elapsed:?}");
    }
}
