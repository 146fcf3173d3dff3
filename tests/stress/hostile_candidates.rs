//! Stress test: a network flooded with forged, tampered, expired and
//! malformed candidates still resolves to the owner's latest record, and
//! nothing in the candidate pipeline panics.

use std::sync::Arc;

use namesys::{
    check_candidate, Context, Identity, MemoryRouting, NamesysError, PointerPath, Record,
    Rejection, Resolver, ResolverConfig, Validity,
};

fn path(s: &str) -> PointerPath {
    PointerPath::parse(s).unwrap()
}

fn resolver(routing: &MemoryRouting, candidate_limit: usize) -> Resolver {
    Resolver::new(
        Arc::new(routing.clone()),
        ResolverConfig {
            candidate_limit,
            ..ResolverConfig::default()
        },
    )
}

#[tokio::test]
async fn stress_owner_wins_among_200_hostile_peers() {
    let peers = 201;
    let routing = MemoryRouting::with_options(peers, 1, 16);
    let owner = Identity::generate(None);
    let key = owner.name().routing_key();
    let genuine = Record::sign(&owner, path("/x/real"), 5, Validity::NoExpiry).unwrap();
    let genuine_bytes = genuine.encode().unwrap();

    for peer in 0..peers - 1 {
        let bytes = match peer % 5 {
            // Forged by another key with a huge sequence.
            0 => {
                let forger = Identity::generate(None);
                Record::sign(&forger, path("/x/evil"), u64::MAX, Validity::NoExpiry)
                    .unwrap()
                    .encode()
                    .unwrap()
            }
            // Owner's signature with one flipped byte.
            1 => {
                let mut bytes = genuine_bytes.clone();
                let last = bytes.len() - 1;
                bytes[last] ^= 0x01;
                bytes
            }
            // Owner's own record at a higher sequence but long expired.
            2 => Record::sign(&owner, path("/x/stale"), 1_000, Validity::Eol(1))
                .unwrap()
                .encode()
                .unwrap(),
            // Truncated.
            3 => genuine_bytes[..genuine_bytes.len() / 3].to_vec(),
            // Random junk.
            _ => (0..64).map(|i| (i * 31 + peer) as u8).collect(),
        };
        routing.inject(peer, &key, bytes);
    }
    routing.inject(peers - 1, &key, genuine_bytes);

    let record = resolver(&routing, 16)
        .resolve_record(&owner.name(), &Context::background())
        .await
        .unwrap();
    assert_eq!(record, genuine);
}

#[tokio::test]
async fn stress_only_hostile_candidates_is_not_found() {
    let routing = MemoryRouting::with_options(50, 1, 8);
    let owner = Identity::generate(None);
    let key = owner.name().routing_key();
    for peer in 0..50 {
        let forger = Identity::generate(None);
        let forged = Record::sign(&forger, path("/x/evil"), peer as u64, Validity::NoExpiry)
            .unwrap()
            .encode()
            .unwrap();
        routing.inject(peer, &key, forged);
    }

    let err = resolver(&routing, 16)
        .resolve(&owner.name(), &Context::background())
        .await
        .unwrap_err();
    assert!(matches!(err, NamesysError::NotFound));
}

#[test]
fn stress_every_truncation_is_rejected_without_panic() {
    let owner = Identity::generate(None);
    let bytes = Record::sign(&owner, path("/ipfs/QmSomething/deep/path"), 42, Validity::NoExpiry)
        .unwrap()
        .encode()
        .unwrap();
    let now = namesys::time::now_micros();

    for len in 0..bytes.len() {
        assert_eq!(
            check_candidate(&owner.name(), &bytes[..len], now).unwrap_err(),
            Rejection::Malformed,
            "truncation to {len} bytes"
        );
    }
    assert!(check_candidate(&owner.name(), &bytes, now).is_ok());
}

#[test]
fn stress_every_single_bit_flip_is_rejected() {
    let owner = Identity::generate(None);
    let bytes = Record::sign(&owner, path("/x/a"), 7, Validity::Eol(u64::MAX))
        .unwrap()
        .encode()
        .unwrap();
    let now = namesys::time::now_micros();

    for i in 0..bytes.len() {
        for bit in 0..8 {
            let mut flipped = bytes.clone();
            flipped[i] ^= 1 << bit;
            assert!(
                check_candidate(&owner.name(), &flipped, now).is_err(),
                "flip of bit {bit} in byte {i} was accepted"
            );
        }
    }
}
