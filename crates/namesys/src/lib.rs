//! namesys — Signed mutable names over content-addressed storage.
//!
//! An identity's public key fingerprints to a stable name. The owner
//! publishes signed, sequenced records binding that name to a pointer
//! path; anyone can resolve the name through a best-effort routing
//! substrate and receives the most authoritative record that verifies.

pub mod config;
pub mod context;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod publisher;
pub mod record;
pub mod resolver;
pub mod routing;
pub mod storage;
pub mod time;

// Re-export primary types
pub use config::{NamesysConfig, PublisherConfig, ResolverConfig, RetryPolicy};
pub use context::{Context, DoneReason};
pub use error::{NamesysError, Result};
pub use identity::{Identity, Name};
pub use publisher::Publisher;
pub use record::{authority_cmp, PointerPath, Record, Validity};
pub use resolver::{check_candidate, InspectedAnswer, Rejection, Resolver};

// Re-export routing types
pub use routing::{
    FsRouting, LookupEvent, MemoryRouting, PeerId, RoutingError, RoutingKey, RoutingSubstrate,
};

// Re-export storage types
pub use storage::{FileSequenceStore, MemorySequenceStore, SequenceStore};
