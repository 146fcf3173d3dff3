//! Name records: construction, signing, verification, wire encoding and
//! conflict resolution.

pub mod path;
pub mod record;
pub mod select;
pub mod validity;

pub use path::{PointerPath, MAX_PATH_LEN};
pub use record::{Record, MAX_RECORD_BYTES};
pub use select::{authority_cmp, select_best, Candidate, Selection};
pub use validity::Validity;
