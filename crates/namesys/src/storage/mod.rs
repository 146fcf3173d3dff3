//! Local persistence: sealed key files and sequence counters.
//!
//! # Directory layout
//!
//! By convention the CLI roots everything at `~/.namesys/`:
//!
//! ```text
//! ~/.namesys/
//! ├── keys/
//! │   └── {label}.key
//! ├── routing/          (FsRouting root)
//! ├── sequence.json
//! └── config.json
//! ```
//!
//! # Modules
//!
//! - [`key_file`]: `.key` save/load with passphrase sealing.
//! - [`sequence_store`]: highest issued sequence per name.

pub mod key_file;
pub mod sequence_store;

pub use key_file::{load_identity, read_summary, save_identity, KeyFile, KeyFileSummary};
pub use sequence_store::{FileSequenceStore, MemorySequenceStore, SequenceStore};

use std::path::Path;

use crate::error::Result;

/// Write `data` to `path` atomically using a sibling temporary file.
///
/// Creates the parent directory if it does not exist.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);
    std::fs::write(&tmp_path, data)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
