//! Persisted per-identity sequence counters.
//!
//! The publisher records the highest sequence it has issued for each name
//! so a restart does not regress it. Stores only move counters forward:
//! recording a lower value than the one held is a no-op.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{NamesysError, Result};
use crate::identity::Name;

/// Storage for the highest sequence issued per name.
pub trait SequenceStore: Send + Sync {
    /// Highest recorded sequence, `0` if none was ever issued.
    fn last_issued(&self, name: &Name) -> Result<u64>;

    /// Raise the recorded sequence to at least `sequence`.
    fn record_issued(&self, name: &Name, sequence: u64) -> Result<()>;
}

/// Process-local store. Counters are lost on exit.
#[derive(Debug, Default)]
pub struct MemorySequenceStore {
    counters: Mutex<BTreeMap<Name, u64>>,
}

impl MemorySequenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SequenceStore for MemorySequenceStore {
    fn last_issued(&self, name: &Name) -> Result<u64> {
        Ok(self.counters.lock().get(name).copied().unwrap_or(0))
    }

    fn record_issued(&self, name: &Name, sequence: u64) -> Result<()> {
        let mut counters = self.counters.lock();
        let entry = counters.entry(*name).or_insert(0);
        *entry = (*entry).max(sequence);
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SequenceFile {
    version: u32,
    counters: BTreeMap<String, u64>,
}

const SEQUENCE_FILE_VERSION: u32 = 1;

/// JSON-file store shared by every publish from this machine.
#[derive(Debug)]
pub struct FileSequenceStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSequenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<SequenceFile> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SequenceFile {
                    version: SEQUENCE_FILE_VERSION,
                    counters: BTreeMap::new(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        let file: SequenceFile = serde_json::from_slice(&bytes).map_err(|e| {
            NamesysError::InvalidFileFormat(format!("sequence file {}: {e}", self.path.display()))
        })?;
        if file.version != SEQUENCE_FILE_VERSION {
            return Err(NamesysError::InvalidFileFormat(format!(
                "unsupported sequence file version {}",
                file.version
            )));
        }
        Ok(file)
    }
}

impl SequenceStore for FileSequenceStore {
    fn last_issued(&self, name: &Name) -> Result<u64> {
        let _guard = self.lock.lock();
        Ok(self
            .read()?
            .counters
            .get(&name.to_string())
            .copied()
            .unwrap_or(0))
    }

    fn record_issued(&self, name: &Name, sequence: u64) -> Result<()> {
        let _guard = self.lock.lock();
        let mut file = self.read()?;
        let entry = file.counters.entry(name.to_string()).or_insert(0);
        if *entry >= sequence {
            return Ok(());
        }
        *entry = sequence;
        let json = serde_json::to_vec_pretty(&file)
            .map_err(|e| NamesysError::Serialization(e.to_string()))?;
        super::write_atomic(&self.path, &json)
    }
}
