//! Pointer paths: the mutable value a name is bound to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NamesysError, Result};

/// Upper bound on the serialized length of a pointer path.
pub const MAX_PATH_LEN: usize = 4096;

/// A path into content-addressed storage, such as `/ipfs/Qm…/index.html`.
///
/// Always begins with `/`, has no empty interior segments and no
/// whitespace or control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PointerPath(String);

impl PointerPath {
    /// Validate and wrap a path string.
    pub fn parse(s: impl Into<String>) -> Result<Self> {
        let s: String = s.into();
        if !s.starts_with('/') {
            return Err(NamesysError::InvalidPath(format!("{s:?} must begin with '/'")));
        }
        if s.len() > MAX_PATH_LEN {
            return Err(NamesysError::InvalidPath(format!(
                "path is {} bytes, limit is {MAX_PATH_LEN}",
                s.len()
            )));
        }
        if s.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(NamesysError::InvalidPath(
                "path contains whitespace or control characters".into(),
            ));
        }
        // A single trailing slash is allowed; empty interior segments are not.
        let trimmed = s.strip_suffix('/').unwrap_or(&s);
        if trimmed.is_empty() || trimmed[1..].split('/').any(str::is_empty) {
            return Err(NamesysError::InvalidPath(format!("{s:?} has empty segments")));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Non-empty segments, e.g. `["ipfs", "Qm…", "index.html"]`.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// First segment, e.g. `ipfs`.
    pub fn namespace(&self) -> &str {
        self.segments().next().unwrap_or_default()
    }
}

impl fmt::Display for PointerPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PointerPath {
    type Err = NamesysError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PointerPath {
    type Error = NamesysError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<PointerPath> for String {
    fn from(p: PointerPath) -> Self {
        p.0
    }
}
