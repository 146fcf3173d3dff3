//! Publisher and resolver configuration.
//!
//! Everything has a working default. A [`NamesysConfig`] can also be
//! loaded from a JSON file; durations are written as human strings such as
//! `"24h"` or `"500ms"`.
//!
//! ```json
//! {
//!     "publisher": { "record_lifetime": "24h", "lookup_timeout": "5s" },
//!     "resolver": { "candidate_limit": 16, "retry": { "attempts": 3 } }
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NamesysError, Result};

/// Default lifetime of a freshly published record.
pub const DEFAULT_RECORD_LIFETIME: Duration = Duration::from_secs(24 * 3600);
/// Default budget for the sequence lookup a publish performs first.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);
/// Default number of valid candidates after which a resolve stops early.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 16;

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first. `1` means no retry.
    pub attempts: u32,
    #[serde(with = "duration_str")]
    pub initial_backoff: Duration,
    #[serde(with = "duration_str")]
    pub max_backoff: Duration,
    pub multiplier: u32,
}

impl RetryPolicy {
    /// A single attempt, no retry.
    pub fn none() -> Self {
        Self {
            attempts: 1,
            ..Self::default()
        }
    }

    /// Backoff to wait before attempt number `attempt` (1-based, so the
    /// first retry is attempt 2).
    pub fn backoff_before(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(2);
        let factor = self.multiplier.max(1).saturating_pow(exponent);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Attempt count with the zero case treated as one.
    pub fn max_attempts(&self) -> u32 {
        self.attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 1,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            multiplier: 2,
        }
    }
}

/// Settings for [`crate::Publisher`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Lifetime of new records. `null` publishes records that never expire.
    #[serde(with = "duration_str::option")]
    pub record_lifetime: Option<Duration>,
    /// Budget for resolving the current sequence before publishing.
    #[serde(with = "duration_str")]
    pub lookup_timeout: Duration,
    /// Skip the pre-publish lookup and trust the local counter alone.
    pub trust_local_sequence: bool,
    pub retry: RetryPolicy,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            record_lifetime: Some(DEFAULT_RECORD_LIFETIME),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            trust_local_sequence: false,
            retry: RetryPolicy::none(),
        }
    }
}

/// Settings for [`crate::Resolver`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Stop consuming the substrate after this many valid candidates.
    pub candidate_limit: usize,
    pub retry: RetryPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            retry: RetryPolicy::none(),
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamesysConfig {
    pub publisher: PublisherConfig,
    pub resolver: ResolverConfig,
}

impl NamesysConfig {
    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| NamesysError::InvalidFileFormat(format!("config {}: {e}", path.display())))
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Serde adapter writing durations as `"1h30m"`-style strings.
mod duration_str {
    use std::time::Duration;

    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn format(d: &Duration) -> String {
        let ms = d.as_millis();
        if ms % 1000 != 0 {
            format!("{ms}ms")
        } else {
            format!("{}s", ms / 1000)
        }
    }

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        crate::time::parse_duration(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid duration {raw:?}")))
    }

    pub mod option {
        use std::time::Duration;

        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
            match d {
                Some(d) => s.serialize_some(&super::format(d)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) => crate::time::parse_duration(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid duration {raw:?}"))),
                None => Ok(None),
            }
        }
    }
}
