//! Record validity: an end-of-life deadline or no expiry at all.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How long a record stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Validity {
    /// Valid until (exclusive) this instant, in microseconds since Unix epoch.
    Eol(u64),
    /// Never expires.
    NoExpiry,
}

impl Validity {
    /// True if the record has expired at `now_micros`.
    pub fn is_expired_at(&self, now_micros: u64) -> bool {
        match self {
            Self::Eol(deadline) => *deadline <= now_micros,
            Self::NoExpiry => false,
        }
    }

    /// Deadline in microseconds, `None` for no expiry.
    pub fn deadline(&self) -> Option<u64> {
        match self {
            Self::Eol(deadline) => Some(*deadline),
            Self::NoExpiry => None,
        }
    }
}

/// Later deadlines order greater; `NoExpiry` is the latest of all.
impl Ord for Validity {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Eol(a), Self::Eol(b)) => a.cmp(b),
            (Self::Eol(_), Self::NoExpiry) => Ordering::Less,
            (Self::NoExpiry, Self::Eol(_)) => Ordering::Greater,
            (Self::NoExpiry, Self::NoExpiry) => Ordering::Equal,
        }
    }
}

impl PartialOrd for Validity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eol(deadline) => write!(f, "until {}", crate::time::micros_to_rfc3339(*deadline)),
            Self::NoExpiry => f.write_str("no expiry"),
        }
    }
}
