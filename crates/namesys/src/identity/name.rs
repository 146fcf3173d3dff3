//! Names: stable fingerprints of public keys.
//!
//! A name is the SHA-256 multihash of the canonical public key bytes,
//! rendered as base58 (`Qm…`). The same multihash, prefixed with the
//! `/ipns/` namespace, is the routing key for both put and get.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::PublicKey;
use crate::error::{NamesysError, Result};
use crate::routing::RoutingKey;

/// Multihash code for SHA2-256.
const MULTIHASH_SHA2_256: u8 = 0x12;
/// Digest length in bytes.
const DIGEST_LEN: u8 = 32;
/// Namespace prefix for routing keys and the long text form of a name.
pub const NAME_NAMESPACE: &str = "/ipns/";

/// Stable identifier derived from a public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Name {
    digest: [u8; 32],
}

impl Name {
    /// Derive the name for a public key.
    pub fn derive(public_key: &PublicKey) -> Self {
        let digest: [u8; 32] = Sha256::digest(public_key.to_bytes()).into();
        Self { digest }
    }

    /// True iff `public_key` fingerprints to this name.
    pub fn matches(&self, public_key: &PublicKey) -> bool {
        Self::derive(public_key) == *self
    }

    /// Multihash bytes: code, length, digest.
    pub fn to_multihash(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + self.digest.len());
        out.push(MULTIHASH_SHA2_256);
        out.push(DIGEST_LEN);
        out.extend_from_slice(&self.digest);
        out
    }

    /// Parse multihash bytes produced by [`Name::to_multihash`].
    pub fn from_multihash(bytes: &[u8]) -> Result<Self> {
        match bytes {
            [MULTIHASH_SHA2_256, DIGEST_LEN, digest @ ..] if digest.len() == 32 => {
                let mut out = [0u8; 32];
                out.copy_from_slice(digest);
                Ok(Self { digest: out })
            }
            [code, ..] if *code != MULTIHASH_SHA2_256 => Err(NamesysError::InvalidName(format!(
                "unsupported multihash code 0x{code:02x}"
            ))),
            _ => Err(NamesysError::InvalidName(format!(
                "expected 34 multihash bytes, got {}",
                bytes.len()
            ))),
        }
    }

    /// The key this name is stored under in the routing substrate.
    pub fn routing_key(&self) -> RoutingKey {
        let mut key = NAME_NAMESPACE.as_bytes().to_vec();
        key.extend_from_slice(&self.to_multihash());
        RoutingKey::new(key)
    }

    /// Long form, e.g. `/ipns/Qm…`.
    pub fn to_path_string(&self) -> String {
        format!("{NAME_NAMESPACE}{self}")
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.to_multihash()).into_string())
    }
}

impl FromStr for Name {
    type Err = NamesysError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let encoded = s.strip_prefix(NAME_NAMESPACE).unwrap_or(s);
        if encoded.is_empty() {
            return Err(NamesysError::InvalidName("empty name".into()));
        }
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| NamesysError::InvalidName(format!("not base58: {e}")))?;
        Self::from_multihash(&bytes)
    }
}
