//! Identity: an Ed25519 key pair and the name derived from it.
//!
//! The public key IS the identity; the name is its fingerprint and the
//! private key proves ownership. An `Identity` is never mutated after
//! creation, and verification code only ever sees its [`PublicKey`].

pub mod name;

pub use name::{Name, NAME_NAMESPACE};

use ed25519_dalek::SigningKey;

use crate::crypto::{Ed25519KeyPair, PublicKey};

/// An owned identity: key pair, derived name and a little metadata.
pub struct Identity {
    key_pair: Ed25519KeyPair,
    public_key: PublicKey,
    name: Name,
    /// Creation timestamp (microseconds since Unix epoch).
    pub created_at: u64,
    /// Human-readable label (optional, local only).
    pub label: Option<String>,
}

impl Identity {
    /// Create a new identity with a fresh key pair.
    pub fn generate(label: Option<String>) -> Self {
        Self::from_key_pair(Ed25519KeyPair::generate(), crate::time::now_micros(), label)
    }

    /// Reconstruct from existing key bytes and metadata.
    pub fn from_parts(signing_key_bytes: &[u8; 32], created_at: u64, label: Option<String>) -> Self {
        Self::from_key_pair(
            Ed25519KeyPair::from_signing_key_bytes(signing_key_bytes),
            created_at,
            label,
        )
    }

    fn from_key_pair(key_pair: Ed25519KeyPair, created_at: u64, label: Option<String>) -> Self {
        let public_key = key_pair.public_key();
        let name = Name::derive(&public_key);
        Self {
            key_pair,
            public_key,
            name,
            created_at,
            label,
        }
    }

    pub fn name(&self) -> Name {
        self.name
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        self.key_pair.signing_key()
    }

    /// Return the signing key bytes. Caller must zeroize after use.
    pub(crate) fn signing_key_bytes(&self) -> [u8; 32] {
        self.key_pair.signing_key_bytes()
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("name", &self.name.to_string())
            .field("label", &self.label)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
