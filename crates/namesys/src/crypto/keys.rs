//! Ed25519 key pairs and the algorithm-tagged public key.
//!
//! Records carry a [`PublicKey`], not a bare `VerifyingKey`, so the name
//! fingerprint covers the algorithm tag as well as the key bytes.

use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::{NamesysError, Result};

/// Signature algorithm of a public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    Ed25519,
}

impl KeyAlgorithm {
    /// Stable one-byte tag used in the fingerprint input.
    pub fn tag(self) -> u8 {
        match self {
            Self::Ed25519 => 1,
        }
    }

    /// Return a stable string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ed25519 => "ed25519",
        }
    }
}

/// A public key together with its algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicKey {
    pub algorithm: KeyAlgorithm,
    pub bytes: [u8; 32],
}

impl PublicKey {
    /// Wrap an Ed25519 verifying key.
    pub fn ed25519(key: &VerifyingKey) -> Self {
        Self {
            algorithm: KeyAlgorithm::Ed25519,
            bytes: key.to_bytes(),
        }
    }

    /// Canonical serialized form: algorithm tag followed by the key bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.bytes.len());
        out.push(self.algorithm.tag());
        out.extend_from_slice(&self.bytes);
        out
    }

    /// Decode into a verifying key. Fails for points that are not valid keys.
    pub fn verifying_key(&self) -> Result<VerifyingKey> {
        match self.algorithm {
            KeyAlgorithm::Ed25519 => Ed25519KeyPair::verifying_key_from_bytes(&self.bytes),
        }
    }

    /// Return the key bytes as base64.
    pub fn to_base64(&self) -> String {
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD, self.bytes)
    }
}

/// An Ed25519 key pair for signing operations.
///
/// The signing key is zeroized on drop to prevent private key leakage.
pub struct Ed25519KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Ed25519KeyPair {
    /// Generate a new random Ed25519 key pair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut rand::thread_rng());
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Reconstruct a key pair from raw signing key bytes.
    pub fn from_signing_key_bytes(bytes: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(bytes);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Reconstruct a verifying key from raw bytes.
    pub fn verifying_key_from_bytes(bytes: &[u8; 32]) -> Result<VerifyingKey> {
        VerifyingKey::from_bytes(bytes)
            .map_err(|e| NamesysError::InvalidKey(format!("invalid verifying key: {e}")))
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Return the signing key bytes. Caller must zeroize after use.
    pub fn signing_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Return the tagged public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::ed25519(&self.verifying_key)
    }
}

impl Drop for Ed25519KeyPair {
    fn drop(&mut self) {
        let mut bytes = self.signing_key.to_bytes();
        bytes.zeroize();
    }
}
