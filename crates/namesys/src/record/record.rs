//! Signed name records and their canonical wire encoding.
//!
//! The signature covers the canonical encoding of `(value, sequence,
//! validity)`. The wire form adds the signer's public key and the
//! signature. Both use bincode with fixed-width little-endian integers
//! and reject trailing bytes, so every logical record has exactly one
//! byte representation.

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::crypto::{signing, PublicKey};
use crate::error::{NamesysError, Result};
use crate::identity::{Identity, Name};

use super::path::PointerPath;
use super::validity::Validity;

/// Upper bound on an encoded record. Larger blobs are rejected unread.
pub const MAX_RECORD_BYTES: usize = 10 * 1024;

const SIGNATURE_LEN: usize = 64;

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_RECORD_BYTES as u64)
        .reject_trailing_bytes()
}

/// The signed portion of a record.
#[derive(Serialize)]
struct SignPayload<'a> {
    value: &'a PointerPath,
    sequence: u64,
    validity: Validity,
}

impl SignPayload<'_> {
    fn encode(&self) -> Result<Vec<u8>> {
        wire_options()
            .serialize(self)
            .map_err(|e| NamesysError::Signing(format!("encode payload: {e}")))
    }
}

/// A signed, versioned binding of a name to a pointer path.
///
/// Immutable once constructed: fields are only readable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    value: PointerPath,
    sequence: u64,
    validity: Validity,
    public_key: PublicKey,
    signature: Vec<u8>,
}

impl Record {
    /// Build and sign a record with the identity's private key.
    pub fn sign(
        identity: &Identity,
        value: PointerPath,
        sequence: u64,
        validity: Validity,
    ) -> Result<Self> {
        let payload = SignPayload {
            value: &value,
            sequence,
            validity,
        }
        .encode()?;
        let signature = signing::sign(identity.signing_key(), &payload)?;

        Ok(Self {
            value,
            sequence,
            validity,
            public_key: identity.public_key().clone(),
            signature: signature.to_vec(),
        })
    }

    pub fn value(&self) -> &PointerPath {
        &self.value
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }

    /// The embedded signer key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Name of the embedded signer key.
    pub fn signer_name(&self) -> Name {
        Name::derive(&self.public_key)
    }

    /// Check the signature against the embedded key and the validity against
    /// `now_micros`. Expired records are invalid regardless of signature.
    pub fn verify_at(&self, now_micros: u64) -> bool {
        !self.validity.is_expired_at(now_micros) && self.verify_signature()
    }

    /// Check only the signature, ignoring validity. An expired record that
    /// passes this still proves its signer issued that sequence.
    pub fn verify_signature(&self) -> bool {
        let Ok(verifying_key) = self.public_key.verifying_key() else {
            return false;
        };
        let payload = SignPayload {
            value: &self.value,
            sequence: self.sequence,
            validity: self.validity,
        };
        match payload.encode() {
            Ok(bytes) => signing::verify(&verifying_key, &bytes, &self.signature),
            Err(_) => false,
        }
    }

    /// [`Record::verify_at`] against the current clock.
    pub fn verify(&self) -> bool {
        self.verify_at(crate::time::now_micros())
    }

    /// Full acceptance check for a record found under `name`: the embedded
    /// key must fingerprint to `name` and the record must verify.
    pub fn is_valid_for(&self, name: &Name, now_micros: u64) -> bool {
        name.matches(&self.public_key) && self.verify_at(now_micros)
    }

    /// Canonical wire encoding.
    pub fn encode(&self) -> Result<Vec<u8>> {
        wire_options()
            .serialize(self)
            .map_err(|e| NamesysError::Serialization(format!("encode record: {e}")))
    }

    /// Decode a wire blob. Any structural problem is `MalformedRecord`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > MAX_RECORD_BYTES {
            return Err(NamesysError::MalformedRecord(format!(
                "{} bytes exceeds limit of {MAX_RECORD_BYTES}",
                bytes.len()
            )));
        }
        let record: Self = wire_options()
            .deserialize(bytes)
            .map_err(|e| NamesysError::MalformedRecord(e.to_string()))?;
        if record.signature.len() != SIGNATURE_LEN {
            return Err(NamesysError::MalformedRecord(format!(
                "signature is {} bytes, expected {SIGNATURE_LEN}",
                record.signature.len()
            )));
        }
        Ok(record)
    }
}
