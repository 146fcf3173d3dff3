//! Ed25519 signing and verification.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use crate::error::{NamesysError, Result};

/// Sign a message with an Ed25519 signing key.
///
/// `try_sign` is used so a rejected input surfaces as an error rather than a
/// panic inside the signature primitive.
pub fn sign(signing_key: &SigningKey, message: &[u8]) -> Result<[u8; 64]> {
    signing_key
        .try_sign(message)
        .map(|sig| sig.to_bytes())
        .map_err(|e| NamesysError::Signing(e.to_string()))
}

/// Verify a raw 64-byte signature. Any malformed input is simply `false`.
pub fn verify(verifying_key: &VerifyingKey, message: &[u8], signature: &[u8]) -> bool {
    let Ok(sig_array) = <[u8; 64]>::try_from(signature) else {
        return false;
    };
    let signature = Signature::from_bytes(&sig_array);
    verifying_key.verify(message, &signature).is_ok()
}
