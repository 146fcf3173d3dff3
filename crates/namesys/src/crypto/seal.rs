//! Passphrase sealing for secret key material at rest.
//!
//! passphrase → Argon2id(passphrase, salt) → master key
//! HKDF-SHA256(master key, context) → sealing key
//! ChaCha20-Poly1305(sealing key, nonce) → ciphertext

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::{NamesysError, Result};

const ARGON2_M_COST: u32 = 65536; // 64 MiB
const ARGON2_T_COST: u32 = 3;
const ARGON2_P_COST: u32 = 4;

/// Salt, nonce and ciphertext produced by [`seal`].
#[derive(Debug, Clone)]
pub struct Sealed {
    pub salt: [u8; 16],
    pub nonce: [u8; 12],
    pub ciphertext: Vec<u8>,
}

/// Derive a 32-byte key from a passphrase and salt using Argon2id.
fn passphrase_key(passphrase: &[u8], salt: &[u8; 16]) -> Result<[u8; 32]> {
    let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(32))
        .map_err(|e| NamesysError::DerivationFailed(format!("Argon2 params: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = [0u8; 32];
    argon2
        .hash_password_into(passphrase, salt, &mut output)
        .map_err(|e| NamesysError::DerivationFailed(format!("Argon2 hash: {e}")))?;
    Ok(output)
}

/// Expand a master key into a context-scoped key with HKDF-SHA256.
fn scoped_key(master: &[u8; 32], context: &str) -> Result<[u8; 32]> {
    let hk = Hkdf::<Sha256>::new(None, master);
    let mut output = [0u8; 32];
    hk.expand(context.as_bytes(), &mut output)
        .map_err(|e| NamesysError::DerivationFailed(format!("HKDF expand failed: {e}")))?;
    Ok(output)
}

fn sealing_key(passphrase: &[u8], salt: &[u8; 16], context: &str) -> Result<[u8; 32]> {
    let mut master = passphrase_key(passphrase, salt)?;
    let key = scoped_key(&master, context);
    master.zeroize();
    key
}

/// Encrypt `plaintext` under a passphrase. `context` binds the ciphertext
/// to one use so keys sealed for one purpose cannot be opened for another.
pub fn seal(passphrase: &[u8], context: &str, plaintext: &[u8]) -> Result<Sealed> {
    let mut salt = [0u8; 16];
    let mut nonce = [0u8; 12];
    rand::thread_rng().fill_bytes(&mut salt);
    rand::thread_rng().fill_bytes(&mut nonce);

    let mut key = sealing_key(passphrase, &salt, context)?;
    let cipher = ChaCha20Poly1305::new_from_slice(&key)
        .map_err(|e| NamesysError::EncryptionFailed(format!("cipher init: {e}")));
    key.zeroize();
    let ciphertext = cipher?
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| NamesysError::EncryptionFailed(format!("encrypt: {e}")))?;

    Ok(Sealed {
        salt,
        nonce,
        ciphertext,
    })
}

/// Decrypt a [`Sealed`] blob. A wrong passphrase or context fails AEAD
/// authentication and reports `InvalidPassphrase`.
pub fn open(passphrase: &[u8], context: &str, sealed: &Sealed) -> Result<Vec<u8>> {
    let mut key = sealing_key(passphrase, &sealed.salt, context)?;
    let cipher = ChaCha20Poly1305::new_from_slice(&key)
        .map_err(|e| NamesysError::EncryptionFailed(format!("cipher init: {e}")));
    key.zeroize();
    cipher?
        .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
        .map_err(|_| NamesysError::InvalidPassphrase)
}
