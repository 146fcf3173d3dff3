//! `.key` file format: a sealed identity on disk.
//!
//! The signing key is sealed under a passphrase; the name and public key
//! sit beside it in plaintext so a key file can be inspected without
//! unlocking it.
//!
//! File format (JSON):
//! ```json
//! {
//!     "version": 1,
//!     "format": "namesys-key-v1",
//!     "name": "Qm…",
//!     "public_key": "<base64-32-bytes>",
//!     "algorithm": "ed25519",
//!     "created_at": 1700000000000000,
//!     "label": "site",
//!     "seal": { "kdf": "argon2id", "cipher": "chacha20-poly1305", "salt": "…", "nonce": "…" },
//!     "sealed_key": "<base64-ciphertext>"
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::crypto::seal::{self, Sealed};
use crate::error::{NamesysError, Result};
use crate::identity::{Identity, Name};

const KEY_FILE_VERSION: u32 = 1;
const KEY_FILE_FORMAT: &str = "namesys-key-v1";
const SEAL_KDF: &str = "argon2id";
const SEAL_CIPHER: &str = "chacha20-poly1305";
/// HKDF context binding sealed keys to this file format.
const SEAL_CONTEXT: &str = "namesys/key-file/v1";

/// Sealing parameters stored next to the ciphertext.
#[derive(Debug, Serialize, Deserialize)]
pub struct SealMetadata {
    pub kdf: String,
    pub cipher: String,
    pub salt: String,
    pub nonce: String,
}

/// Top-level structure of a `.key` file.
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyFile {
    pub version: u32,
    pub format: String,
    pub name: String,
    pub public_key: String,
    pub algorithm: String,
    pub created_at: u64,
    pub label: Option<String>,
    pub seal: SealMetadata,
    pub sealed_key: String,
}

/// Public information readable without the passphrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFileSummary {
    pub name: Name,
    pub public_key: String,
    pub created_at: u64,
    pub label: Option<String>,
}

fn b64_encode(bytes: &[u8]) -> String {
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes)
}

fn b64_decode_array<const N: usize>(field: &str, value: &str) -> Result<[u8; N]> {
    let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, value)
        .map_err(|e| NamesysError::InvalidFileFormat(format!("invalid {field} base64: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| NamesysError::InvalidFileFormat(format!("{field} must be {N} bytes")))
}

/// Seal `identity` under `passphrase` and write it to `path` atomically.
pub fn save_identity(identity: &Identity, path: &Path, passphrase: &str) -> Result<()> {
    let mut secret = identity.signing_key_bytes();
    let sealed = seal::seal(passphrase.as_bytes(), SEAL_CONTEXT, &secret);
    secret.zeroize();
    let sealed = sealed?;

    let file = KeyFile {
        version: KEY_FILE_VERSION,
        format: KEY_FILE_FORMAT.to_string(),
        name: identity.name().to_string(),
        public_key: identity.public_key().to_base64(),
        algorithm: identity.public_key().algorithm.as_str().to_string(),
        created_at: identity.created_at,
        label: identity.label.clone(),
        seal: SealMetadata {
            kdf: SEAL_KDF.to_string(),
            cipher: SEAL_CIPHER.to_string(),
            salt: b64_encode(&sealed.salt),
            nonce: b64_encode(&sealed.nonce),
        },
        sealed_key: b64_encode(&sealed.ciphertext),
    };

    let json = serde_json::to_string_pretty(&file)
        .map_err(|e| NamesysError::Serialization(e.to_string()))?;
    super::write_atomic(path, json.as_bytes())
}

fn read_key_file(path: &Path) -> Result<KeyFile> {
    let bytes = std::fs::read(path)?;
    let file: KeyFile = serde_json::from_slice(&bytes)
        .map_err(|e| NamesysError::InvalidFileFormat(format!("failed to parse key file: {e}")))?;
    if file.version != KEY_FILE_VERSION || file.format != KEY_FILE_FORMAT {
        return Err(NamesysError::InvalidFileFormat(format!(
            "unsupported key file version={} format={}",
            file.version, file.format
        )));
    }
    Ok(file)
}

/// Unseal the identity stored at `path`.
///
/// The recovered key must reproduce the name recorded in the file;
/// a mismatch means the file was edited and is reported as invalid.
pub fn load_identity(path: &Path, passphrase: &str) -> Result<Identity> {
    let file = read_key_file(path)?;
    let sealed = Sealed {
        salt: b64_decode_array::<16>("salt", &file.seal.salt)?,
        nonce: b64_decode_array::<12>("nonce", &file.seal.nonce)?,
        ciphertext: base64::Engine::decode(
            &base64::engine::general_purpose::STANDARD,
            &file.sealed_key,
        )
        .map_err(|e| NamesysError::InvalidFileFormat(format!("invalid sealed key base64: {e}")))?,
    };

    let mut plaintext = seal::open(passphrase.as_bytes(), SEAL_CONTEXT, &sealed)?;
    let secret: std::result::Result<[u8; 32], _> = plaintext.as_slice().try_into();
    plaintext.zeroize();
    let mut secret =
        secret.map_err(|_| NamesysError::InvalidKey("sealed key must be 32 bytes".into()))?;

    let identity = Identity::from_parts(&secret, file.created_at, file.label);
    secret.zeroize();

    if identity.name().to_string() != file.name {
        return Err(NamesysError::InvalidFileFormat(
            "key does not match the recorded name".into(),
        ));
    }
    Ok(identity)
}

/// Read the public part of a key file without the passphrase.
pub fn read_summary(path: &Path) -> Result<KeyFileSummary> {
    let file = read_key_file(path)?;
    Ok(KeyFileSummary {
        name: file.name.parse()?,
        public_key: file.public_key,
        created_at: file.created_at,
        label: file.label,
    })
}
