//! Cryptographic primitives for namesys.
//!
//! This module provides:
//! - Ed25519 key generation and the tagged public key form used in records
//! - Signing and verification over canonical record bytes
//! - Passphrase sealing (Argon2id, HKDF-SHA256, ChaCha20-Poly1305) for key files

pub mod keys;
pub mod seal;
pub mod signing;

pub use keys::{Ed25519KeyPair, KeyAlgorithm, PublicKey};
