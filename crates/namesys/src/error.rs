//! Error types for namesys.
//!
//! All errors are strongly typed and propagated without panicking.
//! Private key material is never included in error messages, and a
//! candidate that fails verification is never reported individually.

use crate::routing::RoutingError;

/// Error type covering key handling, publishing and resolution.
#[derive(Debug, thiserror::Error)]
pub enum NamesysError {
    #[error("no valid record found")]
    NotFound,

    #[error("search incomplete: peers hold the name but no verifiable record was found")]
    SearchIncomplete,

    #[error("operation timed out")]
    Timeout,

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("publish failed: {cause}")]
    Publish { cause: RoutingError },

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("invalid passphrase")]
    InvalidPassphrase,

    #[error("invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NamesysError {
    /// Whether the caller may reasonably try the operation again.
    ///
    /// Publish retries must start from a fresh sequence lookup, never from a
    /// previously signed record.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::SearchIncomplete | Self::Timeout | Self::Publish { .. }
        )
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, NamesysError>;
