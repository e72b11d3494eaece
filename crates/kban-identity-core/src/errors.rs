//! KBAN core error types.

use kban_crypto::CryptoError;
use kban_storage::StorageError;
use thiserror::Error;

/// KBAN core errors
#[derive(Debug, Error)]
pub enum KbanError {
    /// Issuance request is missing required fields or carries unusable values
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Encrypted KBAN could not be opened
    ///
    /// Wrong key and bad format are reported identically.
    #[error("Malformed ciphertext")]
    MalformedCiphertext,

    /// No session record for the identifier
    #[error("KBAN not found")]
    NotFound,

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Cryptographic error
    #[error("Cryptographic error: {0}")]
    Crypto(CryptoError),
}

impl From<CryptoError> for KbanError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::MalformedCiphertext => KbanError::MalformedCiphertext,
            other => KbanError::Crypto(other),
        }
    }
}

/// Result type for KBAN core operations
pub type Result<T> = std::result::Result<T, KbanError>;
