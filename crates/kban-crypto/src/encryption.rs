//! Sealing of KBAN identifiers with AES-256-GCM.
//!
//! Wire format: `hex(iv) ':' hex(ciphertext || tag)` with a fresh 16-byte IV
//! per call, so sealing the same identifier twice yields different strings.

use crate::{constants::*, errors::*};
use aes_gcm::{
    aead::{consts::U16, generic_array::GenericArray, Aead, KeyInit, Payload},
    aes::Aes256,
    AesGcm,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES-256-GCM instantiated with a 16-byte nonce
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Service secret key used to seal identifiers
///
/// Built once at startup and shared by reference. A key generated at startup
/// makes every identifier sealed by a previous process unreadable.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; SECRET_KEY_SIZE]);

impl SecretKey {
    /// Create from raw bytes. The input copy is zeroized.
    pub fn from_bytes(mut bytes: [u8; SECRET_KEY_SIZE]) -> Self {
        let key = Self(bytes);
        bytes.zeroize();
        key
    }

    /// Parse a hex-encoded 32-byte key
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let mut bytes = hex::decode(hex_key.trim())
            .map_err(|e| CryptoError::InvalidInput(format!("secret key is not hex: {}", e)))?;

        if bytes.len() != SECRET_KEY_SIZE {
            let actual = bytes.len();
            bytes.zeroize();
            return Err(CryptoError::InvalidKeySize {
                expected: SECRET_KEY_SIZE,
                actual,
            });
        }

        let mut key = [0u8; SECRET_KEY_SIZE];
        key.copy_from_slice(&bytes);
        bytes.zeroize();
        Ok(Self::from_bytes(key))
    }

    /// Generate a random key
    pub fn generate() -> Result<Self> {
        let mut key = [0u8; SECRET_KEY_SIZE];
        rand::thread_rng()
            .try_fill_bytes(&mut key)
            .map_err(|e| CryptoError::RandomGenerationFailed(e.to_string()))?;
        Ok(Self::from_bytes(key))
    }

    fn as_bytes(&self) -> &[u8; SECRET_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// A sealed identifier in `hex(iv):hex(ciphertext)` form
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedIdentifier(String);

impl EncryptedIdentifier {
    /// Wrap an encoded value received from a caller
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Borrow the encoded string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the encoded string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EncryptedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generate a random initialization vector
pub fn generate_iv() -> Result<[u8; IV_SIZE]> {
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng()
        .try_fill_bytes(&mut iv)
        .map_err(|e| CryptoError::RandomGenerationFailed(e.to_string()))?;
    Ok(iv)
}

/// Seals and opens identifiers under one injected [`SecretKey`]
#[derive(Clone)]
pub struct IdentifierCipher {
    key: Arc<SecretKey>,
}

impl IdentifierCipher {
    /// Create a cipher bound to `key`
    pub fn new(key: Arc<SecretKey>) -> Self {
        Self { key }
    }

    /// Seal `plaintext` under a fresh IV
    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptedIdentifier> {
        let iv = generate_iv()?;
        let ciphertext = self.seal(&iv, plaintext.as_bytes())?;

        Ok(EncryptedIdentifier(format!(
            "{}{}{}",
            hex::encode(iv),
            CIPHERTEXT_SEPARATOR,
            hex::encode(ciphertext)
        )))
    }

    /// Open a value produced by [`IdentifierCipher::encrypt`]
    ///
    /// Every failure maps to [`CryptoError::MalformedCiphertext`].
    pub fn decrypt(&self, encoded: &str) -> Result<String> {
        let (iv_hex, data_hex) = encoded
            .split_once(CIPHERTEXT_SEPARATOR)
            .ok_or(CryptoError::MalformedCiphertext)?;

        let iv: [u8; IV_SIZE] = hex::decode(iv_hex)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(CryptoError::MalformedCiphertext)?;
        let ciphertext = hex::decode(data_hex).map_err(|_| CryptoError::MalformedCiphertext)?;

        let plaintext = self.open(&iv, &ciphertext)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::MalformedCiphertext)
    }

    fn seal(&self, iv: &[u8; IV_SIZE], plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm16::new(GenericArray::from_slice(self.key.as_bytes()));
        let payload = Payload {
            msg: plaintext,
            aad: DOMAIN_KBAN_IDENTIFIER_AAD.as_bytes(),
        };

        cipher
            .encrypt(GenericArray::from_slice(iv), payload)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
    }

    fn open(&self, iv: &[u8; IV_SIZE], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm16::new(GenericArray::from_slice(self.key.as_bytes()));
        let payload = Payload {
            msg: ciphertext,
            aad: DOMAIN_KBAN_IDENTIFIER_AAD.as_bytes(),
        };

        cipher
            .decrypt(GenericArray::from_slice(iv), payload)
            .map_err(|_| CryptoError::MalformedCiphertext)
    }
}
