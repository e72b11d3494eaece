//! Hashing utilities using SHA-256 and BLAKE3.

use crate::constants::FINGERPRINT_LEN;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Hash data using BLAKE3
///
/// Used for short, non-reversible log handles of identifiers and API keys.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    blake3::hash(data).into()
}

/// Short BLAKE3 handle for correlating a secret-ish value across log lines
///
/// First 8 bytes of the digest as lowercase hex.
pub fn log_handle(value: &str) -> String {
    hex::encode(&blake3_hash(value.as_bytes())[..8])
}

/// Name/date-of-birth fingerprint embedded in a KBAN
///
/// First six hex characters of `SHA-256(name || dob)`, upper-cased. This only
/// makes identifiers for the same subject visually related; it is not a
/// secret and offers no privacy.
pub fn name_fingerprint(name: &str, dob: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(dob.as_bytes());
    let digest: [u8; 32] = hasher.finalize().into();

    let mut fingerprint = hex::encode_upper(&digest[..FINGERPRINT_LEN.div_ceil(2)]);
    fingerprint.truncate(FINGERPRINT_LEN);
    fingerprint
}

/// Compare two secrets in constant time
///
/// Length is not hidden; credentials have a fixed public length.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
