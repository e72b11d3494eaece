//! Sizes, widths and domain separation strings used across KBAN issuance.
//!
//! The identifier widths define the wire format of a KBAN and MUST NOT change
//! without a migration of every stored record.

/// Size of the service secret key in bytes (256 bits)
pub const SECRET_KEY_SIZE: usize = 32;

/// Size of the per-encryption initialization vector in bytes
pub const IV_SIZE: usize = 16;

/// Size of the AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Separator between the hex IV and the hex ciphertext
pub const CIPHERTEXT_SEPARATOR: char = ':';

/// Number of hex characters of the name/date-of-birth digest kept in a KBAN
pub const FINGERPRINT_LEN: usize = 6;

/// Number of decimal digits in the random payload of a KBAN
pub const RANDOM_PAYLOAD_DIGITS: usize = 8;

/// Exclusive upper bound of the random payload (10^8)
pub const RANDOM_PAYLOAD_MODULUS: u32 = 100_000_000;

/// Length of a session token or authorization code in characters
pub const CREDENTIAL_LEN: usize = 32;

/// AAD bound to every sealed identifier
/// Format: "kban:identifier:v1"
pub const DOMAIN_KBAN_IDENTIFIER_AAD: &str = "kban:identifier:v1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_modulus_matches_digit_count() {
        let digits = RANDOM_PAYLOAD_DIGITS as u32;
        assert_eq!(RANDOM_PAYLOAD_MODULUS, 10u32.pow(digits));
    }

    #[test]
    fn test_domain_string_is_versioned() {
        assert!(DOMAIN_KBAN_IDENTIFIER_AAD.starts_with("kban:"));
        assert!(DOMAIN_KBAN_IDENTIFIER_AAD.ends_with(":v1"));
    }
}
