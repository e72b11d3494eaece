//! KBAN identifier construction.
//!
//! Layout: `<jurisdiction><branch><fingerprint><random><checksum>`, no
//! separators. The fingerprint is six upper-case hex characters, the random
//! payload eight zero-padded decimal digits and the checksum one digit.

use crate::errors::{KbanError, Result};
use kban_crypto::{
    generate_checksum, name_fingerprint, RANDOM_PAYLOAD_DIGITS, RANDOM_PAYLOAD_MODULUS,
};
use rand::{Rng, RngCore};

/// Subject fields that feed an identifier
#[derive(Debug, Clone, Copy)]
pub struct KbanParts<'a> {
    pub jurisdiction: &'a str,
    pub branch: &'a str,
    pub name: &'a str,
    pub dob: &'a str,
}

/// Build an identifier using the thread-local RNG
pub fn build_kban(parts: KbanParts<'_>) -> Result<String> {
    build_kban_with_rng(parts, &mut rand::thread_rng())
}

/// Build an identifier drawing the random payload from `rng`
///
/// Distinct calls for the same subject differ only in the payload, so two
/// identifiers collide with probability 1 in 10^8 per shared fingerprint.
pub fn build_kban_with_rng<R: RngCore>(parts: KbanParts<'_>, rng: &mut R) -> Result<String> {
    for (field, value) in [
        ("jurisdiction", parts.jurisdiction),
        ("branch", parts.branch),
        ("name", parts.name),
        ("dob", parts.dob),
    ] {
        if value.is_empty() {
            return Err(KbanError::InvalidInput(format!("{} is required", field)));
        }
    }

    let fingerprint = name_fingerprint(parts.name, parts.dob);
    let payload: u32 = rng.gen_range(0..RANDOM_PAYLOAD_MODULUS);

    let base = format!(
        "{}{}{}{:0width$}",
        parts.jurisdiction,
        parts.branch,
        fingerprint,
        payload,
        width = RANDOM_PAYLOAD_DIGITS
    );
    let checksum = generate_checksum(&base);

    Ok(format!("{}{}", base, checksum))
}
