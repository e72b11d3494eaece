//! Weighted check digit for KBAN identifiers.
//!
//! Each UTF-16 code unit of the base string is reduced modulo 10. Units at even
//! (0-based) positions are doubled, units at odd positions are taken as-is, and
//! the check digit is whatever brings the sum up to a multiple of ten.
//!
//! The doubled positions are not folded back to a single digit the way Luhn
//! does it, so two digits five apart in an even position share a weight. Any
//! single substitution in an odd position is detected.

/// Compute the check digit (0-9) for `base`.
///
/// An empty base yields `0`. Callers are expected to pass a non-empty base.
pub fn generate_checksum(base: &str) -> u8 {
    let sum = base
        .encode_utf16()
        .enumerate()
        .fold(0u32, |acc, (index, unit)| {
            let value = u32::from(unit % 10);
            let weighted = if index % 2 == 0 { value * 2 } else { value };
            (acc + weighted) % 10
        });

    ((10 - sum) % 10) as u8
}

/// Check that `checksum` is the check digit of `base`.
pub fn validate_checksum(base: &str, checksum: u8) -> bool {
    generate_checksum(base) == checksum
}

/// Validate a complete identifier whose last character is its check digit.
///
/// Returns `false` for an empty identifier, a lone digit, or a trailing
/// character that is not an ASCII digit.
pub fn validate_identifier(identifier: &str) -> bool {
    let mut chars = identifier.chars();
    let Some(digit) = chars.next_back().and_then(|c| c.to_digit(10)) else {
        return false;
    };

    let base = chars.as_str();
    !base.is_empty() && validate_checksum(base, digit as u8)
}
