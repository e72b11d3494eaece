//! # kban-crypto
//!
//! Cryptographic and check-digit primitives for KBAN issuance.
//!
//! ## Security Properties
//!
//! - The service secret key is zeroized on drop and never printed
//! - Identifiers are sealed with an AEAD, so tampering is detected before use
//! - Credential comparison is constant-time
//! - No unsafe code
//!
//! The check digit in [`checksum`] is an error-detecting code for transcription
//! mistakes. It is not an authentication mechanism.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod checksum;
pub mod constants;
pub mod encryption;
pub mod errors;
pub mod hashing;
pub mod tokens;
pub mod utils;

pub use checksum::*;
pub use constants::*;
pub use encryption::*;
pub use errors::{CryptoError, Result};
pub use hashing::*;
pub use tokens::*;
pub use utils::current_timestamp;
