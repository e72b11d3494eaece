//! Shared API helper functions.

use kban_crypto::log_handle;

/// Hash a value for logging without exposing it
pub fn hash_for_log(value: &str) -> String {
    log_handle(value)
}
