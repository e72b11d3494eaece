//! Session token and authorization code issuance.
//!
//! Both credentials are 32 lowercase hex characters taken from a fresh UUID v4
//! with the hyphens removed. Uniqueness is probabilistic.

use uuid::Uuid;

/// A session token and authorization code issued together for one KBAN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredentials {
    /// Bearer token proving possession of the session
    pub session_token: String,
    /// Authorization code for downstream calls
    pub auth_code: String,
}

fn random_credential() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Issue a new session token
pub fn issue_session_token() -> String {
    random_credential()
}

/// Issue a new authorization code
pub fn issue_auth_code() -> String {
    random_credential()
}

/// Issue an independent token/code pair
pub fn issue_credentials() -> IssuedCredentials {
    IssuedCredentials {
        session_token: issue_session_token(),
        auth_code: issue_auth_code(),
    }
}
