//! KBAN core trait definitions.

use crate::{errors::Result, types::*};
use async_trait::async_trait;

/// Authoritative identifier → session record mapping
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Insert a session record, replacing any record already under `identifier`
    async fn create(
        &self,
        identifier: &str,
        session_token: &str,
        auth_code: &str,
        metadata: KbanMetadata,
    ) -> Result<()>;

    /// Whether `candidate` is the session token of an active record
    ///
    /// Unknown identifiers yield `false`, never an error.
    async fn verify_session_token(&self, identifier: &str, candidate: &str) -> Result<bool>;

    /// Whether `candidate` is the auth code of an active record
    async fn verify_auth_code(&self, identifier: &str, candidate: &str) -> Result<bool>;

    /// Get the session record for an identifier
    async fn get(&self, identifier: &str) -> Result<Option<SessionRecord>>;

    /// Replace the risk score of an existing record
    async fn update_risk_score(&self, identifier: &str, risk_score: u32) -> Result<SessionRecord>;

    /// Move a record to [`SessionStatus::Revoked`]. Revoking twice is a no-op.
    async fn revoke(&self, identifier: &str) -> Result<SessionRecord>;

    /// Drop the record under `identifier`; absent records are ignored
    async fn remove(&self, identifier: &str) -> Result<()>;
}

/// Append-only lifecycle event log
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append an event stamped with the current time
    async fn append(
        &self,
        identifier: &str,
        action: AuditAction,
        status: AuditStatus,
    ) -> Result<AuditEvent>;

    /// Number of events recorded
    async fn len(&self) -> Result<usize>;

    /// Whether nothing has been recorded yet
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// All events in append order
    async fn events(&self) -> Result<Vec<AuditEvent>>;

    /// Events for one identifier in append order
    async fn events_for(&self, identifier: &str) -> Result<Vec<AuditEvent>>;
}

/// Issuance and verification entry points used by transports
#[async_trait]
pub trait KbanCore: Send + Sync {
    /// Validate, build, seal, bind credentials, store and audit a new KBAN
    async fn issue(&self, request: IssueKbanRequest, network: NetworkContext)
        -> Result<IssuedKban>;

    /// Verify a session token and audit the attempt
    async fn verify_session_token(&self, identifier: &str, token: &str) -> Result<bool>;

    /// Verify an auth code and audit the attempt
    async fn verify_auth_code(&self, identifier: &str, code: &str) -> Result<bool>;

    /// Open a sealed KBAN, then verify a session token against it
    ///
    /// A KBAN that cannot be opened is a failed attempt, audited under its
    /// log handle since no identifier can be recovered.
    async fn verify_sealed_session_token(&self, kban: &str, token: &str) -> Result<bool>;

    /// Open a sealed KBAN, then verify an auth code against it
    async fn verify_sealed_auth_code(&self, kban: &str, code: &str) -> Result<bool>;

    /// Open a sealed KBAN. Touches neither the store nor the audit log.
    fn decrypt(&self, encrypted: &str) -> Result<String>;

    /// Revoke the session bound to an identifier
    async fn revoke(&self, identifier: &str) -> Result<()>;

    /// Apply an out-of-band risk score
    async fn update_risk_score(&self, identifier: &str, risk_score: u32) -> Result<SessionRecord>;

    /// Audit trail for one identifier
    async fn events_for(&self, identifier: &str) -> Result<Vec<AuditEvent>>;
}
