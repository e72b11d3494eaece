//! KBAN service implementation.

use crate::{
    audit::StorageAuditLog, errors::*, store::StorageIdentityStore, traits::*, types::*,
};
use async_trait::async_trait;
use kban_crypto::IdentifierCipher;
use kban_storage::MemoryStorage;
use std::sync::Arc;

mod issuance;
mod sessions;

/// KBAN service over an [`IdentityStore`] and an [`AuditLog`]
pub struct KbanService<S, A>
where
    S: IdentityStore,
    A: AuditLog,
{
    store: Arc<S>,
    audit_log: Arc<A>,
    cipher: IdentifierCipher,
}

/// Service wired to a single [`MemoryStorage`]
pub type InMemoryKbanService =
    KbanService<StorageIdentityStore<MemoryStorage>, StorageAuditLog<MemoryStorage>>;

impl<S, A> KbanService<S, A>
where
    S: IdentityStore,
    A: AuditLog,
{
    /// Create a new KBAN service
    pub fn new(store: Arc<S>, audit_log: Arc<A>, cipher: IdentifierCipher) -> Self {
        Self {
            store,
            audit_log,
            cipher,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn audit_log(&self) -> &Arc<A> {
        &self.audit_log
    }
}

impl InMemoryKbanService {
    /// Store and audit log sharing one in-memory backend
    pub async fn in_memory(cipher: IdentifierCipher) -> Result<Self> {
        let storage = Arc::new(MemoryStorage::new());
        let store = Arc::new(StorageIdentityStore::new(Arc::clone(&storage)));
        let audit_log = Arc::new(StorageAuditLog::open(storage).await?);

        Ok(Self::new(store, audit_log, cipher))
    }
}

#[async_trait]
impl<S, A> KbanCore for KbanService<S, A>
where
    S: IdentityStore + 'static,
    A: AuditLog + 'static,
{
    async fn issue(
        &self,
        request: IssueKbanRequest,
        network: NetworkContext,
    ) -> Result<IssuedKban> {
        self.issue_internal(request, network).await
    }

    async fn verify_session_token(&self, identifier: &str, token: &str) -> Result<bool> {
        self.verify_session_token_internal(identifier, token).await
    }

    async fn verify_auth_code(&self, identifier: &str, code: &str) -> Result<bool> {
        self.verify_auth_code_internal(identifier, code).await
    }

    async fn verify_sealed_session_token(&self, kban: &str, token: &str) -> Result<bool> {
        self.verify_sealed_session_token_internal(kban, token).await
    }

    async fn verify_sealed_auth_code(&self, kban: &str, code: &str) -> Result<bool> {
        self.verify_sealed_auth_code_internal(kban, code).await
    }

    fn decrypt(&self, encrypted: &str) -> Result<String> {
        self.decrypt_internal(encrypted)
    }

    async fn revoke(&self, identifier: &str) -> Result<()> {
        self.revoke_internal(identifier).await
    }

    async fn update_risk_score(&self, identifier: &str, risk_score: u32) -> Result<SessionRecord> {
        self.update_risk_score_internal(identifier, risk_score).await
    }

    async fn events_for(&self, identifier: &str) -> Result<Vec<AuditEvent>> {
        self.audit_log.events_for(identifier).await
    }
}

#[cfg(test)]
mod tests;
