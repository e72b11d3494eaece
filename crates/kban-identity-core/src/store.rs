//! Identity store backed by a [`Storage`] column family.

use crate::{errors::*, traits::IdentityStore, types::*};
use async_trait::async_trait;
use kban_crypto::{constant_time_compare, current_timestamp};
use kban_storage::{Storage, CF_KBAN_SESSIONS};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// [`IdentityStore`] over any [`Storage`] backend
///
/// Read-modify-write operations hold `write_lock` so two writers never
/// interleave on one record. Readers see whole records only.
pub struct StorageIdentityStore<S: Storage> {
    storage: Arc<S>,
    write_lock: Mutex<()>,
}

impl<S: Storage> StorageIdentityStore<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self, identifier: &str) -> Result<Option<SessionRecord>> {
        Ok(self
            .storage
            .get(CF_KBAN_SESSIONS, &identifier.to_string())
            .await?)
    }

    async fn save(&self, identifier: &str, record: &SessionRecord) -> Result<()> {
        self.storage
            .put(CF_KBAN_SESSIONS, &identifier.to_string(), record)
            .await?;
        Ok(())
    }

    async fn verify_credential<F>(
        &self,
        identifier: &str,
        candidate: &str,
        select: F,
    ) -> Result<bool>
    where
        F: Fn(&SessionRecord) -> &str,
        F: Send,
    {
        let Some(record) = self.load(identifier).await? else {
            return Ok(false);
        };

        if !record.is_active() {
            debug!("Credential presented for revoked session");
            return Ok(false);
        }

        Ok(constant_time_compare(
            select(&record).as_bytes(),
            candidate.as_bytes(),
        ))
    }
}

#[async_trait]
impl<S: Storage + 'static> IdentityStore for StorageIdentityStore<S> {
    async fn create(
        &self,
        identifier: &str,
        session_token: &str,
        auth_code: &str,
        metadata: KbanMetadata,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        if self
            .storage
            .exists(CF_KBAN_SESSIONS, &identifier.to_string())
            .await?
        {
            warn!("Replacing existing session record for identifier");
        }

        let now = current_timestamp();
        let record = SessionRecord {
            session_token: session_token.to_string(),
            auth_code: auth_code.to_string(),
            metadata,
            status: SessionStatus::Issued,
            created_at: now,
            updated_at: now,
        };
        self.save(identifier, &record).await
    }

    async fn verify_session_token(&self, identifier: &str, candidate: &str) -> Result<bool> {
        self.verify_credential(identifier, candidate, |record| record.session_token.as_str())
            .await
    }

    async fn verify_auth_code(&self, identifier: &str, candidate: &str) -> Result<bool> {
        self.verify_credential(identifier, candidate, |record| record.auth_code.as_str())
            .await
    }

    async fn get(&self, identifier: &str) -> Result<Option<SessionRecord>> {
        self.load(identifier).await
    }

    async fn update_risk_score(&self, identifier: &str, risk_score: u32) -> Result<SessionRecord> {
        let _guard = self.write_lock.lock().await;

        let mut record = self.load(identifier).await?.ok_or(KbanError::NotFound)?;
        record.metadata.risk_score = risk_score;
        record.updated_at = current_timestamp();
        self.save(identifier, &record).await?;

        info!(risk_score, "Risk score updated");
        Ok(record)
    }

    async fn revoke(&self, identifier: &str) -> Result<SessionRecord> {
        let _guard = self.write_lock.lock().await;

        let mut record = self.load(identifier).await?.ok_or(KbanError::NotFound)?;
        if record.status == SessionStatus::Revoked {
            return Ok(record);
        }

        record.status = SessionStatus::Revoked;
        record.updated_at = current_timestamp();
        self.save(identifier, &record).await?;

        info!("Session revoked");
        Ok(record)
    }

    async fn remove(&self, identifier: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        self.storage
            .delete(CF_KBAN_SESSIONS, &identifier.to_string())
            .await?;

        info!("Session record removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kban_storage::MemoryStorage;

    const ID: &str = "US0012C7BF9123456785";
    const TOKEN: &str = "0123456789abcdef0123456789abcdef";
    const CODE: &str = "fedcba9876543210fedcba9876543210";

    fn metadata() -> KbanMetadata {
        let request = IssueKbanRequest {
            country: "US".into(),
            branch: "001".into(),
            name: "Alice Smith".into(),
            dob: "1990-01-01".into(),
            personal_code: "P-1".into(),
            ..Default::default()
        };
        KbanMetadata::from_request(&request, &NetworkContext::default())
    }

    async fn seeded_store() -> StorageIdentityStore<MemoryStorage> {
        let store = StorageIdentityStore::new(Arc::new(MemoryStorage::new()));
        store.create(ID, TOKEN, CODE, metadata()).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_verify_session_token() {
        let store = seeded_store().await;

        assert!(store.verify_session_token(ID, TOKEN).await.unwrap());
        assert!(!store.verify_session_token(ID, "wrong").await.unwrap());
        assert!(!store.verify_session_token("unknown-id", TOKEN).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_auth_code_is_repeatable() {
        let store = seeded_store().await;

        assert!(store.verify_auth_code(ID, CODE).await.unwrap());
        assert!(store.verify_auth_code(ID, CODE).await.unwrap());
        assert!(!store.verify_auth_code(ID, TOKEN).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_overwrites_existing_record() {
        let store = seeded_store().await;
        let other_token = "11111111111111111111111111111111";

        store.create(ID, other_token, CODE, metadata()).await.unwrap();

        assert!(!store.verify_session_token(ID, TOKEN).await.unwrap());
        assert!(store.verify_session_token(ID, other_token).await.unwrap());
    }

    #[tokio::test]
    async fn test_revoked_record_never_verifies() {
        let store = seeded_store().await;

        let record = store.revoke(ID).await.unwrap();
        assert_eq!(record.status, SessionStatus::Revoked);

        assert!(!store.verify_session_token(ID, TOKEN).await.unwrap());
        assert!(!store.verify_auth_code(ID, CODE).await.unwrap());

        // Second revoke is a no-op
        let again = store.revoke(ID).await.unwrap();
        assert_eq!(again.status, SessionStatus::Revoked);
    }

    #[tokio::test]
    async fn test_revoke_unknown_identifier() {
        let store = seeded_store().await;
        assert!(matches!(
            store.revoke("unknown-id").await,
            Err(KbanError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_risk_score_persists() {
        let store = seeded_store().await;

        let updated = store.update_risk_score(ID, 87).await.unwrap();
        assert_eq!(updated.metadata.risk_score, 87);

        let record = store.get(ID).await.unwrap().unwrap();
        assert_eq!(record.metadata.risk_score, 87);
        assert_eq!(record.status, SessionStatus::Issued);
        assert!(store.verify_session_token(ID, TOKEN).await.unwrap());

        assert!(matches!(
            store.update_risk_score("unknown-id", 5).await,
            Err(KbanError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_remove_drops_record() {
        let store = seeded_store().await;

        store.remove(ID).await.unwrap();

        assert!(store.get(ID).await.unwrap().is_none());
        assert!(!store.verify_session_token(ID, TOKEN).await.unwrap());
        // Removing again is not an error
        store.remove(ID).await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_create_and_verify_see_whole_records() {
        let store = Arc::new(StorageIdentityStore::new(Arc::new(MemoryStorage::new())));
        let tokens: Vec<String> = (0..16).map(|i| format!("{:032x}", i)).collect();

        let mut handles = Vec::new();
        for token in tokens.clone() {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.create(ID, &token, CODE, metadata()).await.unwrap();
                store.verify_auth_code(ID, CODE).await.unwrap()
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        let record = store.get(ID).await.unwrap().unwrap();
        assert!(tokens.contains(&record.session_token));
    }
}
