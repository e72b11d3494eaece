//! Append-only audit log backed by [`Storage`].

use crate::{errors::*, traits::AuditLog, types::*};
use async_trait::async_trait;
use chrono::Utc;
use kban_storage::{BatchExt, Storage, CF_AUDIT_EVENTS, CF_AUDIT_EVENTS_BY_KBAN};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// [`AuditLog`] over any [`Storage`] backend
///
/// Each event is written under its sequence number and indexed by
/// identifier in one batch. Sequence assignment, timestamping and the write
/// all happen under `next_sequence`, so append order, sequence order and
/// timestamp order agree.
pub struct StorageAuditLog<S: Storage> {
    storage: Arc<S>,
    next_sequence: Mutex<u64>,
}

impl<S: Storage> StorageAuditLog<S> {
    /// Open the log, continuing after any events already in `storage`
    pub async fn open(storage: Arc<S>) -> Result<Self> {
        let existing = storage.count(CF_AUDIT_EVENTS).await? as u64;

        Ok(Self {
            storage,
            next_sequence: Mutex::new(existing),
        })
    }
}

#[async_trait]
impl<S: Storage + 'static> AuditLog for StorageAuditLog<S> {
    async fn append(
        &self,
        identifier: &str,
        action: AuditAction,
        status: AuditStatus,
    ) -> Result<AuditEvent> {
        let mut next_sequence = self.next_sequence.lock().await;

        let event = AuditEvent {
            sequence: *next_sequence,
            timestamp: Utc::now(),
            identifier: identifier.to_string(),
            action,
            status,
        };
        let sequence_key = event.sequence.to_be_bytes();

        let mut batch = self.storage.batch();
        batch.put(CF_AUDIT_EVENTS, &sequence_key, &event)?;
        batch.put(
            CF_AUDIT_EVENTS_BY_KBAN,
            &(&event.identifier, sequence_key),
            &event,
        )?;
        batch.commit().await?;

        *next_sequence += 1;

        debug!(
            sequence = event.sequence,
            action = %event.action,
            status = %event.status,
            "Audit event appended"
        );
        Ok(event)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.storage.count(CF_AUDIT_EVENTS).await?)
    }

    async fn events(&self) -> Result<Vec<AuditEvent>> {
        let entries: Vec<(Vec<u8>, AuditEvent)> = self.storage.scan_all(CF_AUDIT_EVENTS).await?;
        Ok(entries.into_iter().map(|(_, event)| event).collect())
    }

    async fn events_for(&self, identifier: &str) -> Result<Vec<AuditEvent>> {
        let entries: Vec<(Vec<u8>, AuditEvent)> = self
            .storage
            .get_by_prefix(CF_AUDIT_EVENTS_BY_KBAN, &identifier.to_string())
            .await?;
        Ok(entries.into_iter().map(|(_, event)| event).collect())
    }
}
