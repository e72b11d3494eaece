//! Session verification and lifecycle.

use crate::{
    errors::*,
    traits::{AuditLog, IdentityStore},
    types::*,
};
use kban_crypto::log_handle;
use tracing::{debug, info, warn};

use super::KbanService;

impl<S, A> KbanService<S, A>
where
    S: IdentityStore + 'static,
    A: AuditLog + 'static,
{
    pub(crate) async fn verify_session_token_internal(
        &self,
        identifier: &str,
        token: &str,
    ) -> Result<bool> {
        let valid = self.store.verify_session_token(identifier, token).await?;
        self.audit_log
            .append(
                identifier,
                AuditAction::VerifySession,
                AuditStatus::from_outcome(valid),
            )
            .await?;

        debug!(kban = %log_handle(identifier), valid, "Session token verified");
        Ok(valid)
    }

    pub(crate) async fn verify_auth_code_internal(
        &self,
        identifier: &str,
        code: &str,
    ) -> Result<bool> {
        let valid = self.store.verify_auth_code(identifier, code).await?;
        self.audit_log
            .append(
                identifier,
                AuditAction::VerifyAuth,
                AuditStatus::from_outcome(valid),
            )
            .await?;

        debug!(kban = %log_handle(identifier), valid, "Auth code verified");
        Ok(valid)
    }

    pub(crate) async fn verify_sealed_session_token_internal(
        &self,
        kban: &str,
        token: &str,
    ) -> Result<bool> {
        match self.open_sealed(kban, AuditAction::VerifySession).await? {
            Some(identifier) => self.verify_session_token_internal(&identifier, token).await,
            None => Ok(false),
        }
    }

    pub(crate) async fn verify_sealed_auth_code_internal(
        &self,
        kban: &str,
        code: &str,
    ) -> Result<bool> {
        match self.open_sealed(kban, AuditAction::VerifyAuth).await? {
            Some(identifier) => self.verify_auth_code_internal(&identifier, code).await,
            None => Ok(false),
        }
    }

    /// Open a KBAN presented for verification
    ///
    /// `None` when it cannot be opened; the attempt is then recorded as a
    /// failure under the KBAN's log handle.
    async fn open_sealed(&self, kban: &str, action: AuditAction) -> Result<Option<String>> {
        match self.decrypt_internal(kban) {
            Ok(identifier) => Ok(Some(identifier)),
            Err(KbanError::MalformedCiphertext) => {
                let handle = log_handle(kban);
                warn!(kban = %handle, %action, "Verification with unreadable KBAN");
                self.audit_log
                    .append(&handle, action, AuditStatus::Failure)
                    .await?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) async fn revoke_internal(&self, identifier: &str) -> Result<()> {
        match self.store.revoke(identifier).await {
            Ok(_) => {
                self.audit_log
                    .append(identifier, AuditAction::Revoke, AuditStatus::Success)
                    .await?;
                info!(kban = %log_handle(identifier), "KBAN revoked");
                Ok(())
            }
            Err(e) => {
                self.record_failure(identifier, AuditAction::Revoke).await;
                Err(e)
            }
        }
    }

    pub(crate) async fn update_risk_score_internal(
        &self,
        identifier: &str,
        risk_score: u32,
    ) -> Result<SessionRecord> {
        match self.store.update_risk_score(identifier, risk_score).await {
            Ok(record) => {
                self.audit_log
                    .append(identifier, AuditAction::UpdateRisk, AuditStatus::Success)
                    .await?;
                info!(kban = %log_handle(identifier), risk_score, "Risk score applied");
                Ok(record)
            }
            Err(e) => {
                self.record_failure(identifier, AuditAction::UpdateRisk).await;
                Err(e)
            }
        }
    }
}
