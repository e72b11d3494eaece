//! Issuance and decryption.

use crate::{
    builder::{build_kban, KbanParts},
    errors::*,
    traits::{AuditLog, IdentityStore},
    types::*,
};
use kban_crypto::{issue_credentials, log_handle};
use tracing::{debug, info, warn};

use super::KbanService;

impl<S, A> KbanService<S, A>
where
    S: IdentityStore + 'static,
    A: AuditLog + 'static,
{
    /// Issue a new KBAN
    ///
    /// Required fields are checked before anything is built, so a rejected
    /// request leaves no record and no audit event.
    pub(crate) async fn issue_internal(
        &self,
        request: IssueKbanRequest,
        network: NetworkContext,
    ) -> Result<IssuedKban> {
        let missing = request.missing_fields();
        if !missing.is_empty() {
            warn!(missing = ?missing, "Rejected issuance with missing fields");
            return Err(KbanError::InvalidInput(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        let identifier = build_kban(KbanParts {
            jurisdiction: &request.country,
            branch: &request.branch,
            name: &request.name,
            dob: &request.dob,
        })?;
        let handle = log_handle(&identifier);

        let issued = match self.seal_and_store(&identifier, &request, &network).await {
            Ok(issued) => issued,
            Err(e) => {
                warn!(kban = %handle, error = %e, "KBAN issuance failed");
                self.record_failure(&identifier, AuditAction::Create).await;
                return Err(e);
            }
        };

        // Credentials are only delivered once the issuance is on record
        if let Err(e) = self
            .audit_log
            .append(&identifier, AuditAction::Create, AuditStatus::Success)
            .await
        {
            warn!(kban = %handle, error = %e, "Issuance could not be audited, discarding record");
            if let Err(remove_err) = self.store.remove(&identifier).await {
                warn!(kban = %handle, error = %remove_err, "Failed to discard unaudited record");
            }
            self.record_failure(&identifier, AuditAction::Create).await;
            return Err(e);
        }

        info!(
            kban = %handle,
            country = %request.country,
            device_type = %issued.metadata.device_type,
            "KBAN issued"
        );
        Ok(issued)
    }

    async fn seal_and_store(
        &self,
        identifier: &str,
        request: &IssueKbanRequest,
        network: &NetworkContext,
    ) -> Result<IssuedKban> {
        let kban = self.cipher.encrypt(identifier)?;
        let credentials = issue_credentials();
        let metadata = KbanMetadata::from_request(request, network);

        self.store
            .create(
                identifier,
                &credentials.session_token,
                &credentials.auth_code,
                metadata.clone(),
            )
            .await?;

        Ok(IssuedKban {
            identifier: identifier.to_string(),
            kban,
            session_token: credentials.session_token,
            auth_code: credentials.auth_code,
            metadata,
        })
    }

    /// Open a sealed KBAN
    pub(crate) fn decrypt_internal(&self, encrypted: &str) -> Result<String> {
        self.cipher.decrypt(encrypted).map_err(|e| {
            debug!("Rejected sealed KBAN");
            KbanError::from(e)
        })
    }

    /// Best-effort failure entry; the original error is what the caller sees
    pub(crate) async fn record_failure(&self, identifier: &str, action: AuditAction) {
        if let Err(e) = self
            .audit_log
            .append(identifier, action, AuditStatus::Failure)
            .await
        {
            warn!(error = %e, "Failed to record audit failure");
        }
    }
}
