//! Tests for the KBAN service.

use super::*;
use kban_crypto::{log_handle, validate_identifier, SecretKey};
use kban_storage::{Storage, StorageError, CF_KBAN_SESSIONS};

/// Audit log whose writes always fail
struct RejectingAuditLog;

#[async_trait]
impl AuditLog for RejectingAuditLog {
    async fn append(
        &self,
        _identifier: &str,
        _action: AuditAction,
        _status: AuditStatus,
    ) -> Result<AuditEvent> {
        Err(KbanError::Storage(StorageError::InvalidColumnFamily(
            "audit_events".to_string(),
        )))
    }

    async fn len(&self) -> Result<usize> {
        Ok(0)
    }

    async fn events(&self) -> Result<Vec<AuditEvent>> {
        Ok(Vec::new())
    }

    async fn events_for(&self, _identifier: &str) -> Result<Vec<AuditEvent>> {
        Ok(Vec::new())
    }
}

async fn create_test_service() -> InMemoryKbanService {
    let key = Arc::new(SecretKey::generate().unwrap());
    InMemoryKbanService::in_memory(IdentifierCipher::new(key))
        .await
        .unwrap()
}

fn alice() -> IssueKbanRequest {
    IssueKbanRequest {
        country: "US".to_string(),
        branch: "001".to_string(),
        name: "Alice Smith".to_string(),
        dob: "1990-01-01".to_string(),
        personal_code: "AS-19900101".to_string(),
        device_id: Some("iphone-15".to_string()),
        device_type: Some("ios".to_string()),
        enable_push: Some(true),
        tags: vec!["beta".to_string()],
    }
}

fn network() -> NetworkContext {
    NetworkContext {
        ip: Some("198.51.100.4".to_string()),
        user_agent: Some("KbanTest/1.0".to_string()),
    }
}

#[tokio::test]
async fn test_issue_alice() {
    let service = create_test_service().await;

    let issued = service.issue(alice(), network()).await.unwrap();

    assert_eq!(issued.identifier.len(), 20);
    assert!(issued.identifier.starts_with("US0012C7BF9"));
    assert!(validate_identifier(&issued.identifier));
    assert_eq!(
        service.decrypt(issued.kban.as_str()).unwrap(),
        issued.identifier
    );

    assert_eq!(issued.session_token.len(), 32);
    assert_eq!(issued.auth_code.len(), 32);
    assert_ne!(issued.session_token, issued.auth_code);

    let record = service.store().get(&issued.identifier).await.unwrap().unwrap();
    assert_eq!(record.metadata, issued.metadata);
    assert_eq!(record.metadata.device_id, "iphone-15");
    assert_eq!(record.metadata.ip, "198.51.100.4");
    assert_eq!(record.metadata.risk_score, 1);
    assert_eq!(record.status, SessionStatus::Issued);

    let events = service.events_for(&issued.identifier).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::Create);
    assert_eq!(events[0].status, AuditStatus::Success);
}

#[tokio::test]
async fn test_issue_missing_fields_has_no_side_effects() {
    let service = create_test_service().await;

    let mut request = alice();
    request.personal_code = String::new();
    request.dob = " ".to_string();

    match service.issue(request, network()).await {
        Err(KbanError::InvalidInput(message)) => {
            assert!(message.contains("dob"));
            assert!(message.contains("personalCode"));
        }
        other => panic!("Expected InvalidInput, got {:?}", other),
    }

    assert_eq!(service.audit_log().len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_each_issuance_gets_fresh_credentials() {
    let service = create_test_service().await;

    let first = service.issue(alice(), network()).await.unwrap();
    let second = service.issue(alice(), network()).await.unwrap();

    assert_ne!(first.session_token, second.session_token);
    assert_ne!(first.auth_code, second.auth_code);
    assert_ne!(first.kban, second.kban);
}

#[tokio::test]
async fn test_verification_is_audited() {
    let service = create_test_service().await;
    let issued = service.issue(alice(), network()).await.unwrap();
    let id = &issued.identifier;

    assert!(service
        .verify_session_token(id, &issued.session_token)
        .await
        .unwrap());
    assert!(!service.verify_session_token(id, "wrong").await.unwrap());
    assert!(!service
        .verify_session_token("unknown-id", &issued.session_token)
        .await
        .unwrap());

    let events = service.events_for(id).await.unwrap();
    let trail: Vec<(AuditAction, AuditStatus)> = events
        .iter()
        .map(|e| (e.action.clone(), e.status))
        .collect();
    assert_eq!(
        trail,
        vec![
            (AuditAction::Create, AuditStatus::Success),
            (AuditAction::VerifySession, AuditStatus::Success),
            (AuditAction::VerifySession, AuditStatus::Failure),
        ]
    );

    let unknown = service.events_for("unknown-id").await.unwrap();
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].status, AuditStatus::Failure);
}

#[tokio::test]
async fn test_verify_auth_code_twice() {
    let service = create_test_service().await;
    let issued = service.issue(alice(), network()).await.unwrap();

    assert!(service
        .verify_auth_code(&issued.identifier, &issued.auth_code)
        .await
        .unwrap());
    assert!(service
        .verify_auth_code(&issued.identifier, &issued.auth_code)
        .await
        .unwrap());

    // The session token is not an auth code
    assert!(!service
        .verify_auth_code(&issued.identifier, &issued.session_token)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_malformed_ciphertext_leaves_state_untouched() {
    let service = create_test_service().await;
    let issued = service.issue(alice(), network()).await.unwrap();
    let events_before = service.audit_log().len().await.unwrap();

    assert!(matches!(
        service.decrypt("deadbeefdeadbeef"),
        Err(KbanError::MalformedCiphertext)
    ));

    assert_eq!(service.audit_log().len().await.unwrap(), events_before);
    assert!(service.store().get(&issued.identifier).await.unwrap().is_some());
}

#[tokio::test]
async fn test_unaudited_issuance_leaves_no_record() {
    let storage = Arc::new(MemoryStorage::new());
    let store = Arc::new(StorageIdentityStore::new(Arc::clone(&storage)));
    let key = Arc::new(SecretKey::generate().unwrap());
    let service = KbanService::new(store, Arc::new(RejectingAuditLog), IdentifierCipher::new(key));

    assert!(matches!(
        service.issue(alice(), network()).await,
        Err(KbanError::Storage(_))
    ));
    assert_eq!(storage.count(CF_KBAN_SESSIONS).await.unwrap(), 0);
}

#[tokio::test]
async fn test_sealed_verification() {
    let service = create_test_service().await;
    let issued = service.issue(alice(), network()).await.unwrap();
    let kban = issued.kban.as_str();

    assert!(service
        .verify_sealed_session_token(kban, &issued.session_token)
        .await
        .unwrap());
    assert!(service
        .verify_sealed_auth_code(kban, &issued.auth_code)
        .await
        .unwrap());
    assert!(!service
        .verify_sealed_auth_code(kban, &issued.session_token)
        .await
        .unwrap());

    let trail: Vec<AuditAction> = service
        .events_for(&issued.identifier)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(
        trail,
        vec![
            AuditAction::Create,
            AuditAction::VerifySession,
            AuditAction::VerifyAuth,
            AuditAction::VerifyAuth,
        ]
    );
}

#[tokio::test]
async fn test_unreadable_kban_verification_is_audited() {
    let service = create_test_service().await;
    let forged = "00112233445566778899aabbccddeeff:deadbeef";

    assert!(!service
        .verify_sealed_session_token(forged, "token")
        .await
        .unwrap());
    assert_eq!(service.audit_log().len().await.unwrap(), 1);

    assert!(!service
        .verify_sealed_auth_code("no-separator", "code")
        .await
        .unwrap());
    assert_eq!(service.audit_log().len().await.unwrap(), 2);

    let events = service.events_for(&log_handle(forged)).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::VerifySession);
    assert_eq!(events[0].status, AuditStatus::Failure);
}

#[tokio::test]
async fn test_foreign_key_fails_like_malformed_input() {
    let service = create_test_service().await;
    let other = create_test_service().await;

    let issued = other.issue(alice(), network()).await.unwrap();

    assert!(matches!(
        service.decrypt(issued.kban.as_str()),
        Err(KbanError::MalformedCiphertext)
    ));
}

#[tokio::test]
async fn test_revoke() {
    let service = create_test_service().await;
    let issued = service.issue(alice(), network()).await.unwrap();

    service.revoke(&issued.identifier).await.unwrap();

    assert!(!service
        .verify_session_token(&issued.identifier, &issued.session_token)
        .await
        .unwrap());
    assert!(!service
        .verify_auth_code(&issued.identifier, &issued.auth_code)
        .await
        .unwrap());

    let events = service.events_for(&issued.identifier).await.unwrap();
    assert_eq!(events[1].action, AuditAction::Revoke);
    assert_eq!(events[1].status, AuditStatus::Success);
}

#[tokio::test]
async fn test_revoke_unknown_is_not_found_and_audited() {
    let service = create_test_service().await;

    assert!(matches!(
        service.revoke("unknown-id").await,
        Err(KbanError::NotFound)
    ));

    let events = service.events_for("unknown-id").await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::Revoke);
    assert_eq!(events[0].status, AuditStatus::Failure);
}

#[tokio::test]
async fn test_update_risk_score() {
    let service = create_test_service().await;
    let issued = service.issue(alice(), network()).await.unwrap();

    let record = service
        .update_risk_score(&issued.identifier, 42)
        .await
        .unwrap();
    assert_eq!(record.metadata.risk_score, 42);

    let stored = service.store().get(&issued.identifier).await.unwrap().unwrap();
    assert_eq!(stored.metadata.risk_score, 42);

    let last = service
        .events_for(&issued.identifier)
        .await
        .unwrap()
        .pop()
        .unwrap();
    assert_eq!(last.action, AuditAction::UpdateRisk);
}

#[tokio::test]
async fn test_concurrent_issuance() {
    let service = Arc::new(create_test_service().await);

    let mut handles = Vec::new();
    for _ in 0..20 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            let issued = service.issue(alice(), network()).await.unwrap();
            service
                .verify_session_token(&issued.identifier, &issued.session_token)
                .await
                .unwrap()
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap());
    }

    // One create and one verify per task
    assert_eq!(service.audit_log().len().await.unwrap(), 40);
}
