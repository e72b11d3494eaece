//! KBAN core type definitions.

use chrono::{DateTime, Utc};
use kban_crypto::EncryptedIdentifier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Device id recorded when the caller supplies none
pub const DEFAULT_DEVICE_ID: &str = "unknown";

/// Device type recorded when the caller supplies none
pub const DEFAULT_DEVICE_TYPE: &str = "web";

/// Network attribute recorded when the transport could not provide one
pub const UNKNOWN_NETWORK_ATTRIBUTE: &str = "unknown";

/// Risk score assigned at issuance
pub const INITIAL_RISK_SCORE: u32 = 1;

/// Issuance request
///
/// `country` is the jurisdiction code placed at the head of the identifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueKbanRequest {
    pub country: String,
    pub branch: String,
    pub name: String,
    pub dob: String,
    pub personal_code: String,
    pub device_id: Option<String>,
    pub device_type: Option<String>,
    pub enable_push: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl IssueKbanRequest {
    /// Names of required fields that are absent or blank, in declaration order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("country", &self.country),
            ("branch", &self.branch),
            ("name", &self.name),
            ("dob", &self.dob),
            ("personalCode", &self.personal_code),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

/// Caller network attributes captured by the transport
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Subject, device and network attributes stored with a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbanMetadata {
    pub name: String,
    pub dob: String,
    pub country: String,
    pub branch: String,
    pub personal_code: String,
    pub device_id: String,
    pub device_type: String,
    pub push_enabled: bool,
    pub ip: String,
    pub user_agent: String,
    pub risk_score: u32,
    pub tags: Vec<String>,
}

impl KbanMetadata {
    /// Build issuance metadata, filling defaults for optional attributes
    pub fn from_request(request: &IssueKbanRequest, network: &NetworkContext) -> Self {
        fn or_default(value: &Option<String>, default: &str) -> String {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        }

        Self {
            name: request.name.clone(),
            dob: request.dob.clone(),
            country: request.country.clone(),
            branch: request.branch.clone(),
            personal_code: request.personal_code.clone(),
            device_id: or_default(&request.device_id, DEFAULT_DEVICE_ID),
            device_type: or_default(&request.device_type, DEFAULT_DEVICE_TYPE),
            push_enabled: request.enable_push.unwrap_or(false),
            ip: or_default(&network.ip, UNKNOWN_NETWORK_ATTRIBUTE),
            user_agent: or_default(&network.user_agent, UNKNOWN_NETWORK_ATTRIBUTE),
            risk_score: INITIAL_RISK_SCORE,
            tags: request.tags.clone(),
        }
    }
}

/// Session lifecycle state
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Issued = 0x01,
    Revoked = 0x02,
}

/// Session record keyed by identifier
#[derive(Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_token: String,
    pub auth_code: String,
    pub metadata: KbanMetadata,
    pub status: SessionStatus,
    pub created_at: u64,
    pub updated_at: u64,
}

impl SessionRecord {
    /// Whether credentials bound to this record may still be presented
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Issued
    }
}

impl fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRecord")
            .field("session_token", &"[REDACTED]")
            .field("auth_code", &"[REDACTED]")
            .field("metadata", &self.metadata)
            .field("status", &self.status)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Result of a successful issuance
#[derive(Clone)]
pub struct IssuedKban {
    /// Plaintext identifier. Remote callers only ever receive `kban`.
    pub identifier: String,
    /// Sealed identifier handed to the device
    pub kban: EncryptedIdentifier,
    pub session_token: String,
    pub auth_code: String,
    pub metadata: KbanMetadata,
}

impl fmt::Debug for IssuedKban {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedKban")
            .field("kban", &self.kban)
            .field("session_token", &"[REDACTED]")
            .field("auth_code", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Audit action
///
/// Open set: well-known lifecycle actions plus free-form ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuditAction {
    Create,
    VerifySession,
    VerifyAuth,
    Revoke,
    UpdateRisk,
    Other(String),
}

impl AuditAction {
    pub fn as_str(&self) -> &str {
        match self {
            AuditAction::Create => "create",
            AuditAction::VerifySession => "verify-session",
            AuditAction::VerifyAuth => "verify-auth",
            AuditAction::Revoke => "revoke",
            AuditAction::UpdateRisk => "update-risk",
            AuditAction::Other(action) => action,
        }
    }
}

impl From<String> for AuditAction {
    fn from(action: String) -> Self {
        match action.as_str() {
            "create" => AuditAction::Create,
            "verify-session" => AuditAction::VerifySession,
            "verify-auth" => AuditAction::VerifyAuth,
            "revoke" => AuditAction::Revoke,
            "update-risk" => AuditAction::UpdateRisk,
            _ => AuditAction::Other(action),
        }
    }
}

impl From<AuditAction> for String {
    fn from(action: AuditAction) -> Self {
        match action {
            AuditAction::Other(action) => action,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    Failure,
}

impl AuditStatus {
    pub fn from_outcome(ok: bool) -> Self {
        if ok {
            AuditStatus::Success
        } else {
            AuditStatus::Failure
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditStatus::Success => f.write_str("success"),
            AuditStatus::Failure => f.write_str("failure"),
        }
    }
}

/// Immutable audit log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Append index, unique and increasing
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub identifier: String,
    pub action: AuditAction,
    pub status: AuditStatus,
}
