use axum::{
    extract::{Path, State},
    response::Json,
};
use kban_identity_core::{AuditEvent, IssueKbanRequest, KbanCore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    api::helpers::hash_for_log,
    error::ApiError,
    extractors::ApiCaller,
    profile::{qr_link, render_mobileconfig},
    request_context::RequestContext,
    state::AppState,
};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Issuance body. Required fields default to empty so that their absence is
/// reported by the core as a missing field rather than a JSON error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueKbanBody {
    #[serde(default, alias = "jurisdiction")]
    pub country: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub personal_code: String,
    pub device_id: Option<String>,
    pub device_type: Option<String>,
    pub enable_push: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<IssueKbanBody> for IssueKbanRequest {
    fn from(body: IssueKbanBody) -> Self {
        IssueKbanRequest {
            country: body.country,
            branch: body.branch,
            name: body.name,
            dob: body.dob,
            personal_code: body.personal_code,
            device_id: body.device_id,
            device_type: body.device_type,
            enable_push: body.enable_push,
            tags: body.tags,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueKbanResponse {
    pub kban: String,
    pub session_token: String,
    pub auth_code: String,
    pub mobileconfig: String,
    pub qr: String,
}

/// Verification names its subject by plain identifier or by sealed KBAN,
/// never both.
#[derive(Debug, Deserialize)]
pub struct VerifySessionRequest {
    pub identifier: Option<String>,
    /// Sealed KBAN as issued
    pub kban: Option<String>,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyAuthRequest {
    pub identifier: Option<String>,
    /// Sealed KBAN as issued
    pub kban: Option<String>,
    pub code: String,
}

#[derive(Debug, PartialEq, Eq)]
enum Subject {
    Identifier(String),
    Sealed(String),
}

impl Subject {
    fn from_fields(identifier: Option<String>, kban: Option<String>) -> Result<Self, ApiError> {
        match (identifier, kban) {
            (Some(identifier), None) => Ok(Subject::Identifier(identifier)),
            (None, Some(kban)) => Ok(Subject::Sealed(kban)),
            (Some(_), Some(_)) => Err(ApiError::InvalidRequest(
                "provide either identifier or kban, not both".to_string(),
            )),
            (None, None) => Err(ApiError::InvalidRequest(
                "identifier or kban is required".to_string(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

#[derive(Debug, Deserialize)]
pub struct DecryptRequest {
    pub kban: String,
}

#[derive(Debug, Serialize)]
pub struct DecryptResponse {
    pub identifier: String,
}

#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    pub identifier: String,
}

#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    pub revoked: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScoreRequest {
    pub identifier: String,
    pub risk_score: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScoreResponse {
    pub identifier: String,
    pub risk_score: u32,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub events: Vec<AuditEvent>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/kban
pub async fn issue_kban(
    State(state): State<Arc<AppState>>,
    caller: ApiCaller,
    ctx: RequestContext,
    Json(body): Json<IssueKbanBody>,
) -> Result<Json<IssueKbanResponse>, ApiError> {
    tracing::info!(owner = %caller.owner, plan = %caller.plan, "Issuing KBAN");

    let issued = state
        .kban_service
        .issue(body.into(), ctx.into())
        .await?;

    let mobileconfig = render_mobileconfig(&state.config.profile, &issued);
    let qr = qr_link(&state.config.qr_base_url, issued.kban.as_str()).to_string();

    Ok(Json(IssueKbanResponse {
        kban: issued.kban.into_string(),
        session_token: issued.session_token,
        auth_code: issued.auth_code,
        mobileconfig,
        qr,
    }))
}

/// POST /v1/kban/verify-session
pub async fn verify_session(
    State(state): State<Arc<AppState>>,
    caller: ApiCaller,
    Json(req): Json<VerifySessionRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let service = &state.kban_service;
    let valid = match Subject::from_fields(req.identifier, req.kban)? {
        Subject::Identifier(identifier) => {
            service.verify_session_token(&identifier, &req.token).await?
        }
        Subject::Sealed(kban) => {
            service
                .verify_sealed_session_token(&kban, &req.token)
                .await?
        }
    };

    tracing::debug!(owner = %caller.owner, valid, "Session token checked");
    Ok(Json(VerifyResponse { valid }))
}

/// POST /v1/kban/verify-auth
pub async fn verify_auth(
    State(state): State<Arc<AppState>>,
    caller: ApiCaller,
    Json(req): Json<VerifyAuthRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let service = &state.kban_service;
    let valid = match Subject::from_fields(req.identifier, req.kban)? {
        Subject::Identifier(identifier) => service.verify_auth_code(&identifier, &req.code).await?,
        Subject::Sealed(kban) => service.verify_sealed_auth_code(&kban, &req.code).await?,
    };

    tracing::debug!(owner = %caller.owner, valid, "Auth code checked");
    Ok(Json(VerifyResponse { valid }))
}

/// POST /v1/kban/decrypt
pub async fn decrypt_kban(
    State(state): State<Arc<AppState>>,
    caller: ApiCaller,
    Json(req): Json<DecryptRequest>,
) -> Result<Json<DecryptResponse>, ApiError> {
    let identifier = state.kban_service.decrypt(&req.kban)?;

    tracing::info!(
        owner = %caller.owner,
        kban = %hash_for_log(&identifier),
        "KBAN decrypted"
    );

    Ok(Json(DecryptResponse { identifier }))
}

/// POST /v1/kban/revoke
pub async fn revoke_kban(
    State(state): State<Arc<AppState>>,
    caller: ApiCaller,
    Json(req): Json<RevokeRequest>,
) -> Result<Json<RevokeResponse>, ApiError> {
    tracing::info!(
        owner = %caller.owner,
        kban = %hash_for_log(&req.identifier),
        "Revoking KBAN"
    );

    state.kban_service.revoke(&req.identifier).await?;

    Ok(Json(RevokeResponse { revoked: true }))
}

/// POST /v1/kban/risk
pub async fn update_risk_score(
    State(state): State<Arc<AppState>>,
    caller: ApiCaller,
    Json(req): Json<RiskScoreRequest>,
) -> Result<Json<RiskScoreResponse>, ApiError> {
    tracing::info!(
        owner = %caller.owner,
        kban = %hash_for_log(&req.identifier),
        risk_score = req.risk_score,
        "Updating risk score"
    );

    let record = state
        .kban_service
        .update_risk_score(&req.identifier, req.risk_score)
        .await?;

    Ok(Json(RiskScoreResponse {
        identifier: req.identifier,
        risk_score: record.metadata.risk_score,
    }))
}

/// GET /v1/kban/:identifier/events
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    _caller: ApiCaller,
    Path(identifier): Path<String>,
) -> Result<Json<EventsResponse>, ApiError> {
    let events = state.kban_service.events_for(&identifier).await?;
    Ok(Json(EventsResponse { events }))
}
