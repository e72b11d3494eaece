use axum::{extract::State, response::Json};
use kban_identity_core::AuditLog;
use serde::Serialize;
use std::sync::Arc;

use crate::{error::ApiError, state::AppState};

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    status: &'static str,
    storage: &'static str,
    ephemeral_key: bool,
    audit_events: usize,
}

/// Readiness check endpoint
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReadinessResponse>, ApiError> {
    let audit_events = state
        .kban_service
        .audit_log()
        .len()
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ReadinessResponse {
        status: "ready",
        storage: "memory",
        ephemeral_key: state.config.ephemeral_key,
        audit_events,
    }))
}
