//! # kban-server
//!
//! HTTP surface for KBAN issuance: API-key gating, request parsing and the
//! mobile configuration / QR packaging around the core service.

#![warn(clippy::all)]

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

pub mod api;
pub mod api_keys;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod profile;
pub mod request_context;
pub mod state;

pub use config::Config;
pub use state::AppState;

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health checks
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Issuance
        .route("/v1/kban", post(api::kban::issue_kban))
        .route("/v1/kban/decrypt", post(api::kban::decrypt_kban))
        // Verification
        .route("/v1/kban/verify-session", post(api::kban::verify_session))
        .route("/v1/kban/verify-auth", post(api::kban::verify_auth))
        // Lifecycle
        .route("/v1/kban/revoke", post(api::kban::revoke_kban))
        .route("/v1/kban/risk", post(api::kban::update_risk_score))
        .route("/v1/kban/:identifier/events", get(api::kban::list_events))
        // Add middleware
        .layer(from_fn_with_state(
            Arc::clone(&state),
            middleware::request_id_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
