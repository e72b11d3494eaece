use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

use crate::{api::helpers::hash_for_log, error::ApiError, state::AppState};

/// Caller authenticated by an allow-listed API key
///
/// The key is read from `Authorization: Bearer <key>`; a bare key is also
/// accepted.
#[derive(Debug, Clone)]
pub struct ApiCaller {
    pub owner: String,
    pub plan: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for ApiCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("");

        let key = auth_header
            .strip_prefix("Bearer ")
            .unwrap_or(auth_header)
            .trim();

        if key.is_empty() {
            return Err(ApiError::Unauthorized);
        }

        match state.config.api_keys.meta(key) {
            Some(meta) => Ok(ApiCaller {
                owner: meta.owner.clone(),
                plan: meta.plan.clone(),
            }),
            None => {
                tracing::warn!(key = %hash_for_log(key), "Rejected unknown API key");
                Err(ApiError::Unauthorized)
            }
        }
    }
}
