use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kban_identity_core::KbanError;
use serde::Serialize;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    /// Sealed KBAN could not be opened. Never says why.
    #[error("Malformed ciphertext")]
    MalformedCiphertext,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<KbanError> for ApiError {
    fn from(error: KbanError) -> Self {
        match error {
            KbanError::InvalidInput(msg) => ApiError::InvalidRequest(msg),
            KbanError::MalformedCiphertext => ApiError::MalformedCiphertext,
            KbanError::NotFound => ApiError::NotFound("KBAN not found".to_string()),
            other => ApiError::Internal(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Invalid or missing API key".to_string(),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::MalformedCiphertext => (
                StatusCode::BAD_REQUEST,
                "MALFORMED_CIPHERTEXT",
                "KBAN could not be decrypted".to_string(),
            ),
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorDetails {
                code: code.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}
