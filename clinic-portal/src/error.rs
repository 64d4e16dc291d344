//! Error types for clinic-portal handlers
//!
//! Every failure leaves the service as `{"error": message}` with a matching
//! status code. Lock exhaustion additionally carries `"rateLimited": true` so
//! callers know a retry is worthwhile.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Body text for every 500; the detail goes to the log only
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed parameter (400)
    #[error("{0}")]
    BadRequest(String),

    /// Missing or wrong API key (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Write collides with an existing row (409)
    #[error("{0}")]
    Conflict(String),

    /// Store too busy; retry later (429)
    #[error("{0}")]
    RateLimited(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<clinic_common::Error> for ApiError {
    fn from(err: clinic_common::Error) -> Self {
        use clinic_common::Error;

        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::RateLimited(msg) => ApiError::RateLimited(msg),
            Error::Database(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                ApiError::Conflict(db_err.message().to_string())
            }
            other if other.is_database_locked() => ApiError::RateLimited(other.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            ApiError::RateLimited(msg) => {
                warn!("Rate limited: {}", msg);
                json!({ "error": "Rate limited, please retry", "rateLimited": true })
            }
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                json!({ "error": INTERNAL_ERROR_MESSAGE })
            }
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Require a non-blank string field, naming it in the 400 otherwise
pub fn required(value: Option<String>, name: &str) -> ApiResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", name)))
}
