//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use huddle_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// HTTP-facing wrapper around [`AppError`].
///
/// Handlers return `Result<_, ApiError>` so `?` works directly on
/// engine results.
#[derive(Debug)]
pub struct ApiError(pub AppError);

/// Convenience alias for handler return types.
pub type ApiResult<T> = Result<T, ApiError>;

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// Status and wire code for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::SessionNotFound => StatusCode::NOT_FOUND,
        ErrorKind::SessionFull => StatusCode::FORBIDDEN,
        ErrorKind::InvalidPassword => StatusCode::UNAUTHORIZED,
        ErrorKind::AdminRequired => StatusCode::FORBIDDEN,
        ErrorKind::NotParticipant => StatusCode::FORBIDDEN,
        ErrorKind::ParticipantNotFound => StatusCode::NOT_FOUND,
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Storage
        | ErrorKind::Configuration
        | ErrorKind::Serialization
        | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = status_for(err.kind);

        // Internal detail stays in the logs.
        let (code, message) = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %err, "Internal server error");
            (
                ErrorKind::Internal.to_string(),
                "Internal server error".to_string(),
            )
        } else {
            (err.kind.to_string(), err.message)
        };

        let body = ApiErrorResponse {
            error: code,
            message,
        };
        (status, Json(body)).into_response()
    }
}
