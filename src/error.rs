//! Application-wide error type.
//!
//! Responsibility:
//! - unify security / validation / internal errors into one `AppError`
//! - IntoResponse implementation (HTTP status + JSON error body)
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::duration::DurationParseError;
use crate::services::auth::error::SecurityError;
use crate::services::auth::user_info::IdentityError;

/// JSON body of every error response:
/// `{"status": "UNAUTHORIZED", "error": "InvalidCredentials", "message": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Security(#[from] SecurityError),
    #[error("{message}")]
    BadRequest { message: String },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(e: IdentityError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl From<DurationParseError> for AppError {
    fn from(e: DurationParseError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AppError::Security(e) => (e.status(), e.kind(), e.to_string()),
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, "BadRequest", message),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            status: status
                .canonical_reason()
                .unwrap_or("UNKNOWN")
                .to_ascii_uppercase()
                .replace(' ', "_"),
            error,
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_errors_map_to_http_statuses() {
        let resp = AppError::from(SecurityError::InvalidCredentials).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = AppError::from(SecurityError::Unauthorized).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn body_carries_status_name_and_kind() {
        let body = ErrorResponse {
            status: StatusCode::UNAUTHORIZED
                .canonical_reason()
                .unwrap()
                .to_ascii_uppercase()
                .replace(' ', "_"),
            error: SecurityError::InvalidCredentials.kind(),
            message: SecurityError::InvalidCredentials.to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "UNAUTHORIZED",
                "error": "InvalidCredentials",
                "message": "Access denied: invalid credentials"
            })
        );
    }
}
