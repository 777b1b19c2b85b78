//! Errors raised by the authentication/authorization protocol.
//!
//! These are expected traffic (bots, expired sessions, missing roles) and are
//! logged at debug/info by the middleware, never at error level.
use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecurityError {
    /// The presented credential does not authenticate with any provider,
    /// or is malformed.
    #[error("Access denied: invalid credentials")]
    InvalidCredentials,

    /// The operation requires authentication; the caller is anonymous.
    #[error("Access denied: authentication required")]
    Unauthenticated,

    /// The caller is authenticated but lacks the required role.
    #[error("Access denied: insufficient privileges")]
    Unauthorized,

    /// The token's validity window has passed. Surfaced through the
    /// invalid-credentials path; the cache entry is evicted as a side effect.
    #[error("token is expired")]
    TokenExpired,

    /// Token parse or signature verification failed. Never cached.
    #[error("invalid token: {0}")]
    InvalidToken(String),
}

impl SecurityError {
    /// Error kind name, used in the structured error response body.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "InvalidCredentials",
            Self::Unauthenticated => "Unauthenticated",
            Self::Unauthorized => "Unauthorized",
            Self::TokenExpired => "TokenExpired",
            Self::InvalidToken(_) => "InvalidToken",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials
            | Self::Unauthenticated
            | Self::TokenExpired
            | Self::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            Self::Unauthorized => StatusCode::FORBIDDEN,
        }
    }
}
