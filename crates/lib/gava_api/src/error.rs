//! Application error types.
//!
//! Every failure leaves the API as the same envelope:
//! `{status, errorCode, message, timestamp}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use gava_core::auth::AuthError;
use thiserror::Error;
use tracing::{debug, error};

use crate::models::ErrorResponse;

/// Client-facing message for every credential failure.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Bad signature, expired, or superseded by a newer refresh token. The
    /// detail is logged only.
    #[error("Invalid refresh token: {0}")]
    InvalidRefreshToken(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Unsupported social provider: {0}")]
    InvalidProvider(String),

    #[error("Invalid social token: {0}")]
    InvalidSocialToken(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Duplicate username: {0}")]
    DuplicateUsername(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials
            | AppError::InvalidRefreshToken(_)
            | AppError::UserNotFound(_)
            | AppError::InvalidSocialToken(_)
            | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidProvider(_)
            | AppError::Validation(_)
            | AppError::DuplicateUsername(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::InvalidRefreshToken(_) => "INVALID_REFRESH_TOKEN",
            AppError::UserNotFound(_) => "USER_NOT_FOUND",
            AppError::InvalidProvider(_) => "INVALID_PROVIDER",
            AppError::InvalidSocialToken(_) => "INVALID_SOCIAL_TOKEN",
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::DuplicateUsername(_) => "DUPLICATE_USERNAME",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Message safe to show the client.
    fn client_message(&self) -> String {
        match self {
            AppError::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE.into(),
            AppError::InvalidRefreshToken(_) => "Refresh token is invalid".into(),
            AppError::UserNotFound(_) => "User not found".into(),
            AppError::InvalidProvider(p) => format!("Unsupported social provider: {p}"),
            AppError::InvalidSocialToken(_) => "Social token verification failed".into(),
            AppError::Validation(m) => m.clone(),
            AppError::DuplicateUsername(u) => format!("Username is already taken: {u}"),
            AppError::Unauthorized(m) => m.clone(),
            AppError::Internal(_) => "Internal server error".into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Internal(detail) => error!(detail = %detail, "request failed"),
            other => debug!(code = other.code(), "{other}"),
        }
        let status = self.status();
        let body = Json(ErrorResponse {
            status: status.as_u16(),
            error_code: self.code().to_string(),
            message: self.client_message(),
            timestamp: Utc::now(),
        });
        (status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => AppError::InvalidCredentials,
            AuthError::InvalidRefreshToken(msg) => AppError::InvalidRefreshToken(msg),
            AuthError::UserNotFound(name) => AppError::UserNotFound(name),
            AuthError::InvalidProvider(p) => AppError::InvalidProvider(p),
            AuthError::InvalidSocialToken(msg) => AppError::InvalidSocialToken(msg),
            AuthError::DuplicateUsername(name) => AppError::DuplicateUsername(name),
            AuthError::ValidationError(msg) => AppError::Validation(msg),
            AuthError::Decoding(msg) | AuthError::TokenError(msg) | AuthError::Internal(msg) => {
                AppError::Internal(msg)
            }
            AuthError::DbError(e) => AppError::Internal(e.to_string()),
        }
    }
}
