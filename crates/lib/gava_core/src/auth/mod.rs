//! Authentication logic.
//!
//! Provides the token codec, password hashing, credential verification and
//! social-provider identity resolution shared by `gava_api`.

pub mod credentials;
pub mod jwt;
pub mod password;
pub mod social;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username, missing password hash, or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid refresh token: {0}")]
    InvalidRefreshToken(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Unsupported social provider: {0}")]
    InvalidProvider(String),

    #[error("Social token verification failed: {0}")]
    InvalidSocialToken(String),

    /// A token could not be parsed while extracting claims.
    #[error("Token decoding failed: {0}")]
    Decoding(String),

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Duplicate username: {0}")]
    DuplicateUsername(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
