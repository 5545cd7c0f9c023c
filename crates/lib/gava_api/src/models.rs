//! API request and response models (camelCase on the wire).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extract::{FieldError, Validate, not_blank};

/// `POST /api/auth/login`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        not_blank(&mut errors, "username", &self.username);
        not_blank(&mut errors, "password", &self.password);
        errors
    }
}

/// `POST /api/auth/refresh`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

impl Validate for RefreshRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        not_blank(&mut errors, "refreshToken", &self.refresh_token);
        errors
    }
}

/// `POST /api/auth/social/login`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLoginRequest {
    /// Provider name, e.g. `kakao`, `naver`.
    #[serde(default)]
    pub provider: String,
    /// Provider-issued access token.
    #[serde(default)]
    pub token: String,
}

impl Validate for SocialLoginRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        not_blank(&mut errors, "provider", &self.provider);
        not_blank(&mut errors, "token", &self.token);
        errors
    }
}

/// `POST /api/users/signup`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

const PASSWORD_SYMBOLS: &str = "!@#$%^&*()_+-=[]{};':\",.<>?/";

fn is_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ('가'..='힣').contains(&c)
}

fn is_password_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c)
}

impl Validate for SignupRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if not_blank(&mut errors, "username", &self.username)
            && !self.username.chars().all(is_username_char)
        {
            errors.push(FieldError::new(
                "username",
                "only letters, digits and Hangul are allowed",
            ));
        }
        if not_blank(&mut errors, "password", &self.password)
            && !self.password.chars().all(is_password_char)
        {
            errors.push(FieldError::new(
                "password",
                "only letters, digits and common symbols are allowed",
            ));
        }
        errors
    }
}

/// Token pair issued by login, refresh and social login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Always `Bearer`.
    pub token_type: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Access-token lifetime in milliseconds (a duration, not a timestamp).
    pub expiration_time: i64,
}

/// `GET /api/users/me`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoResponse {
    pub id: i64,
    pub username: String,
    pub roles: Vec<String>,
}

/// Uniform error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status: u16,
    pub error_code: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}
