//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API request/response
//! models in `gava_api` (which carry camelCase renames and validation).

use serde::{Deserialize, Serialize};

/// Role granted to every newly created account.
pub const DEFAULT_ROLE: &str = "USER";

/// A registered or social-provisioned principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    /// Globally unique. `{provider}_{providerUserId}` for social accounts.
    pub username: String,
    /// bcrypt hash; `None` for pure social accounts, which can never pass
    /// local credential login.
    pub password_hash: Option<String>,
    /// Non-empty set of role labels, sorted.
    pub roles: Vec<String>,
    /// The most recently issued refresh token, overwritten on every issue.
    pub refresh_token: Option<String>,
}

/// Account fields supplied at creation; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password_hash: Option<String>,
    pub roles: Vec<String>,
}

impl NewAccount {
    /// A credential account with the default role.
    pub fn with_password(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: Some(password_hash.into()),
            roles: vec![DEFAULT_ROLE.to_string()],
        }
    }

    /// A social account with the default role and no password.
    pub fn social(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: None,
            roles: vec![DEFAULT_ROLE.to_string()],
        }
    }
}

/// Identity returned by a social provider's userinfo endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialIdentity {
    /// Provider name, e.g. `kakao`.
    pub provider: String,
    /// Provider-scoped stable subject id.
    pub provider_id: String,
    pub email: Option<String>,
}

impl SocialIdentity {
    /// Synthetic local username: `{provider}_{providerId}`.
    pub fn username(&self) -> String {
        format!("{}_{}", self.provider, self.provider_id)
    }
}

/// JWT claims embedded in access and refresh tokens.
///
/// Refresh tokens carry only `sub`, `iat`, `exp` and `jti`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the username.
    pub sub: String,
    /// Numeric account id (access tokens only).
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// Role labels (access tokens only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Random token id; keeps tokens issued within the same second distinct.
    pub jti: String,
}
