//! JWT token codec: issuing and verifying access and refresh tokens.
//!
//! All tokens are HS256-signed with a single process-wide secret. The codec is
//! built once at startup and shared read-only between requests.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use super::AuthError;
use crate::models::auth::TokenClaims;

/// Minimum signing secret length for HS256.
pub const MIN_SECRET_LEN: usize = 32;

/// Signs and verifies tokens with a server-held symmetric key.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_ttl_ms", &self.access_ttl.num_milliseconds())
            .field("refresh_ttl_ms", &self.refresh_ttl.num_milliseconds())
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec from the signing secret and the two TTLs (milliseconds).
    pub fn new(secret: &[u8], access_ttl_ms: i64, refresh_ttl_ms: i64) -> Result<Self, AuthError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::TokenError(format!(
                "signing secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if access_ttl_ms <= 0 || refresh_ttl_ms <= 0 {
            return Err(AuthError::TokenError("token TTLs must be positive".into()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: Duration::milliseconds(access_ttl_ms),
            refresh_ttl: Duration::milliseconds(refresh_ttl_ms),
        })
    }

    /// Access-token lifetime in milliseconds.
    pub fn access_ttl_ms(&self) -> i64 {
        self.access_ttl.num_milliseconds()
    }

    /// Refresh-token lifetime in milliseconds.
    pub fn refresh_ttl_ms(&self) -> i64 {
        self.refresh_ttl.num_milliseconds()
    }

    /// Issue an access token carrying the account id, username and roles.
    pub fn issue_access_token(
        &self,
        user_id: i64,
        username: &str,
        roles: &[String],
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = TokenClaims {
            sub: username.to_string(),
            user_id: Some(user_id),
            roles: Some(roles.to_vec()),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        self.sign(&claims)
    }

    /// Issue a refresh token expiring one refresh TTL after `now`.
    pub fn issue_refresh_token(&self, username: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        self.issue_refresh_token_until(username, now, now + self.refresh_ttl)
    }

    /// Issue a refresh token with an explicit issue and expiry instant.
    pub fn issue_refresh_token_until(
        &self,
        username: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = TokenClaims {
            sub: username.to_string(),
            user_id: None,
            roles: None,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        self.sign(&claims)
    }

    /// `true` only if the token parses, its signature is valid and it has not
    /// expired. Never fails.
    pub fn verify(&self, token: &str) -> bool {
        self.verify_at(token, Utc::now())
    }

    /// [`verify`](Self::verify) against an explicit instant. No leeway: a token
    /// whose expiry is at or before `now` is invalid.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        match self.decode(token) {
            Ok(claims) => claims.exp > now.timestamp(),
            Err(_) => false,
        }
    }

    /// Subject (username) of a signed token.
    pub fn subject_of(&self, token: &str) -> Result<String, AuthError> {
        Ok(self.decode(token)?.sub)
    }

    /// Account id of a signed access token.
    pub fn user_id_of(&self, token: &str) -> Result<i64, AuthError> {
        self.decode(token)?
            .user_id
            .ok_or_else(|| AuthError::Decoding("token has no userId claim".into()))
    }

    /// Roles of a signed access token.
    pub fn roles_of(&self, token: &str) -> Result<Vec<String>, AuthError> {
        self.decode(token)?
            .roles
            .ok_or_else(|| AuthError::Decoding("token has no roles claim".into()))
    }

    /// All claims of a signed access token in one parse.
    pub fn claims_of(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.decode(token)
    }

    fn sign(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
    }

    // Signature and structure only; expiry is checked by `verify_at`.
    fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        decode::<TokenClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::Decoding(e.to_string()))
    }
}
