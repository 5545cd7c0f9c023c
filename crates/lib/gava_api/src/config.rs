//! API server configuration.

use std::fmt;

use gava_core::auth::jwt::MIN_SECRET_LEN;
use thiserror::Error;

/// Default timeout for social provider userinfo calls.
const DEFAULT_SOCIAL_TIMEOUT_MS: u64 = 5_000;

/// Default listener address.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Shortest accepted token TTL; expiry claims have one-second resolution.
const MIN_TTL_MS: i64 = 1_000;

/// Configuration errors, raised once at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8080").
    pub bind_addr: String,
    /// PostgreSQL connection URL; `None` runs on the in-memory store.
    pub database_url: Option<String>,
    /// JWT signing secret (HS256).
    pub jwt_secret: String,
    /// Access-token lifetime in milliseconds.
    pub access_token_ttl_ms: i64,
    /// Refresh-token lifetime in milliseconds.
    pub refresh_token_ttl_ms: i64,
    /// Timeout for social provider userinfo calls in milliseconds.
    pub social_timeout_ms: u64,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl_ms", &self.access_token_ttl_ms)
            .field("refresh_token_ttl_ms", &self.refresh_token_ttl_ms)
            .field("social_timeout_ms", &self.social_timeout_ms)
            .finish()
    }
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable                    | Default                  |
    /// |-----------------------------|--------------------------|
    /// | `JWT_SECRET`                | required, >= 32 bytes    |
    /// | `JWT_EXPIRATION_MS`         | required                 |
    /// | `JWT_REFRESH_EXPIRATION_MS` | required                 |
    /// | `SOCIAL_HTTP_TIMEOUT_MS`    | `5000`                   |
    /// | `BIND_ADDR`                 | `127.0.0.1:8080`         |
    /// | `DATABASE_URL`              | unset (in-memory store)  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET",
                reason: format!("must be at least {MIN_SECRET_LEN} bytes"),
            });
        }

        let access_token_ttl_ms = parse_ttl("JWT_EXPIRATION_MS", get("JWT_EXPIRATION_MS"))?;
        let refresh_token_ttl_ms =
            parse_ttl("JWT_REFRESH_EXPIRATION_MS", get("JWT_REFRESH_EXPIRATION_MS"))?;

        let social_timeout_ms = match get("SOCIAL_HTTP_TIMEOUT_MS") {
            None => DEFAULT_SOCIAL_TIMEOUT_MS,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => ms,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "SOCIAL_HTTP_TIMEOUT_MS",
                        reason: format!("expected a positive integer, got {raw:?}"),
                    });
                }
            },
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            database_url: get("DATABASE_URL"),
            jwt_secret,
            access_token_ttl_ms,
            refresh_token_ttl_ms,
            social_timeout_ms,
        })
    }
}

fn parse_ttl(var: &'static str, raw: Option<String>) -> Result<i64, ConfigError> {
    let raw = raw.ok_or(ConfigError::Missing(var))?;
    match raw.trim().parse::<i64>() {
        Ok(ms) if ms >= MIN_TTL_MS => Ok(ms),
        Ok(ms) => Err(ConfigError::Invalid {
            var,
            reason: format!("must be at least {MIN_TTL_MS} ms, got {ms}"),
        }),
        Err(e) => Err(ConfigError::Invalid {
            var,
            reason: format!("{e}"),
        }),
    }
}
