//! Social-provider identity verification.
//!
//! Exchanges a provider access token for a stable provider-scoped user id by
//! calling the provider's userinfo endpoint once. No retries: any transport
//! error, timeout, non-2xx status or incomplete body is a verification failure.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::AuthError;
use crate::models::auth::SocialIdentity;

const KAKAO_USERINFO_URL: &str = "https://kapi.kakao.com/v2/user/me";
const NAVER_USERINFO_URL: &str = "https://openapi.naver.com/v1/nid/me";

/// Supported social login providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocialProvider {
    Kakao,
    Naver,
}

/// How the provider expects the access token to be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthHeaderStyle {
    /// `Authorization: Bearer <token>`
    Bearer,
}

/// Everything needed to call one provider and read its answer.
#[derive(Debug, Clone, Copy)]
pub struct ProviderBinding {
    pub userinfo_url: &'static str,
    pub auth_header: AuthHeaderStyle,
    /// Extra request headers the provider documents.
    pub extra_headers: &'static [(&'static str, &'static str)],
    /// Pulls `(id, email)` out of the userinfo body.
    pub extract: fn(&Value) -> Option<(String, String)>,
}

impl SocialProvider {
    pub const ALL: [SocialProvider; 2] = [SocialProvider::Kakao, SocialProvider::Naver];

    /// Lowercase provider name used on the wire and in synthetic usernames.
    pub fn name(self) -> &'static str {
        match self {
            SocialProvider::Kakao => "kakao",
            SocialProvider::Naver => "naver",
        }
    }

    pub fn binding(self) -> ProviderBinding {
        match self {
            SocialProvider::Kakao => ProviderBinding {
                userinfo_url: KAKAO_USERINFO_URL,
                auth_header: AuthHeaderStyle::Bearer,
                extra_headers: &[(
                    "content-type",
                    "application/x-www-form-urlencoded;charset=utf-8",
                )],
                extract: extract_kakao,
            },
            SocialProvider::Naver => ProviderBinding {
                userinfo_url: NAVER_USERINFO_URL,
                auth_header: AuthHeaderStyle::Bearer,
                extra_headers: &[],
                extract: extract_naver,
            },
        }
    }

    /// Build a [`SocialIdentity`] from a userinfo body. `None` unless both the
    /// id and the email are present.
    pub fn extract_identity(self, body: &Value) -> Option<SocialIdentity> {
        let (provider_id, email) = (self.binding().extract)(body)?;
        Some(SocialIdentity {
            provider: self.name().to_string(),
            provider_id,
            email: Some(email),
        })
    }
}

impl fmt::Display for SocialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SocialProvider {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SocialProvider::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| AuthError::InvalidProvider(s.to_string()))
    }
}

/// Kakao: `{"id": 123, "kakao_account": {"email": "..."}}`
fn extract_kakao(body: &Value) -> Option<(String, String)> {
    let id = scalar_string(body.get("id")?)?;
    let email = scalar_string(body.get("kakao_account")?.get("email")?)?;
    Some((id, email))
}

/// Naver: `{"response": {"id": "...", "email": "..."}}`
fn extract_naver(body: &Value) -> Option<(String, String)> {
    let response = body.get("response")?;
    let id = scalar_string(response.get("id")?)?;
    let email = scalar_string(response.get("email")?)?;
    Some((id, email))
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Resolves a provider access token to the provider's user identity.
#[async_trait]
pub trait SocialIdentityResolver: Send + Sync {
    async fn resolve(
        &self,
        provider: SocialProvider,
        access_token: &str,
    ) -> Result<SocialIdentity, AuthError>;
}

/// [`SocialIdentityResolver`] calling the real provider endpoints over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpSocialResolver {
    client: Client,
    endpoints: HashMap<SocialProvider, String>,
}

impl HttpSocialResolver {
    /// Every call is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            client,
            endpoints: HashMap::new(),
        })
    }

    /// Point a provider at a different userinfo URL (staging, tests).
    pub fn with_endpoint(mut self, provider: SocialProvider, url: impl Into<String>) -> Self {
        self.endpoints.insert(provider, url.into());
        self
    }

    fn endpoint(&self, provider: SocialProvider) -> &str {
        self.endpoints
            .get(&provider)
            .map(String::as_str)
            .unwrap_or(provider.binding().userinfo_url)
    }
}

#[async_trait]
impl SocialIdentityResolver for HttpSocialResolver {
    async fn resolve(
        &self,
        provider: SocialProvider,
        access_token: &str,
    ) -> Result<SocialIdentity, AuthError> {
        let binding = provider.binding();
        let mut request = match binding.auth_header {
            AuthHeaderStyle::Bearer => self.client.get(self.endpoint(provider)).bearer_auth(access_token),
        };
        for (name, value) in binding.extra_headers {
            request = request.header(*name, *value);
        }

        let resp = request.send().await.map_err(|e| {
            warn!(%provider, timeout = e.is_timeout(), "userinfo request failed: {e}");
            AuthError::InvalidSocialToken(format!("{provider} userinfo request failed"))
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            warn!(%provider, %status, "userinfo rejected token");
            return Err(AuthError::InvalidSocialToken(format!(
                "{provider} userinfo returned {status}"
            )));
        }

        let body: Value = resp.json().await.map_err(|e| {
            warn!(%provider, "userinfo body unreadable: {e}");
            AuthError::InvalidSocialToken(format!("{provider} userinfo body unreadable"))
        })?;

        let identity = provider.extract_identity(&body).ok_or_else(|| {
            AuthError::InvalidSocialToken(format!("{provider} id or email not found"))
        })?;
        debug!(%provider, provider_id = %identity.provider_id, "social identity resolved");
        Ok(identity)
    }
}
