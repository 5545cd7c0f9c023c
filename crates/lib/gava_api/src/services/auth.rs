//! Authentication service: login, refresh-token rotation and social login.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use gava_core::auth::AuthError;
use gava_core::auth::credentials::verify_credentials;
use gava_core::auth::jwt::TokenCodec;
use gava_core::auth::social::{SocialIdentityResolver, SocialProvider};
use gava_core::models::auth::{Account, NewAccount};
use gava_core::store::AccountStore;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::TokenResponse;

/// `tokenType` of every issued pair.
pub const TOKEN_TYPE: &str = "Bearer";

/// Orchestrates credential checks, token issuance and refresh-token rotation.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn AccountStore>,
    codec: Arc<TokenCodec>,
    social: Arc<dyn SocialIdentityResolver>,
}

impl fmt::Debug for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthService")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        codec: Arc<TokenCodec>,
        social: Arc<dyn SocialIdentityResolver>,
    ) -> Self {
        Self {
            store,
            codec,
            social,
        }
    }

    /// Authenticate with username + password.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<TokenResponse> {
        let account = verify_credentials(self.store.as_ref(), username, password).await?;
        let resp = self.generate_token(account).await?;
        info!(username, "login succeeded");
        Ok(resp)
    }

    /// Exchange a refresh token for a new pair. The presented token must be
    /// the one currently stored on the account; on success it is replaced and
    /// can never be used again.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenResponse> {
        if !self.codec.verify(refresh_token) {
            return Err(AppError::InvalidRefreshToken(
                "signature or expiry check failed".into(),
            ));
        }

        let username = self
            .codec
            .subject_of(refresh_token)
            .map_err(|e| AppError::InvalidRefreshToken(e.to_string()))?;

        let account = self
            .store
            .find_by_username_with_roles(&username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.clone()))?;

        if account.refresh_token.as_deref() != Some(refresh_token) {
            warn!(username, "refresh token does not match the stored token");
            return Err(AppError::InvalidRefreshToken(
                "token is not the account's current refresh token".into(),
            ));
        }

        let (access_token, new_refresh_token) = self.issue_pair(&account)?;
        let swapped = self
            .store
            .replace_refresh_token(account.id, refresh_token, &new_refresh_token)
            .await?;
        if !swapped {
            warn!(username, "refresh token superseded by a concurrent refresh");
            return Err(AppError::InvalidRefreshToken(
                "token was superseded concurrently".into(),
            ));
        }

        info!(username, "refresh token rotated");
        Ok(self.token_response(access_token, new_refresh_token))
    }

    /// Issue a fresh access/refresh pair for `account` and persist the refresh
    /// token on it, replacing any previous one.
    pub async fn generate_token(&self, mut account: Account) -> AppResult<TokenResponse> {
        let (access_token, refresh_token) = self.issue_pair(&account)?;
        account.refresh_token = Some(refresh_token.clone());
        self.store.save(&account).await?;
        Ok(self.token_response(access_token, refresh_token))
    }

    /// Verify a provider token, load or provision the matching account and
    /// issue a pair for it.
    pub async fn login_or_register_social(
        &self,
        provider: &str,
        token: &str,
    ) -> AppResult<TokenResponse> {
        let provider: SocialProvider = provider.parse()?;
        let identity = self.social.resolve(provider, token).await?;
        let username = identity.username();

        let account = match self.store.find_by_username_with_roles(&username).await? {
            Some(account) => account,
            None => self.provision_social(&username).await?,
        };

        let resp = self.generate_token(account).await?;
        info!(%provider, username, "social login succeeded");
        Ok(resp)
    }

    async fn provision_social(&self, username: &str) -> AppResult<Account> {
        match self.store.create(NewAccount::social(username)).await {
            Ok(account) => {
                info!(username, account_id = account.id, "provisioned social account");
                Ok(account)
            }
            // Lost a race with a concurrent first login; use the winner's row.
            Err(AuthError::DuplicateUsername(_)) => self
                .store
                .find_by_username_with_roles(username)
                .await?
                .ok_or_else(|| AppError::Internal(format!("account {username} vanished"))),
            Err(e) => Err(e.into()),
        }
    }

    fn issue_pair(&self, account: &Account) -> AppResult<(String, String)> {
        let now = Utc::now();
        let access_token =
            self.codec
                .issue_access_token(account.id, &account.username, &account.roles, now)?;
        let refresh_token = self.codec.issue_refresh_token(&account.username, now)?;
        Ok((access_token, refresh_token))
    }

    fn token_response(&self, access_token: String, refresh_token: String) -> TokenResponse {
        TokenResponse {
            token_type: TOKEN_TYPE.to_string(),
            access_token,
            refresh_token,
            expiration_time: self.codec.access_ttl_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use gava_core::auth::password::hash_password;
    use gava_core::models::auth::SocialIdentity;
    use gava_core::store::MemoryAccountStore;

    use super::*;

    const ACCESS_TTL_MS: i64 = 3_600_000;

    /// Provider stub: `ok-<id>` tokens resolve to `<id>`, anything else fails.
    struct StubResolver;

    #[async_trait]
    impl SocialIdentityResolver for StubResolver {
        async fn resolve(
            &self,
            provider: SocialProvider,
            access_token: &str,
        ) -> Result<SocialIdentity, AuthError> {
            let id = access_token
                .strip_prefix("ok-")
                .ok_or_else(|| AuthError::InvalidSocialToken("rejected".into()))?;
            Ok(SocialIdentity {
                provider: provider.name().to_string(),
                provider_id: id.to_string(),
                email: Some(format!("{id}@example.com")),
            })
        }
    }

    async fn service() -> (AuthService, Arc<MemoryAccountStore>) {
        let store = Arc::new(MemoryAccountStore::new());
        store
            .create(NewAccount::with_password("alice", hash_password("secret123").unwrap()))
            .await
            .unwrap();
        let codec = Arc::new(
            TokenCodec::new(b"test-secret-key-minimum-32-chars!!", ACCESS_TTL_MS, 86_400_000)
                .unwrap(),
        );
        let service = AuthService::new(store.clone(), codec, Arc::new(StubResolver));
        (service, store)
    }

    #[tokio::test]
    async fn login_stores_issued_refresh_token() {
        let (service, store) = service().await;
        let resp = service.login("alice", "secret123").await.unwrap();

        assert_eq!(resp.token_type, "Bearer");
        assert_eq!(resp.expiration_time, ACCESS_TTL_MS);
        let stored = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.refresh_token, Some(resp.refresh_token));
    }

    #[tokio::test]
    async fn login_failure_is_invalid_credentials() {
        let (service, _) = service().await;
        assert!(matches!(
            service.login("alice", "wrong").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("nobody", "secret123").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn second_login_revokes_first_refresh_token() {
        let (service, _) = service().await;
        let first = service.login("alice", "secret123").await.unwrap();
        let _second = service.login("alice", "secret123").await.unwrap();

        assert!(matches!(
            service.refresh(&first.refresh_token).await,
            Err(AppError::InvalidRefreshToken(_))
        ));
    }

    #[tokio::test]
    async fn refresh_rotates_and_old_token_dies() {
        let (service, store) = service().await;
        let first = service.login("alice", "secret123").await.unwrap();

        let second = service.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(second.access_token, first.access_token);
        assert_ne!(second.refresh_token, first.refresh_token);
        let stored = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some(second.refresh_token.as_str()));

        assert!(matches!(
            service.refresh(&first.refresh_token).await,
            Err(AppError::InvalidRefreshToken(_))
        ));
        // The new token still works.
        service.refresh(&second.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn refresh_for_deleted_subject_is_user_not_found() {
        let (service, _) = service().await;
        let orphan = service
            .codec
            .issue_refresh_token("ghost", Utc::now())
            .unwrap();
        assert!(matches!(
            service.refresh(&orphan).await,
            Err(AppError::UserNotFound(name)) if name == "ghost"
        ));
    }

    /// Suspends after every read so concurrent refreshes interleave between
    /// the stored-token check and the swap.
    struct YieldingStore(MemoryAccountStore);

    #[async_trait]
    impl AccountStore for YieldingStore {
        async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AuthError> {
            let found = self.0.find_by_username(username).await;
            tokio::task::yield_now().await;
            found
        }

        async fn exists_by_username(&self, username: &str) -> Result<bool, AuthError> {
            self.0.exists_by_username(username).await
        }

        async fn create(&self, account: NewAccount) -> Result<Account, AuthError> {
            self.0.create(account).await
        }

        async fn save(&self, account: &Account) -> Result<Account, AuthError> {
            self.0.save(account).await
        }

        async fn replace_refresh_token(
            &self,
            account_id: i64,
            expected: &str,
            new: &str,
        ) -> Result<bool, AuthError> {
            self.0.replace_refresh_token(account_id, expected, new).await
        }
    }

    #[tokio::test]
    async fn concurrent_refreshes_with_same_token_one_wins() {
        let inner = MemoryAccountStore::new();
        inner
            .create(NewAccount::with_password("alice", hash_password("secret123").unwrap()))
            .await
            .unwrap();
        let store = Arc::new(YieldingStore(inner));
        let codec = Arc::new(
            TokenCodec::new(b"test-secret-key-minimum-32-chars!!", ACCESS_TTL_MS, 86_400_000)
                .unwrap(),
        );
        let service = AuthService::new(store.clone(), codec, Arc::new(StubResolver));
        let first = service.login("alice", "secret123").await.unwrap();

        let (a, b) = tokio::join!(
            service.refresh(&first.refresh_token),
            service.refresh(&first.refresh_token)
        );

        let (winner, loser) = match (a, b) {
            (Ok(winner), Err(loser)) | (Err(loser), Ok(winner)) => (winner, loser),
            (a, b) => panic!("expected exactly one winner, got {:?} / {:?}", a.is_ok(), b.is_ok()),
        };
        assert!(matches!(loser, AppError::InvalidRefreshToken(_)));
        let stored = store.0.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.refresh_token, Some(winner.refresh_token));
    }

    #[tokio::test]
    async fn social_login_provisions_once() {
        let (service, store) = service().await;
        let first = service.login_or_register_social("kakao", "ok-42").await.unwrap();
        let second = service.login_or_register_social("kakao", "ok-42").await.unwrap();

        let codec = &service.codec;
        assert_eq!(
            codec.user_id_of(&first.access_token).unwrap(),
            codec.user_id_of(&second.access_token).unwrap()
        );
        assert_eq!(codec.subject_of(&first.access_token).unwrap(), "kakao_42");
        assert_eq!(store.len(), 2);

        let account = store.find_by_username("kakao_42").await.unwrap().unwrap();
        assert!(account.password_hash.is_none());
        assert_eq!(account.roles, vec!["USER"]);
    }

    #[tokio::test]
    async fn social_account_cannot_password_login() {
        let (service, _) = service().await;
        service.login_or_register_social("naver", "ok-n1").await.unwrap();
        assert!(matches!(
            service.login("naver_n1", "").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn social_login_errors() {
        let (service, store) = service().await;
        assert!(matches!(
            service.login_or_register_social("myspace", "ok-1").await,
            Err(AppError::InvalidProvider(_))
        ));
        assert!(matches!(
            service.login_or_register_social("kakao", "bad").await,
            Err(AppError::InvalidSocialToken(_))
        ));
        assert_eq!(store.len(), 1);
    }
}
