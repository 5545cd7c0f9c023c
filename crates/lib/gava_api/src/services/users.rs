//! Local account registration and profile lookup.

use gava_core::auth::password::hash_password;
use gava_core::models::auth::NewAccount;
use gava_core::store::AccountStore;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::Identity;
use crate::models::UserInfoResponse;

/// Register a password account with the default role.
pub async fn signup(store: &dyn AccountStore, username: &str, password: &str) -> AppResult<()> {
    if store.exists_by_username(username).await? {
        return Err(AppError::DuplicateUsername(username.to_string()));
    }

    let password_hash = hash_password(password)?;
    // A concurrent signup may still win; the store reports it as a duplicate.
    let account = store
        .create(NewAccount::with_password(username, password_hash))
        .await?;

    info!(username, account_id = account.id, "account registered");
    Ok(())
}

/// Profile of the authenticated caller, read fresh from the store.
pub async fn current_user_info(
    store: &dyn AccountStore,
    identity: &Identity,
) -> AppResult<UserInfoResponse> {
    let account = store
        .find_by_username_with_roles(&identity.username)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".into()))?;

    Ok(UserInfoResponse {
        id: account.id,
        username: account.username,
        roles: account.roles,
    })
}
