//! Username/password verification.

use tracing::debug;

use super::AuthError;
use super::password::verify_password;
use crate::models::auth::Account;
use crate::store::AccountStore;

/// Cost-10 bcrypt hash of a throwaway password. Checked when there is no real
/// hash so every failed login pays one bcrypt verification.
const DUMMY_HASH: &str = "$2b$10$fXnR0dYdR4qqXCFvBhptgukjpXa7El60yrfqQTGsALEHidoVO/WtK";

/// Check `username`/`password` against the stored bcrypt hash.
///
/// Unknown usernames, accounts without a password (social accounts) and
/// wrong passwords all fail with the same [`AuthError::InvalidCredentials`].
pub async fn verify_credentials(
    store: &dyn AccountStore,
    username: &str,
    password: &str,
) -> Result<Account, AuthError> {
    let Some(account) = store.find_by_username_with_roles(username).await? else {
        debug!(username, "login for unknown username");
        burn_verification(password);
        return Err(AuthError::InvalidCredentials);
    };

    let Some(hash) = account.password_hash.as_deref() else {
        debug!(username, "login for account without password");
        burn_verification(password);
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_password(password, hash)? {
        debug!(username, "password mismatch");
        return Err(AuthError::InvalidCredentials);
    }

    Ok(account)
}

fn burn_verification(password: &str) {
    let _ = verify_password(password, DUMMY_HASH);
}
