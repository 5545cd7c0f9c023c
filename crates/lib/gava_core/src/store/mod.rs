//! Account store gateway.
//!
//! The only way authentication code touches persistence. Two backends:
//! [`PgAccountStore`] for PostgreSQL and [`MemoryAccountStore`] for tests and
//! database-less development runs.

mod memory;
mod postgres;

use async_trait::async_trait;

pub use memory::MemoryAccountStore;
pub use postgres::PgAccountStore;

use crate::auth::AuthError;
use crate::models::auth::{Account, NewAccount};

/// Persistence operations consumed by the authentication flows.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Look up an account by its unique username.
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AuthError>;

    /// Look up an account with its roles loaded.
    ///
    /// Both bundled stores load roles eagerly, so this defaults to
    /// [`find_by_username`](Self::find_by_username). Stores that load roles
    /// lazily override it.
    async fn find_by_username_with_roles(
        &self,
        username: &str,
    ) -> Result<Option<Account>, AuthError> {
        self.find_by_username(username).await
    }

    /// Whether an account with this username exists.
    async fn exists_by_username(&self, username: &str) -> Result<bool, AuthError>;

    /// Persist a new account. Fails with [`AuthError::DuplicateUsername`] if
    /// the username is taken.
    async fn create(&self, account: NewAccount) -> Result<Account, AuthError>;

    /// Persist the mutable fields (password hash, refresh token) of an
    /// existing account.
    async fn save(&self, account: &Account) -> Result<Account, AuthError>;

    /// Atomically replace the stored refresh token with `new` if, and only if,
    /// it currently equals `expected`. Returns whether the swap happened.
    async fn replace_refresh_token(
        &self,
        account_id: i64,
        expected: &str,
        new: &str,
    ) -> Result<bool, AuthError>;
}
