//! In-memory account store backed by `DashMap`.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::AccountStore;
use crate::auth::AuthError;
use crate::models::auth::{Account, NewAccount};

/// Account store keeping everything in process memory.
///
/// Accounts are keyed by username; each entry's shard lock serializes the
/// refresh-token compare-and-set.
#[derive(Debug)]
pub struct MemoryAccountStore {
    accounts: DashMap<String, Account>,
    next_id: AtomicI64,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of stored accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Default for MemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AuthError> {
        Ok(self.accounts.get(username).map(|a| a.clone()))
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self.accounts.contains_key(username))
    }

    async fn create(&self, account: NewAccount) -> Result<Account, AuthError> {
        match self.accounts.entry(account.username.clone()) {
            Entry::Occupied(_) => Err(AuthError::DuplicateUsername(account.username)),
            Entry::Vacant(slot) => {
                let mut roles = account.roles;
                roles.sort();
                roles.dedup();
                let created = Account {
                    id: self.next_id.fetch_add(1, Ordering::Relaxed),
                    username: account.username,
                    password_hash: account.password_hash,
                    roles,
                    refresh_token: None,
                };
                slot.insert(created.clone());
                Ok(created)
            }
        }
    }

    async fn save(&self, account: &Account) -> Result<Account, AuthError> {
        let mut stored = self
            .accounts
            .get_mut(&account.username)
            .filter(|a| a.id == account.id)
            .ok_or_else(|| AuthError::UserNotFound(account.username.clone()))?;
        stored.password_hash = account.password_hash.clone();
        stored.refresh_token = account.refresh_token.clone();
        Ok(stored.clone())
    }

    async fn replace_refresh_token(
        &self,
        account_id: i64,
        expected: &str,
        new: &str,
    ) -> Result<bool, AuthError> {
        let Some(mut stored) = self.accounts.iter_mut().find(|a| a.id == account_id) else {
            return Ok(false);
        };
        if stored.refresh_token.as_deref() != Some(expected) {
            return Ok(false);
        }
        stored.refresh_token = Some(new.to_string());
        Ok(true)
    }
}
