//! PostgreSQL account store.

use async_trait::async_trait;
use sqlx::PgPool;

use super::AccountStore;
use crate::auth::AuthError;
use crate::models::auth::{Account, NewAccount};

type AccountRow = (i64, String, Option<String>, Option<String>, Vec<String>);

const SELECT_ACCOUNT: &str = "SELECT a.id, a.username, a.password_hash, a.refresh_token, \
            COALESCE(array_agg(r.role ORDER BY r.role) FILTER (WHERE r.role IS NOT NULL), '{}') \
     FROM accounts a \
     LEFT JOIN account_roles r ON r.account_id = a.id \
     WHERE a.username = $1 \
     GROUP BY a.id";

fn account_from_row((id, username, password_hash, refresh_token, roles): AccountRow) -> Account {
    Account {
        id,
        username,
        password_hash,
        roles,
        refresh_token,
    }
}

/// Account store over the `accounts` and `account_roles` tables.
#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AuthError> {
        let row = sqlx::query_as::<_, AccountRow>(SELECT_ACCOUNT)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(account_from_row))
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, AuthError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM accounts WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create(&self, account: NewAccount) -> Result<Account, AuthError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_scalar::<_, i64>(
            "INSERT INTO accounts (username, password_hash) VALUES ($1, $2) RETURNING id",
        )
        .bind(&account.username)
        .bind(&account.password_hash)
        .fetch_one(&mut *tx)
        .await;

        let id = match inserted {
            Ok(id) => id,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(AuthError::DuplicateUsername(account.username));
            }
            Err(e) => return Err(e.into()),
        };

        let mut roles = account.roles;
        roles.sort();
        roles.dedup();
        for role in &roles {
            sqlx::query("INSERT INTO account_roles (account_id, role) VALUES ($1, $2)")
                .bind(id)
                .bind(role)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(Account {
            id,
            username: account.username,
            password_hash: account.password_hash,
            roles,
            refresh_token: None,
        })
    }

    async fn save(&self, account: &Account) -> Result<Account, AuthError> {
        let result = sqlx::query(
            "UPDATE accounts SET password_hash = $2, refresh_token = $3, updated_at = now() \
             WHERE id = $1",
        )
        .bind(account.id)
        .bind(&account.password_hash)
        .bind(&account.refresh_token)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound(account.username.clone()));
        }
        Ok(account.clone())
    }

    async fn replace_refresh_token(
        &self,
        account_id: i64,
        expected: &str,
        new: &str,
    ) -> Result<bool, AuthError> {
        // Single conditional UPDATE: the row lock makes concurrent swaps on the
        // same expected value mutually exclusive.
        let result = sqlx::query(
            "UPDATE accounts SET refresh_token = $3, updated_at = now() \
             WHERE id = $1 AND refresh_token = $2",
        )
        .bind(account_id)
        .bind(expected)
        .bind(new)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
