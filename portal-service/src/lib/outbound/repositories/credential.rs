use async_trait::async_trait;
use auth::PasswordVersion;
use sqlx::FromRow;
use sqlx::PgPool;

use super::store_error;
use crate::account::errors::AccountError;
use crate::account::models::safe_username;
use crate::account::models::AccountContact;
use crate::account::models::ClanMembership;
use crate::account::models::Credential;
use crate::account::models::EmailAddress;
use crate::account::models::NewAccount;
use crate::account::models::UserId;
use crate::account::models::Username;
use crate::account::ports::CredentialStore;
use crate::account::privileges::Privileges;
use crate::account::privileges::UserFlags;

pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CredentialRow {
    id: i64,
    username: String,
    password_hash: String,
    password_version: i32,
    privileges: i64,
    flags: i64,
}

impl TryFrom<CredentialRow> for Credential {
    type Error = AccountError;

    fn try_from(row: CredentialRow) -> Result<Self, Self::Error> {
        Ok(Credential {
            user_id: UserId(row.id),
            username: row.username,
            password_hash: row.password_hash,
            password_version: PasswordVersion::from_i32(row.password_version)?,
            privileges: Privileges::from_bits(row.privileges as u64),
            flags: UserFlags::from_bits(row.flags as u64),
        })
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<Credential>, AccountError> {
        sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, username, password_hash, password_version, privileges, flags
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .map(Credential::try_from)
        .transpose()
    }

    async fn find_by_login(&self, identifier: &str) -> Result<Option<Credential>, AccountError> {
        sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, username, password_hash, password_version, privileges, flags
            FROM users
            WHERE username_safe = $1 OR LOWER(email) = LOWER($2)
            ORDER BY (username_safe = $1) DESC
            LIMIT 1
            "#,
        )
        .bind(safe_username(identifier))
        .bind(identifier.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .map(Credential::try_from)
        .transpose()
    }

    async fn find_contact(
        &self,
        identifier: &str,
    ) -> Result<Option<AccountContact>, AccountError> {
        let row: Option<(i64, String, String)> = sqlx::query_as(
            r#"
            SELECT id, username, email
            FROM users
            WHERE username_safe = $1 OR LOWER(email) = LOWER($2)
            ORDER BY (username_safe = $1) DESC
            LIMIT 1
            "#,
        )
        .bind(safe_username(identifier))
        .bind(identifier.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.map(|(id, username, email)| AccountContact {
            user_id: UserId(id),
            username,
            email,
        }))
    }

    async fn clan_membership(&self, id: UserId) -> Result<Option<ClanMembership>, AccountError> {
        let row: Option<(i64, i32)> =
            sqlx::query_as("SELECT clan_id, perms FROM user_clans WHERE user_id = $1")
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_error)?;

        Ok(row.map(|(clan_id, perms)| ClanMembership::from_perms(clan_id, perms)))
    }

    async fn username_exists(&self, username: &Username) -> Result<bool, AccountError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username_safe = $1)")
            .bind(username.safe())
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn email_exists(&self, email: &EmailAddress) -> Result<bool, AccountError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
            .bind(email.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn username_in_history(&self, username: &Username) -> Result<bool, AccountError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_name_history WHERE username_safe = $1)",
        )
        .bind(username.safe())
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)
    }

    async fn create(&self, account: NewAccount) -> Result<UserId, AccountError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (
                username, username_safe, email, password_hash, password_version,
                privileges, api_key, registered_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(account.username.as_str())
        .bind(account.username.safe())
        .bind(account.email.as_str())
        .bind(&account.password_hash)
        .bind(PasswordVersion::Current.as_i32())
        .bind(account.privileges.bits() as i64)
        .bind(&account.api_key)
        .bind(account.registered_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    if db_err.constraint() == Some("users_username_safe_key") {
                        return AccountError::UsernameTaken;
                    }
                    if db_err.constraint() == Some("users_email_key") {
                        return AccountError::EmailTaken;
                    }
                }
            }
            store_error(e)
        })?;

        Ok(UserId(id))
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), AccountError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, password_version = $3
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(password_hash)
        .bind(PasswordVersion::Current.as_i32())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(AccountError::UnknownUser);
        }

        Ok(())
    }

    async fn touch_activity(&self, id: UserId, at: i64) -> Result<(), AccountError> {
        sqlx::query("UPDATE users SET latest_activity = $2 WHERE id = $1")
            .bind(id.0)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(())
    }
}
