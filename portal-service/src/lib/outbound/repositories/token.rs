use async_trait::async_trait;
use sqlx::PgPool;

use super::store_error;
use crate::account::errors::AccountError;
use crate::account::models::UserId;
use crate::account::ports::TokenRepository;

pub struct PostgresTokenRepository {
    pool: PgPool,
}

impl PostgresTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PostgresTokenRepository {
    async fn identity_token_for(&self, user_id: UserId) -> Result<Option<String>, AccountError> {
        sqlx::query_scalar("SELECT token FROM identity_tokens WHERE user_id = $1")
            .bind(user_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn identity_token_exists(&self, token: &str) -> Result<bool, AccountError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM identity_tokens WHERE token = $1)")
            .bind(token)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn insert_identity_token(
        &self,
        user_id: UserId,
        token: &str,
    ) -> Result<String, AccountError> {
        // A concurrent insert for the same user keeps its row; read back
        // whichever token won.
        sqlx::query(
            r#"
            INSERT INTO identity_tokens (user_id, token)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id.0)
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        sqlx::query_scalar("SELECT token FROM identity_tokens WHERE user_id = $1")
            .bind(user_id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn identity_token_matches(
        &self,
        user_id: UserId,
        token: &str,
    ) -> Result<bool, AccountError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM identity_tokens WHERE user_id = $1 AND token = $2)",
        )
        .bind(user_id.0)
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)
    }

    async fn user_by_identity_token(&self, token: &str) -> Result<Option<String>, AccountError> {
        sqlx::query_scalar(
            r#"
            SELECT u.username
            FROM identity_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token = $1
            LIMIT 1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)
    }

    async fn user_by_ip(&self, ip: &str) -> Result<Option<String>, AccountError> {
        sqlx::query_scalar(
            r#"
            SELECT u.username
            FROM ip_user i
            JOIN users u ON u.id = i.user_id
            WHERE i.ip = $1
            ORDER BY i.occurrences DESC
            LIMIT 1
            "#,
        )
        .bind(ip)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)
    }

    async fn log_ip(&self, user_id: UserId, ip: &str) -> Result<(), AccountError> {
        sqlx::query(
            r#"
            INSERT INTO ip_user (user_id, ip, occurrences)
            VALUES ($1, $2, 1)
            ON CONFLICT (user_id, ip) DO UPDATE SET occurrences = ip_user.occurrences + 1
            "#,
        )
        .bind(user_id.0)
        .bind(ip)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn insert_api_token(
        &self,
        user_id: UserId,
        description: &str,
        token_hash: &str,
    ) -> Result<(), AccountError> {
        sqlx::query(
            "INSERT INTO api_tokens (user_id, description, token_hash) VALUES ($1, $2, $3)",
        )
        .bind(user_id.0)
        .bind(description)
        .bind(token_hash)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn insert_reset_key(&self, key: &str, username_safe: &str) -> Result<(), AccountError> {
        sqlx::query("INSERT INTO password_recovery (k, username_safe) VALUES ($1, $2)")
            .bind(key)
            .bind(username_safe)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(())
    }

    async fn take_reset_key(&self, key: &str) -> Result<Option<String>, AccountError> {
        sqlx::query_scalar("DELETE FROM password_recovery WHERE k = $1 RETURNING username_safe")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)
    }
}
