use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::domain::session::errors::SessionStoreError;
use crate::domain::session::models::SessionData;
use crate::domain::session::models::SessionKey;
use crate::domain::session::ports::SessionStore;

/// Sessions as JSON documents with a sliding expiry.
pub struct PostgresSessionStore {
    pool: PgPool,
    ttl: Duration,
}

impl PostgresSessionStore {
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    /// Delete expired entries.
    ///
    /// # Returns
    /// Number of entries removed
    pub async fn purge_expired(&self) -> Result<u64, SessionStoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(result.rows_affected())
    }
}

fn unavailable(e: sqlx::Error) -> SessionStoreError {
    SessionStoreError::Unavailable(e.to_string())
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn load(&self, key: &SessionKey) -> Result<Option<SessionData>, SessionStoreError> {
        let data: Option<String> =
            sqlx::query_scalar("SELECT data FROM sessions WHERE key = $1 AND expires_at > NOW()")
                .bind(key.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(unavailable)?;

        data.map(|json| {
            serde_json::from_str(&json).map_err(|e| SessionStoreError::Corrupt(e.to_string()))
        })
        .transpose()
    }

    async fn save(&self, key: &SessionKey, data: &SessionData) -> Result<(), SessionStoreError> {
        let json =
            serde_json::to_string(data).map_err(|e| SessionStoreError::Corrupt(e.to_string()))?;
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;
        let expires_at = Utc::now() + ttl;

        sqlx::query(
            r#"
            INSERT INTO sessions (key, data, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE SET data = EXCLUDED.data, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(key.as_str())
        .bind(json)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn delete(&self, key: &SessionKey) -> Result<(), SessionStoreError> {
        sqlx::query("DELETE FROM sessions WHERE key = $1")
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(())
    }
}
