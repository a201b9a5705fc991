use async_trait::async_trait;

use crate::domain::session::errors::SessionStoreError;
use crate::domain::session::models::SessionData;
use crate::domain::session::models::SessionKey;

/// Server-side session storage keyed by the cookie's opaque key.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Load a live session entry.
    ///
    /// # Returns
    /// Optional session (None if unknown or expired)
    ///
    /// # Errors
    /// * `Unavailable` - Backing store unreachable
    /// * `Corrupt` - Entry could not be decoded
    async fn load(&self, key: &SessionKey) -> Result<Option<SessionData>, SessionStoreError>;

    /// Create or overwrite an entry and extend its lifetime.
    async fn save(&self, key: &SessionKey, data: &SessionData) -> Result<(), SessionStoreError>;

    async fn delete(&self, key: &SessionKey) -> Result<(), SessionStoreError>;
}
