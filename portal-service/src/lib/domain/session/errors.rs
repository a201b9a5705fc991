use thiserror::Error;

/// Error for session store operations
#[derive(Debug, Clone, Error)]
pub enum SessionStoreError {
    #[error("Session store unavailable: {0}")]
    Unavailable(String),

    #[error("Session entry is corrupt: {0}")]
    Corrupt(String),
}
