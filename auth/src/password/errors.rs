use thiserror::Error;

/// Error type for password operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Password verification failed: {0}")]
    VerificationFailed(String),

    #[error("Invalid password hashing parameters: {0}")]
    InvalidParameters(String),

    #[error("Unknown password version: {0}")]
    UnknownVersion(i32),
}
