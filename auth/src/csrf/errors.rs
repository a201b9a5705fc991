use thiserror::Error;

/// Error type for anti-forgery token issuance.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CsrfError {
    #[error("CSRF token store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("CSRF token requested without a session to bind it to")]
    Unbound,
}
