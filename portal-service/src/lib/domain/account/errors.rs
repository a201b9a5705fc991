use thiserror::Error;

use crate::domain::account::models::UserId;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid user id: {0}")]
    InvalidFormat(String),
}

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Your username must contain alphanumerical characters, spaces, or any of _[]-")]
    InvalidFormat,

    #[error("An username can't contain both underscores and spaces.")]
    MixedSeparators,
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Rejections from the password policy applied at registration and reset.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Your password is too short! It must be at least 8 characters long.")]
    TooShort,

    #[error("Your password is one of the most common passwords on the entire internet. No way we're letting you use that!")]
    TooCommon,
}

/// Error for event publishing operations
#[derive(Debug, Clone, Error)]
pub enum EventPublisherError {
    #[error("Failed to serialize event: {0}")]
    SerializationFailed(String),

    #[error("Failed to publish event to broker: {0}")]
    PublishFailed(String),
}

/// Top-level error for account, login and registration operations
#[derive(Debug, Clone, Error)]
pub enum AccountError {
    // Value object validation errors (automatically converted via #[from])
    #[error("{0}")]
    InvalidUserId(#[from] UserIdError),

    #[error("{0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("{0}")]
    InvalidEmail(#[from] EmailError),

    #[error("{0}")]
    WeakPassword(#[from] PasswordPolicyError),

    #[error("Password error: {0}")]
    Password(#[from] auth::PasswordError),

    // Credential rejections, one variant per cause
    #[error("No user with such username/email!")]
    UnknownUser,

    #[error("Your password is too old to be verified. Please reset it to continue.")]
    ResetRequired,

    #[error("Wrong password.")]
    WrongPassword,

    #[error("Your account is still pending verification.")]
    PendingVerification(UserId),

    #[error("You are not allowed to login. This means your account is either banned or locked.")]
    Banned,

    // Registration
    #[error("Sorry, it's not possible to register at the moment. Please try again later.")]
    RegistrationClosed,

    #[error("You're not allowed to register with that username.")]
    ReservedUsername,

    #[error("An user with that username already exists!")]
    UsernameTaken,

    #[error("An user with that email address already exists!")]
    EmailTaken,

    #[error("This username has been reserved by another user.")]
    UsernameInHistory,

    // Password reset
    #[error("That key could not be found. Perhaps it expired?")]
    ResetKeyNotFound,

    #[error("Could not allocate a unique identity token after {0} attempts")]
    TokenGeneration(usize),

    // Infrastructure errors
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<auth::AuthenticationError> for AccountError {
    fn from(err: auth::AuthenticationError) -> Self {
        match err {
            auth::AuthenticationError::InvalidCredentials => AccountError::WrongPassword,
            auth::AuthenticationError::ResetRequired => AccountError::ResetRequired,
            auth::AuthenticationError::PasswordError(e) => AccountError::Password(e),
        }
    }
}
