use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::account::models::UserId;

/// Envelope for all account-related domain events.
#[derive(Debug, Clone)]
pub enum AccountEvent {
    UserRegistered(UserRegisteredEvent),
    PasswordChanged(PasswordChangedEvent),
    PasswordResetRequested(PasswordResetRequestedEvent),
}

impl AccountEvent {
    pub fn event_id(&self) -> &str {
        match self {
            AccountEvent::UserRegistered(e) => &e.event_id,
            AccountEvent::PasswordChanged(e) => &e.event_id,
            AccountEvent::PasswordResetRequested(e) => &e.event_id,
        }
    }

    pub fn event_type(&self) -> &str {
        match self {
            AccountEvent::UserRegistered(_) => "user_registered",
            AccountEvent::PasswordChanged(_) => "password_changed",
            AccountEvent::PasswordResetRequested(_) => "password_reset_requested",
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            AccountEvent::UserRegistered(e) => &e.user_id,
            AccountEvent::PasswordChanged(e) => &e.user_id,
            AccountEvent::PasswordResetRequested(e) => &e.user_id,
        }
    }
}

/// Domain event published when a new account is created (pending verification).
#[derive(Debug, Clone)]
pub struct UserRegisteredEvent {
    pub event_id: String,
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub registered_at: DateTime<Utc>,
}

impl UserRegisteredEvent {
    pub fn new(user_id: UserId, username: &str, email: &str) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            registered_at: Utc::now(),
        }
    }
}

/// Domain event published after a password change or reset.
///
/// Consumers use it to drop cached sessions held outside this service.
#[derive(Debug, Clone)]
pub struct PasswordChangedEvent {
    pub event_id: String,
    pub user_id: String,
    pub changed_at: DateTime<Utc>,
}

impl PasswordChangedEvent {
    pub fn new(user_id: UserId) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            changed_at: Utc::now(),
        }
    }
}

/// Domain event carrying a reset key to the mailer.
#[derive(Debug, Clone)]
pub struct PasswordResetRequestedEvent {
    pub event_id: String,
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub reset_key: String,
    pub requested_at: DateTime<Utc>,
}

impl PasswordResetRequestedEvent {
    pub fn new(user_id: UserId, username: &str, email: &str, reset_key: &str) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            reset_key: reset_key.to_string(),
            requested_at: Utc::now(),
        }
    }
}
