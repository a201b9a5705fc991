use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::account::events::AccountEvent;
use crate::account::events::PasswordChangedEvent;
use crate::account::events::PasswordResetRequestedEvent;
use crate::account::events::UserRegisteredEvent;

/// Serializable envelope for all account-related events.
///
/// Infrastructure representation for event publishing (Kafka, etc.).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AccountEventMessage {
    UserRegistered(UserRegisteredMessage),
    PasswordChanged(PasswordChangedMessage),
    PasswordResetRequested(PasswordResetRequestedMessage),
}

impl From<&AccountEvent> for AccountEventMessage {
    fn from(event: &AccountEvent) -> Self {
        match event {
            AccountEvent::UserRegistered(e) => AccountEventMessage::UserRegistered(e.into()),
            AccountEvent::PasswordChanged(e) => AccountEventMessage::PasswordChanged(e.into()),
            AccountEvent::PasswordResetRequested(e) => {
                AccountEventMessage::PasswordResetRequested(e.into())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRegisteredMessage {
    pub event_id: String,
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub registered_at: DateTime<Utc>,
}

impl From<&UserRegisteredEvent> for UserRegisteredMessage {
    fn from(event: &UserRegisteredEvent) -> Self {
        Self {
            event_id: event.event_id.clone(),
            user_id: event.user_id.clone(),
            username: event.username.clone(),
            email: event.email.clone(),
            registered_at: event.registered_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordChangedMessage {
    pub event_id: String,
    pub user_id: String,
    pub changed_at: DateTime<Utc>,
}

impl From<&PasswordChangedEvent> for PasswordChangedMessage {
    fn from(event: &PasswordChangedEvent) -> Self {
        Self {
            event_id: event.event_id.clone(),
            user_id: event.user_id.clone(),
            changed_at: event.changed_at,
        }
    }
}

/// Mailer input; carries the reset key, so the topic must not be public.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetRequestedMessage {
    pub event_id: String,
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub reset_key: String,
    pub requested_at: DateTime<Utc>,
}

impl From<&PasswordResetRequestedEvent> for PasswordResetRequestedMessage {
    fn from(event: &PasswordResetRequestedEvent) -> Self {
        Self {
            event_id: event.event_id.clone(),
            user_id: event.user_id.clone(),
            username: event.username.clone(),
            email: event.email.clone(),
            reset_key: event.reset_key.clone(),
            requested_at: event.requested_at,
        }
    }
}
