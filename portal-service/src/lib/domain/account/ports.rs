use async_trait::async_trait;

use crate::account::errors::AccountError;
use crate::account::errors::EventPublisherError;
use crate::account::events::PasswordChangedEvent;
use crate::account::events::PasswordResetRequestedEvent;
use crate::account::events::UserRegisteredEvent;
use crate::account::models::AccountContact;
use crate::account::models::ClanMembership;
use crate::account::models::Credential;
use crate::account::models::EmailAddress;
use crate::account::models::NewAccount;
use crate::account::models::UserId;
use crate::account::models::Username;

/// Read and write access to account credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Retrieve the live credential for a user.
    ///
    /// # Returns
    /// Optional credential (None if the account does not exist)
    ///
    /// # Errors
    /// * `StoreUnavailable` - Database operation failed
    async fn find_by_id(&self, id: UserId) -> Result<Option<Credential>, AccountError>;

    /// Retrieve a credential by safe username or by email address.
    ///
    /// # Arguments
    /// * `identifier` - Raw login input; matched against the safe username
    ///   form and, case-insensitively, against the email
    ///
    /// # Errors
    /// * `StoreUnavailable` - Database operation failed
    async fn find_by_login(&self, identifier: &str) -> Result<Option<Credential>, AccountError>;

    /// Retrieve mail addressing data by safe username or email address.
    ///
    /// # Errors
    /// * `StoreUnavailable` - Database operation failed
    async fn find_contact(&self, identifier: &str)
        -> Result<Option<AccountContact>, AccountError>;

    /// Clan the user belongs to, if any.
    ///
    /// # Errors
    /// * `StoreUnavailable` - Database operation failed
    async fn clan_membership(&self, id: UserId) -> Result<Option<ClanMembership>, AccountError>;

    async fn username_exists(&self, username: &Username) -> Result<bool, AccountError>;

    async fn email_exists(&self, email: &EmailAddress) -> Result<bool, AccountError>;

    /// Whether another account used this username in the past.
    async fn username_in_history(&self, username: &Username) -> Result<bool, AccountError>;

    /// Persist a new account.
    ///
    /// # Returns
    /// Identifier assigned by storage
    ///
    /// # Errors
    /// * `UsernameTaken` / `EmailTaken` - Lost a race with a concurrent registration
    /// * `StoreUnavailable` - Database operation failed
    async fn create(&self, account: NewAccount) -> Result<UserId, AccountError>;

    /// Replace the password hash and mark it as the current version.
    ///
    /// # Errors
    /// * `UnknownUser` - Account does not exist
    /// * `StoreUnavailable` - Database operation failed
    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), AccountError>;

    /// Record the last time the user was seen (unix seconds).
    async fn touch_activity(&self, id: UserId, at: i64) -> Result<(), AccountError>;
}

/// Persistence for the secondary tokens attached to an account.
#[async_trait]
pub trait TokenRepository: Send + Sync + 'static {
    /// Identity token currently stored for a user.
    async fn identity_token_for(&self, user_id: UserId) -> Result<Option<String>, AccountError>;

    /// Whether any user already owns this identity token value.
    async fn identity_token_exists(&self, token: &str) -> Result<bool, AccountError>;

    /// Store an identity token unless the user already has one.
    ///
    /// # Returns
    /// The token that is stored after the call; the first write wins, so this
    /// may differ from `token` under a concurrent insert.
    async fn insert_identity_token(
        &self,
        user_id: UserId,
        token: &str,
    ) -> Result<String, AccountError>;

    /// Whether exactly this (token, user) pair is on record.
    async fn identity_token_matches(
        &self,
        user_id: UserId,
        token: &str,
    ) -> Result<bool, AccountError>;

    /// Owner of an identity token, if any.
    async fn user_by_identity_token(&self, token: &str) -> Result<Option<String>, AccountError>;

    /// Username of an account that previously logged in from `ip`.
    async fn user_by_ip(&self, ip: &str) -> Result<Option<String>, AccountError>;

    /// Increment the (user, ip) occurrence counter.
    async fn log_ip(&self, user_id: UserId, ip: &str) -> Result<(), AccountError>;

    /// Record the digest of a freshly issued API token.
    async fn insert_api_token(
        &self,
        user_id: UserId,
        description: &str,
        token_hash: &str,
    ) -> Result<(), AccountError>;

    async fn insert_reset_key(&self, key: &str, username_safe: &str) -> Result<(), AccountError>;

    /// Delete a reset key and return the safe username it was issued for.
    async fn take_reset_key(&self, key: &str) -> Result<Option<String>, AccountError>;
}

/// Event publishing for domain events.
#[async_trait]
pub trait EventPublisher: Send + Sync + 'static {
    /// Publish account registration event.
    ///
    /// # Errors
    /// * `SerializationFailed` - Event serialization failed
    /// * `PublishFailed` - Failed to publish to broker
    async fn publish_user_registered(
        &self,
        event: &UserRegisteredEvent,
    ) -> Result<(), EventPublisherError>;

    /// Publish password change event.
    ///
    /// # Errors
    /// * `SerializationFailed` - Event serialization failed
    /// * `PublishFailed` - Failed to publish to broker
    async fn publish_password_changed(
        &self,
        event: &PasswordChangedEvent,
    ) -> Result<(), EventPublisherError>;

    /// Publish password reset request event.
    ///
    /// # Errors
    /// * `SerializationFailed` - Event serialization failed
    /// * `PublishFailed` - Failed to publish to broker
    async fn publish_password_reset_requested(
        &self,
        event: &PasswordResetRequestedEvent,
    ) -> Result<(), EventPublisherError>;
}
