use std::sync::Arc;

use auth::Authenticator;
use auth::PasswordFingerprint;
use chrono::Utc;

use crate::account::errors::AccountError;
use crate::account::events::PasswordChangedEvent;
use crate::account::events::PasswordResetRequestedEvent;
use crate::account::events::UserRegisteredEvent;
use crate::account::models::safe_username;
use crate::account::models::validate_password;
use crate::account::models::Credential;
use crate::account::models::LoginCommand;
use crate::account::models::LoginOutcome;
use crate::account::models::NewAccount;
use crate::account::models::RegisterCommand;
use crate::account::models::Registration;
use crate::account::models::SignedIn;
use crate::account::models::UserId;
use crate::account::ports::CredentialStore;
use crate::account::ports::EventPublisher;
use crate::account::ports::TokenRepository;
use crate::account::privileges::Privileges;
use crate::config::RegistrationConfig;
use crate::domain::identity::models::IdentityToken;
use crate::domain::identity::service::IdentityTokenService;
use crate::domain::session::models::SessionData;

/// Login, registration and password lifecycle.
///
/// Generic over its ports so the HTTP layer can hold trait objects while
/// tests inject mocks.
pub struct AccountService<CS, TR, EP>
where
    CS: CredentialStore + ?Sized,
    TR: TokenRepository + ?Sized,
    EP: EventPublisher + ?Sized,
{
    credentials: Arc<CS>,
    tokens: Arc<TR>,
    event_publisher: Arc<EP>,
    identity: Arc<IdentityTokenService<TR>>,
    authenticator: Arc<Authenticator>,
    registration: RegistrationConfig,
}

impl<CS, TR, EP> AccountService<CS, TR, EP>
where
    CS: CredentialStore + ?Sized,
    TR: TokenRepository + ?Sized,
    EP: EventPublisher + ?Sized,
{
    /// Create a new account service with injected dependencies.
    ///
    /// # Arguments
    /// * `credentials` - Credential persistence
    /// * `tokens` - Secondary token persistence
    /// * `event_publisher` - Domain event publishing implementation
    /// * `identity` - Identity token service sharing `tokens`
    /// * `authenticator` - Password hashing and verification
    /// * `registration` - Registration switch and reserved names
    pub fn new(
        credentials: Arc<CS>,
        tokens: Arc<TR>,
        event_publisher: Arc<EP>,
        identity: Arc<IdentityTokenService<TR>>,
        authenticator: Arc<Authenticator>,
        registration: RegistrationConfig,
    ) -> Self {
        Self {
            credentials,
            tokens,
            event_publisher,
            identity,
            authenticator,
            registration,
        }
    }

    pub fn registration_enabled(&self) -> bool {
        self.registration.enabled
    }

    /// Check a username/email and password and prepare a new session.
    ///
    /// # Returns
    /// `SignedIn` with the session to persist under a fresh key, or
    /// `PendingVerification` for accounts that still need verifying
    ///
    /// # Errors
    /// * `UnknownUser` - No account with that username or email
    /// * `ResetRequired` - Password stored with the legacy scheme
    /// * `WrongPassword` - Password does not match
    /// * `Banned` - Account may not log in
    /// * `StoreUnavailable` - Database operation failed
    pub async fn login(&self, command: LoginCommand) -> Result<LoginOutcome, AccountError> {
        let credential = self
            .credentials
            .find_by_login(&command.identifier)
            .await?
            .ok_or(AccountError::UnknownUser)?;

        let fingerprint = self.verify_password(command.password, &credential).await?;
        let user_id = credential.user_id;

        if credential.privileges.is_pending_verification() {
            let identity_token = self.identity.get_or_create_identity_token(user_id).await?;
            return Ok(LoginOutcome::PendingVerification {
                user_id,
                identity_token,
            });
        }

        if !credential.privileges.can_login() {
            return Err(AccountError::Banned);
        }

        let api_token = auth::tokens::api_token();
        self.tokens
            .insert_api_token(
                user_id,
                &command.client_ip,
                &auth::tokens::sha256_hex(&api_token),
            )
            .await?;

        let identity_token = self.identity.get_or_create_identity_token(user_id).await?;
        self.log_ip(user_id, &command.client_ip).await;

        tracing::info!(user_id = %user_id, "User logged in");

        Ok(LoginOutcome::SignedIn(SignedIn {
            user_id,
            username: credential.username,
            session: SessionData::signed_in(
                user_id,
                fingerprint,
                auth::tokens::logout_key(),
                api_token,
            ),
            identity_token,
        }))
    }

    /// Create an account awaiting verification.
    ///
    /// # Errors
    /// * `RegistrationClosed` - Registrations are switched off
    /// * `ReservedUsername` - Username is on the reserved list
    /// * `WeakPassword` - Password policy violated
    /// * `UsernameTaken` / `EmailTaken` / `UsernameInHistory` - Uniqueness violated
    /// * `StoreUnavailable` - Database operation failed
    pub async fn register(&self, command: RegisterCommand) -> Result<Registration, AccountError> {
        if !self.registration.enabled {
            return Err(AccountError::RegistrationClosed);
        }

        let lowered = command.username.as_str().to_lowercase();
        if self
            .registration
            .reserved_usernames
            .iter()
            .any(|reserved| reserved.to_lowercase() == lowered)
        {
            return Err(AccountError::ReservedUsername);
        }

        validate_password(&command.password)?;

        if self.credentials.username_exists(&command.username).await? {
            return Err(AccountError::UsernameTaken);
        }
        if self.credentials.email_exists(&command.email).await? {
            return Err(AccountError::EmailTaken);
        }
        if self.credentials.username_in_history(&command.username).await? {
            return Err(AccountError::UsernameInHistory);
        }

        let password_hash = self.hash_password(command.password).await?;

        let user_id = self
            .credentials
            .create(NewAccount {
                username: command.username.clone(),
                email: command.email.clone(),
                password_hash,
                api_key: auth::tokens::api_key(),
                privileges: Privileges::PENDING_VERIFICATION,
                registered_at: Utc::now().timestamp(),
            })
            .await?;

        let identity_token = self.identity.get_or_create_identity_token(user_id).await?;
        self.log_ip(user_id, &command.client_ip).await;

        let event = UserRegisteredEvent::new(
            user_id,
            command.username.as_str(),
            command.email.as_str(),
        );
        if let Err(e) = &self.event_publisher.publish_user_registered(&event).await {
            tracing::error!(
                "Failed to publish UserRegistered event for user {}: {}",
                user_id,
                e
            );
        }

        tracing::info!(user_id = %user_id, username = %command.username, "User registered");

        Ok(Registration {
            user_id,
            identity_token,
        })
    }

    /// Change the password of a signed-in user.
    ///
    /// Every other session of the user stops verifying as soon as the new
    /// hash is stored.
    ///
    /// # Returns
    /// Fingerprint of the new hash, to re-pin in the acting session
    ///
    /// # Errors
    /// * `UnknownUser` - Account vanished
    /// * `WrongPassword` - Current password does not match
    /// * `WeakPassword` - New password violates policy
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: String,
        new_password: String,
    ) -> Result<PasswordFingerprint, AccountError> {
        let credential = self
            .credentials
            .find_by_id(user_id)
            .await?
            .ok_or(AccountError::UnknownUser)?;

        self.verify_password(current_password, &credential).await?;
        validate_password(&new_password)?;

        let fingerprint = self.store_new_password(user_id, new_password).await?;

        tracing::info!(user_id = %user_id, "Password changed");

        Ok(fingerprint)
    }

    /// Issue a password reset key and hand it to the mailer.
    ///
    /// # Errors
    /// * `UnknownUser` - No account with that username or email
    /// * `StoreUnavailable` - Database operation failed
    pub async fn request_password_reset(&self, identifier: &str) -> Result<(), AccountError> {
        let contact = self
            .credentials
            .find_contact(identifier)
            .await?
            .ok_or(AccountError::UnknownUser)?;

        let key = auth::tokens::password_reset_key();
        self.tokens
            .insert_reset_key(&key, &safe_username(&contact.username))
            .await?;

        let event = PasswordResetRequestedEvent::new(
            contact.user_id,
            &contact.username,
            &contact.email,
            &key,
        );
        if let Err(e) = &self
            .event_publisher
            .publish_password_reset_requested(&event)
            .await
        {
            tracing::error!(
                "Failed to publish PasswordResetRequested event for user {}: {}",
                contact.user_id,
                e
            );
        }

        Ok(())
    }

    /// Consume a reset key and set a new password.
    ///
    /// # Errors
    /// * `WeakPassword` - New password violates policy (key is kept)
    /// * `ResetKeyNotFound` - Unknown or already used key
    /// * `UnknownUser` - Account vanished
    pub async fn reset_password(
        &self,
        key: &str,
        new_password: String,
    ) -> Result<UserId, AccountError> {
        validate_password(&new_password)?;

        let username_safe = self
            .tokens
            .take_reset_key(key)
            .await?
            .ok_or(AccountError::ResetKeyNotFound)?;

        let credential = self
            .credentials
            .find_by_login(&username_safe)
            .await?
            .ok_or(AccountError::UnknownUser)?;

        self.store_new_password(credential.user_id, new_password)
            .await?;

        tracing::info!(user_id = %credential.user_id, "Password reset");

        Ok(credential.user_id)
    }

    /// Load the account a device is resuming registration for.
    ///
    /// # Returns
    /// The credential when `token` belongs to `user_id`, None otherwise
    pub async fn resume_registration(
        &self,
        user_id: UserId,
        token: &IdentityToken,
    ) -> Result<Option<Credential>, AccountError> {
        if !self.identity.validate_identity_token(token, user_id).await? {
            return Ok(None);
        }

        self.credentials.find_by_id(user_id).await
    }

    async fn store_new_password(
        &self,
        user_id: UserId,
        new_password: String,
    ) -> Result<PasswordFingerprint, AccountError> {
        let password_hash = self.hash_password(new_password).await?;
        self.credentials
            .update_password(user_id, &password_hash)
            .await?;

        let event = PasswordChangedEvent::new(user_id);
        if let Err(e) = &self.event_publisher.publish_password_changed(&event).await {
            tracing::error!(
                "Failed to publish PasswordChanged event for user {}: {}",
                user_id,
                e
            );
        }

        Ok(self.authenticator.fingerprint(&password_hash))
    }

    async fn log_ip(&self, user_id: UserId, ip: &str) {
        if let Err(e) = self.identity.log_ip(user_id, ip).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to record login IP");
        }
    }

    async fn hash_password(&self, password: String) -> Result<String, AccountError> {
        let authenticator = Arc::clone(&self.authenticator);

        tokio::task::spawn_blocking(move || authenticator.hash_password(&password))
            .await
            .map_err(|e| auth::PasswordError::HashingFailed(e.to_string()))?
            .map_err(AccountError::from)
    }

    async fn verify_password(
        &self,
        password: String,
        credential: &Credential,
    ) -> Result<PasswordFingerprint, AccountError> {
        let authenticator = Arc::clone(&self.authenticator);
        let stored_hash = credential.password_hash.clone();
        let version = credential.password_version;

        tokio::task::spawn_blocking(move || {
            authenticator.authenticate(&password, &stored_hash, version)
        })
        .await
        .map_err(|e| auth::PasswordError::VerificationFailed(e.to_string()))?
        .map_err(AccountError::from)
    }
}
