use async_trait::async_trait;
use mockall::mock;

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
use crate::account::ports::CredentialStore;
use crate::account::ports::EventPublisher;
use crate::account::ports::TokenRepository;
use crate::domain::session::errors::SessionStoreError;
use crate::domain::session::models::SessionData;
use crate::domain::session::models::SessionKey;
use crate::domain::session::ports::SessionStore;

mock! {
    pub TestCredentialStore {}

    #[async_trait]
    impl CredentialStore for TestCredentialStore {
        async fn find_by_id(&self, id: UserId) -> Result<Option<Credential>, AccountError>;
        async fn find_by_login(&self, identifier: &str) -> Result<Option<Credential>, AccountError>;
        async fn find_contact(&self, identifier: &str) -> Result<Option<AccountContact>, AccountError>;
        async fn clan_membership(&self, id: UserId) -> Result<Option<ClanMembership>, AccountError>;
        async fn username_exists(&self, username: &Username) -> Result<bool, AccountError>;
        async fn email_exists(&self, email: &EmailAddress) -> Result<bool, AccountError>;
        async fn username_in_history(&self, username: &Username) -> Result<bool, AccountError>;
        async fn create(&self, account: NewAccount) -> Result<UserId, AccountError>;
        async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), AccountError>;
        async fn touch_activity(&self, id: UserId, at: i64) -> Result<(), AccountError>;
    }
}

mock! {
    pub TestTokenRepository {}

    #[async_trait]
    impl TokenRepository for TestTokenRepository {
        async fn identity_token_for(&self, user_id: UserId) -> Result<Option<String>, AccountError>;
        async fn identity_token_exists(&self, token: &str) -> Result<bool, AccountError>;
        async fn insert_identity_token(&self, user_id: UserId, token: &str) -> Result<String, AccountError>;
        async fn identity_token_matches(&self, user_id: UserId, token: &str) -> Result<bool, AccountError>;
        async fn user_by_identity_token(&self, token: &str) -> Result<Option<String>, AccountError>;
        async fn user_by_ip(&self, ip: &str) -> Result<Option<String>, AccountError>;
        async fn log_ip(&self, user_id: UserId, ip: &str) -> Result<(), AccountError>;
        async fn insert_api_token(&self, user_id: UserId, description: &str, token_hash: &str) -> Result<(), AccountError>;
        async fn insert_reset_key(&self, key: &str, username_safe: &str) -> Result<(), AccountError>;
        async fn take_reset_key(&self, key: &str) -> Result<Option<String>, AccountError>;
    }
}

mock! {
    pub TestSessionStore {}

    #[async_trait]
    impl SessionStore for TestSessionStore {
        async fn load(&self, key: &SessionKey) -> Result<Option<SessionData>, SessionStoreError>;
        async fn save(&self, key: &SessionKey, data: &SessionData) -> Result<(), SessionStoreError>;
        async fn delete(&self, key: &SessionKey) -> Result<(), SessionStoreError>;
    }
}

mock! {
    pub TestEventPublisher {}

    #[async_trait]
    impl EventPublisher for TestEventPublisher {
        async fn publish_user_registered(&self, event: &UserRegisteredEvent) -> Result<(), EventPublisherError>;
        async fn publish_password_changed(&self, event: &PasswordChangedEvent) -> Result<(), EventPublisherError>;
        async fn publish_password_reset_requested(&self, event: &PasswordResetRequestedEvent) -> Result<(), EventPublisherError>;
    }
}
