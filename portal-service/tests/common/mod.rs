#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use auth::Authenticator;
use auth::InMemoryCsrfTokens;
use auth::PasswordHasher;
use auth::PasswordVersion;
use portal_service::account::errors::AccountError;
use portal_service::account::errors::EventPublisherError;
use portal_service::account::events::PasswordChangedEvent;
use portal_service::account::events::PasswordResetRequestedEvent;
use portal_service::account::events::UserRegisteredEvent;
use portal_service::account::models::safe_username;
use portal_service::account::models::AccountContact;
use portal_service::account::models::ClanMembership;
use portal_service::account::models::Credential;
use portal_service::account::models::EmailAddress;
use portal_service::account::models::NewAccount;
use portal_service::account::models::UserId;
use portal_service::account::models::Username;
use portal_service::account::ports::CredentialStore;
use portal_service::account::ports::EventPublisher;
use portal_service::account::ports::TokenRepository;
use portal_service::account::privileges::Privileges;
use portal_service::account::privileges::UserFlags;
use portal_service::account::service::AccountService;
use portal_service::config::RateLimitConfig;
use portal_service::config::RegistrationConfig;
use portal_service::domain::identity::service::IdentityTokenService;
use portal_service::domain::session::errors::SessionStoreError;
use portal_service::domain::session::hydrator::SessionHydrator;
use portal_service::domain::session::models::SessionData;
use portal_service::domain::session::models::SessionKey;
use portal_service::domain::session::ports::SessionStore;
use portal_service::inbound::http::client_ip::ClientIpResolver;
use portal_service::inbound::http::cookies::CookieSettings;
use portal_service::inbound::http::create_router;
use portal_service::inbound::http::rate_limit::RateLimiter;
use portal_service::inbound::http::AppState;

pub const PASSWORD: &str = "correct horse battery";

/// Test application that spawns a real server over in-memory stores
pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryStore>,
    pub sessions: Arc<InMemorySessions>,
    pub events: Arc<RecordingPublisher>,
    pub authenticator: Arc<Authenticator>,
    pub api_client: reqwest::Client,
}

impl TestApp {
    /// Spawn the application with a rate limit generous enough to stay out
    /// of the way.
    pub async fn spawn() -> Self {
        Self::spawn_with_rate_limit(RateLimitConfig {
            rate_per_second: 1000.0,
            capacity: 1000.0,
            sweep_interval_secs: 300,
        })
        .await
    }

    pub async fn spawn_with_rate_limit(rate_limit: RateLimitConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let authenticator = Arc::new(Authenticator::new(
            PasswordHasher::with_cost(8, 1, 1).expect("Failed to build hasher"),
        ));

        let store = Arc::new(InMemoryStore::default());
        let sessions = Arc::new(InMemorySessions::default());
        let events = Arc::new(RecordingPublisher::default());

        let credentials: Arc<dyn CredentialStore> = store.clone();
        let tokens: Arc<dyn TokenRepository> = store.clone();
        let session_store: Arc<dyn SessionStore> = sessions.clone();
        let publisher: Arc<dyn EventPublisher> = events.clone();

        let identity = Arc::new(IdentityTokenService::new(Arc::clone(&tokens)));
        let accounts = Arc::new(AccountService::new(
            Arc::clone(&credentials),
            tokens,
            publisher,
            Arc::clone(&identity),
            Arc::clone(&authenticator),
            RegistrationConfig {
                enabled: true,
                reserved_usernames: vec!["peppy".to_string()],
            },
        ));
        let hydrator = Arc::new(SessionHydrator::new(
            Arc::clone(&credentials),
            Arc::clone(&session_store),
        ));

        let state = AppState {
            accounts,
            identity,
            hydrator,
            credentials,
            sessions: session_store,
            csrf: Arc::new(InMemoryCsrfTokens::default()),
            rate_limiter: Arc::new(RateLimiter::new(&rate_limit)),
            client_ip: ClientIpResolver::new(&["X-Real-IP".to_string()]),
            cookies: CookieSettings {
                session_name: "session".to_string(),
                session_max_age: std::time::Duration::from_secs(3600),
                identity_name: "y".to_string(),
                identity_max_age: std::time::Duration::from_secs(365 * 24 * 3600),
                secure: false,
            },
            activity_update_interval_secs: 60,
        };

        let app = create_router(state);
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Server failed");
        });

        Self {
            address,
            store,
            sessions,
            events,
            authenticator,
            api_client: new_client(),
        }
    }

    /// Fresh cookie-aware client, i.e. another browser.
    pub fn new_client(&self) -> reqwest::Client {
        new_client()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Insert an account directly into the store.
    pub fn seed_user(&self, username: &str, password: &str, privileges: Privileges) -> UserId {
        let hash = self.authenticator.hash_password(password).unwrap();
        self.store.insert_user(
            username,
            &format!("{}@example.com", safe_username(username)),
            &hash,
            PasswordVersion::Current,
            privileges,
        )
    }

    pub async fn login(
        &self,
        client: &reqwest::Client,
        username: &str,
        password: &str,
    ) -> reqwest::Response {
        client
            .post(self.url("/login"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn csrf_token(&self, client: &reqwest::Client) -> String {
        let body: serde_json::Value = client
            .get(self.url("/csrf"))
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .unwrap();
        body["data"]["token"].as_str().unwrap().to_string()
    }
}

fn new_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client")
}

pub fn active() -> Privileges {
    Privileges::PUBLIC | Privileges::NORMAL
}

#[derive(Debug, Clone)]
struct UserRecord {
    credential: Credential,
    email: String,
    latest_activity: i64,
}

#[derive(Default)]
struct StoreState {
    users: Vec<UserRecord>,
    clans: HashMap<i64, ClanMembership>,
    name_history: Vec<String>,
    identity_tokens: HashMap<i64, String>,
    ips: HashMap<(i64, String), u32>,
    api_tokens: Vec<(i64, String, String)>,
    reset_keys: HashMap<String, String>,
}

/// Credential and token storage backed by a single mutex.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn insert_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        password_version: PasswordVersion,
        privileges: Privileges,
    ) -> UserId {
        let mut state = self.state.lock().unwrap();
        let user_id = UserId(state.users.len() as i64 + 1);
        state.users.push(UserRecord {
            credential: Credential {
                user_id,
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                password_version,
                privileges,
                flags: UserFlags::default(),
            },
            email: email.to_string(),
            latest_activity: 0,
        });
        user_id
    }

    /// Overwrite a password hash behind the service's back.
    pub fn set_password_hash(&self, user_id: UserId, password_hash: &str) {
        self.with_user(user_id, |user| {
            user.credential.password_hash = password_hash.to_string();
        });
    }

    pub fn set_privileges(&self, user_id: UserId, privileges: Privileges) {
        self.with_user(user_id, |user| user.credential.privileges = privileges);
    }

    pub fn set_clan(&self, user_id: UserId, membership: ClanMembership) {
        self.state
            .lock()
            .unwrap()
            .clans
            .insert(user_id.0, membership);
    }

    pub fn credential(&self, user_id: UserId) -> Option<Credential> {
        self.state
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|user| user.credential.user_id == user_id)
            .map(|user| user.credential.clone())
    }

    pub fn latest_activity(&self, user_id: UserId) -> i64 {
        self.state
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|user| user.credential.user_id == user_id)
            .map(|user| user.latest_activity)
            .unwrap_or_default()
    }

    pub fn identity_token(&self, user_id: UserId) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .identity_tokens
            .get(&user_id.0)
            .cloned()
    }

    pub fn api_token_count(&self, user_id: UserId) -> usize {
        self.state
            .lock()
            .unwrap()
            .api_tokens
            .iter()
            .filter(|(owner, _, _)| *owner == user_id.0)
            .count()
    }

    fn with_user(&self, user_id: UserId, update: impl FnOnce(&mut UserRecord)) {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state
            .users
            .iter_mut()
            .find(|user| user.credential.user_id == user_id)
        {
            update(user);
        }
    }

    fn find_by_identifier(&self, identifier: &str) -> Option<UserRecord> {
        let safe = safe_username(identifier);
        let identifier = identifier.trim().to_lowercase();

        self.state
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|user| {
                safe_username(&user.credential.username) == safe
                    || user.email.to_lowercase() == identifier
            })
            .cloned()
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<Credential>, AccountError> {
        Ok(self.credential(id))
    }

    async fn find_by_login(&self, identifier: &str) -> Result<Option<Credential>, AccountError> {
        Ok(self.find_by_identifier(identifier).map(|user| user.credential))
    }

    async fn find_contact(
        &self,
        identifier: &str,
    ) -> Result<Option<AccountContact>, AccountError> {
        Ok(self
            .find_by_identifier(identifier)
            .map(|user| AccountContact {
                user_id: user.credential.user_id,
                username: user.credential.username,
                email: user.email,
            }))
    }

    async fn clan_membership(&self, id: UserId) -> Result<Option<ClanMembership>, AccountError> {
        Ok(self.state.lock().unwrap().clans.get(&id.0).copied())
    }

    async fn username_exists(&self, username: &Username) -> Result<bool, AccountError> {
        Ok(self.find_by_identifier(username.as_str()).is_some())
    }

    async fn email_exists(&self, email: &EmailAddress) -> Result<bool, AccountError> {
        let email = email.as_str().to_lowercase();
        Ok(self
            .state
            .lock()
            .unwrap()
            .users
            .iter()
            .any(|user| user.email.to_lowercase() == email))
    }

    async fn username_in_history(&self, username: &Username) -> Result<bool, AccountError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .name_history
            .contains(&username.safe()))
    }

    async fn create(&self, account: NewAccount) -> Result<UserId, AccountError> {
        Ok(self.insert_user(
            account.username.as_str(),
            account.email.as_str(),
            &account.password_hash,
            PasswordVersion::Current,
            account.privileges,
        ))
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), AccountError> {
        self.with_user(id, |user| {
            user.credential.password_hash = password_hash.to_string();
            user.credential.password_version = PasswordVersion::Current;
        });
        Ok(())
    }

    async fn touch_activity(&self, id: UserId, at: i64) -> Result<(), AccountError> {
        self.with_user(id, |user| user.latest_activity = at);
        Ok(())
    }
}

#[async_trait]
impl TokenRepository for InMemoryStore {
    async fn identity_token_for(&self, user_id: UserId) -> Result<Option<String>, AccountError> {
        Ok(self.identity_token(user_id))
    }

    async fn identity_token_exists(&self, token: &str) -> Result<bool, AccountError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .identity_tokens
            .values()
            .any(|stored| stored == token))
    }

    async fn insert_identity_token(
        &self,
        user_id: UserId,
        token: &str,
    ) -> Result<String, AccountError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .identity_tokens
            .entry(user_id.0)
            .or_insert_with(|| token.to_string())
            .clone())
    }

    async fn identity_token_matches(
        &self,
        user_id: UserId,
        token: &str,
    ) -> Result<bool, AccountError> {
        Ok(self.identity_token(user_id).as_deref() == Some(token))
    }

    async fn user_by_identity_token(&self, token: &str) -> Result<Option<String>, AccountError> {
        let owner = self
            .state
            .lock()
            .unwrap()
            .identity_tokens
            .iter()
            .find(|(_, stored)| stored.as_str() == token)
            .map(|(user_id, _)| UserId(*user_id));

        Ok(owner
            .and_then(|user_id| self.credential(user_id))
            .map(|credential| credential.username))
    }

    async fn user_by_ip(&self, ip: &str) -> Result<Option<String>, AccountError> {
        let owner = self
            .state
            .lock()
            .unwrap()
            .ips
            .keys()
            .find(|(_, seen)| seen == ip)
            .map(|(user_id, _)| UserId(*user_id));

        Ok(owner
            .and_then(|user_id| self.credential(user_id))
            .map(|credential| credential.username))
    }

    async fn log_ip(&self, user_id: UserId, ip: &str) -> Result<(), AccountError> {
        *self
            .state
            .lock()
            .unwrap()
            .ips
            .entry((user_id.0, ip.to_string()))
            .or_default() += 1;
        Ok(())
    }

    async fn insert_api_token(
        &self,
        user_id: UserId,
        description: &str,
        token_hash: &str,
    ) -> Result<(), AccountError> {
        self.state.lock().unwrap().api_tokens.push((
            user_id.0,
            description.to_string(),
            token_hash.to_string(),
        ));
        Ok(())
    }

    async fn insert_reset_key(&self, key: &str, username_safe: &str) -> Result<(), AccountError> {
        self.state
            .lock()
            .unwrap()
            .reset_keys
            .insert(key.to_string(), username_safe.to_string());
        Ok(())
    }

    async fn take_reset_key(&self, key: &str) -> Result<Option<String>, AccountError> {
        Ok(self.state.lock().unwrap().reset_keys.remove(key))
    }
}

#[derive(Default)]
pub struct InMemorySessions {
    entries: Mutex<HashMap<String, SessionData>>,
}

impl InMemorySessions {
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn signed_in_count(&self) -> usize {
        self.entries
            .lock()
            .unwrap()
            .values()
            .filter(|data| data.user_id.is_some())
            .count()
    }
}

#[async_trait]
impl SessionStore for InMemorySessions {
    async fn load(&self, key: &SessionKey) -> Result<Option<SessionData>, SessionStoreError> {
        Ok(self.entries.lock().unwrap().get(key.as_str()).cloned())
    }

    async fn save(&self, key: &SessionKey, data: &SessionData) -> Result<(), SessionStoreError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.as_str().to_string(), data.clone());
        Ok(())
    }

    async fn delete(&self, key: &SessionKey) -> Result<(), SessionStoreError> {
        self.entries.lock().unwrap().remove(key.as_str());
        Ok(())
    }
}

/// Event publisher that keeps what it was given.
#[derive(Default)]
pub struct RecordingPublisher {
    registered: Mutex<Vec<UserRegisteredEvent>>,
    password_changes: Mutex<Vec<PasswordChangedEvent>>,
    reset_requests: Mutex<Vec<PasswordResetRequestedEvent>>,
}

impl RecordingPublisher {
    pub fn registered_count(&self) -> usize {
        self.registered.lock().unwrap().len()
    }

    pub fn password_change_count(&self) -> usize {
        self.password_changes.lock().unwrap().len()
    }

    pub fn last_reset_key(&self) -> Option<String> {
        self.reset_requests
            .lock()
            .unwrap()
            .last()
            .map(|event| event.reset_key.clone())
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish_user_registered(
        &self,
        event: &UserRegisteredEvent,
    ) -> Result<(), EventPublisherError> {
        self.registered.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn publish_password_changed(
        &self,
        event: &PasswordChangedEvent,
    ) -> Result<(), EventPublisherError> {
        self.password_changes.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn publish_password_reset_requested(
        &self,
        event: &PasswordResetRequestedEvent,
    ) -> Result<(), EventPublisherError> {
        self.reset_requests.lock().unwrap().push(event.clone());
        Ok(())
    }
}
