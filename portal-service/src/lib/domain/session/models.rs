use std::fmt;

use auth::PasswordFingerprint;
use serde::Deserialize;
use serde::Serialize;

use crate::account::models::UserId;

/// Opaque key carried in the session cookie.
///
/// Distinct from the device identity token; the two are never interchangeable.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    const LENGTH: usize = 64;

    pub fn generate() -> Self {
        Self(auth::tokens::session_key())
    }

    /// Accept a cookie value only if it has the shape of an issued key.
    pub fn parse(raw: &str) -> Option<Self> {
        let well_formed = raw.len() == Self::LENGTH
            && raw
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));

        well_formed.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey({}…)", &self.0[..8])
    }
}

/// Server-side session entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub password_fingerprint: Option<PasswordFingerprint>,
    #[serde(default)]
    pub logout_key: Option<String>,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub last_activity_update: Option<i64>,
}

impl SessionData {
    /// Fresh session for a user who just proved their password.
    pub fn signed_in(
        user_id: UserId,
        password_fingerprint: PasswordFingerprint,
        logout_key: String,
        api_token: String,
    ) -> Self {
        Self {
            user_id: Some(user_id),
            password_fingerprint: Some(password_fingerprint),
            logout_key: Some(logout_key),
            api_token: Some(api_token),
            last_activity_update: None,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id.unwrap_or(UserId::ANONYMOUS)
    }

    /// Drop everything tied to the signed-in user.
    pub fn clear_user(&mut self) {
        self.user_id = None;
        self.password_fingerprint = None;
        self.logout_key = None;
        self.api_token = None;
    }

    pub fn activity_due(&self, now: i64, interval_secs: i64) -> bool {
        match self.last_activity_update {
            Some(last) => now - last >= interval_secs,
            None => true,
        }
    }
}
