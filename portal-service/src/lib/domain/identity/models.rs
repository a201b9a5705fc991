use std::fmt;

use serde::Serialize;

/// Long-lived device correlation token delivered in the `y` cookie.
///
/// Used to resume interrupted registration and to flag likely duplicate
/// accounts. Never grants authorization on its own.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct IdentityToken(String);

impl IdentityToken {
    pub fn generate() -> Self {
        Self(auth::tokens::identity_token())
    }

    /// Wrap a stored or cookie-supplied value; blank values are rejected.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IdentityToken(..)")
    }
}

/// Which correlation signal tied a visitor to an existing account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSignal {
    Ip,
    IdentityToken,
}

/// Advisory hint that a visitor probably already owns an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiAccountMatch {
    pub username: String,
    pub signal: MatchSignal,
}
