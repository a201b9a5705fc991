use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

use subtle::ConstantTimeEq;

use super::errors::CsrfError;
use super::CsrfTokenService;
use crate::tokens;

/// Default lifetime of an issued anti-forgery token.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

struct IssuedToken {
    value: String,
    expires_at: Instant,
}

/// Process-local CSRF token store.
///
/// Holds at most one live token per (user id, session) pair. Asking for a
/// token while one is still live returns the same value, so several open
/// forms in one browser stay valid.
pub struct InMemoryCsrfTokens {
    tokens: Mutex<HashMap<(i64, String), IssuedToken>>,
    ttl: Duration,
}

impl InMemoryCsrfTokens {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn generate_at(
        &self,
        user_id: i64,
        session: &str,
        now: Instant,
    ) -> Result<String, CsrfError> {
        if session.is_empty() {
            return Err(CsrfError::Unbound);
        }

        let mut tokens = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);

        // Expired entries from other sessions are dropped opportunistically.
        tokens.retain(|_, issued| issued.expires_at > now);

        let issued = tokens
            .entry((user_id, session.to_string()))
            .or_insert_with(|| IssuedToken {
                value: tokens::random_hex(32),
                expires_at: now + self.ttl,
            });

        Ok(issued.value.clone())
    }

    fn validate_at(&self, user_id: i64, session: &str, token: &str, now: Instant) -> bool {
        if session.is_empty() || token.is_empty() {
            return false;
        }

        let tokens = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);
        match tokens.get(&(user_id, session.to_string())) {
            Some(issued) if issued.expires_at > now => {
                issued.value.as_bytes().ct_eq(token.as_bytes()).into()
            }
            _ => false,
        }
    }
}

impl Default for InMemoryCsrfTokens {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl CsrfTokenService for InMemoryCsrfTokens {
    fn generate(&self, user_id: i64, session: &str) -> Result<String, CsrfError> {
        self.generate_at(user_id, session, Instant::now())
    }

    fn validate(&self, user_id: i64, session: &str, token: &str) -> bool {
        self.validate_at(user_id, session, token, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BROWSER: &str = "9f2c1e";

    #[test]
    fn test_generate_and_validate() {
        let store = InMemoryCsrfTokens::default();

        let token = store.generate(42, BROWSER).expect("Failed to generate token");
        assert_eq!(token.len(), 64);
        assert!(store.validate(42, BROWSER, &token));
    }

    #[test]
    fn test_token_is_scoped_to_user() {
        let store = InMemoryCsrfTokens::default();

        let token = store.generate(42, BROWSER).unwrap();
        assert!(!store.validate(43, BROWSER, &token));
        assert!(!store.validate(0, BROWSER, &token));
    }

    #[test]
    fn test_anonymous_visitors_get_distinct_tokens() {
        let store = InMemoryCsrfTokens::default();

        let first = store.generate(0, "session-of-first-browser").unwrap();
        let second = store.generate(0, "session-of-second-browser").unwrap();

        assert_ne!(first, second);
        assert!(!store.validate(0, "session-of-second-browser", &first));
        assert!(!store.validate(0, "session-of-first-browser", &second));
        assert!(store.validate(0, "session-of-first-browser", &first));
    }

    #[test]
    fn test_requires_session_binding() {
        let store = InMemoryCsrfTokens::default();

        assert_eq!(store.generate(0, ""), Err(CsrfError::Unbound));

        let token = store.generate(0, BROWSER).unwrap();
        assert!(!store.validate(0, "", &token));
    }

    #[test]
    fn test_reuses_live_token() {
        let store = InMemoryCsrfTokens::default();

        let first = store.generate(7, BROWSER).unwrap();
        let second = store.generate(7, BROWSER).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_empty_and_malformed() {
        let store = InMemoryCsrfTokens::default();
        let token = store.generate(1, BROWSER).unwrap();

        assert!(!store.validate(1, BROWSER, ""));
        assert!(!store.validate(1, BROWSER, "not-a-token"));
        assert!(!store.validate(1, BROWSER, &token[..10]));
        assert!(!store.validate(1, BROWSER, &format!("{token}0")));
        assert!(!store.validate(2, BROWSER, ""));
    }

    #[test]
    fn test_expired_token_is_rejected_and_replaced() {
        let store = InMemoryCsrfTokens::new(Duration::from_secs(60));
        let start = Instant::now();

        let token = store.generate_at(5, BROWSER, start).unwrap();
        assert!(store.validate_at(5, BROWSER, &token, start + Duration::from_secs(59)));
        assert!(!store.validate_at(5, BROWSER, &token, start + Duration::from_secs(61)));

        let renewed = store
            .generate_at(5, BROWSER, start + Duration::from_secs(61))
            .unwrap();
        assert_ne!(renewed, token);
        assert!(store.validate_at(5, BROWSER, &renewed, start + Duration::from_secs(62)));
    }
}
