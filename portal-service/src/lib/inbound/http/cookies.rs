use std::time::Duration;

use axum::http::header::COOKIE;
use axum::http::header::InvalidHeaderValue;
use axum::http::HeaderMap;
use axum::http::HeaderValue;

use crate::config::Config;
use crate::domain::identity::models::IdentityToken;
use crate::domain::session::models::SessionKey;

/// Names and attributes of the cookies this service sets.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub session_name: String,
    pub session_max_age: Duration,
    pub identity_name: String,
    pub identity_max_age: Duration,
    pub secure: bool,
}

impl CookieSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            session_name: config.session.cookie_name.clone(),
            session_max_age: config.session.ttl(),
            identity_name: config.identity.cookie_name.clone(),
            identity_max_age: config.identity.max_age(),
            secure: config.session.secure_cookies,
        }
    }

    /// Session key from the request's `Cookie` header, if well formed.
    pub fn session_key(&self, headers: &HeaderMap) -> Option<SessionKey> {
        read_cookie(headers, &self.session_name).and_then(|value| SessionKey::parse(&value))
    }

    pub fn identity_token(&self, headers: &HeaderMap) -> Option<IdentityToken> {
        read_cookie(headers, &self.identity_name).and_then(IdentityToken::new)
    }

    pub fn session_cookie(&self, key: &SessionKey) -> Result<HeaderValue, InvalidHeaderValue> {
        self.build(&self.session_name, key.as_str(), self.session_max_age.as_secs())
    }

    pub fn clear_session_cookie(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        self.build(&self.session_name, "", 0)
    }

    pub fn identity_cookie(
        &self,
        token: &IdentityToken,
    ) -> Result<HeaderValue, InvalidHeaderValue> {
        self.build(
            &self.identity_name,
            token.as_str(),
            self.identity_max_age.as_secs(),
        )
    }

    fn build(
        &self,
        name: &str,
        value: &str,
        max_age_secs: u64,
    ) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie =
            format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
    }
}

/// Value of the first cookie called `name` in the `Cookie` header(s).
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(secure: bool) -> CookieSettings {
        CookieSettings {
            session_name: "session".to_string(),
            session_max_age: Duration::from_secs(3600),
            identity_name: "y".to_string(),
            identity_max_age: Duration::from_secs(365 * 24 * 3600),
            secure,
        }
    }

    #[test]
    fn test_read_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("a=1; y=device ; session=abc"));

        assert_eq!(read_cookie(&headers, "y"), Some("device".to_string()));
        assert_eq!(read_cookie(&headers, "session"), Some("abc".to_string()));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_read_cookie_skips_malformed_pairs() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("garbage; y=device"));

        assert_eq!(read_cookie(&headers, "y"), Some("device".to_string()));
    }

    #[test]
    fn test_malformed_session_key_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("session=abc"));

        assert!(settings(false).session_key(&headers).is_none());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let key = SessionKey::generate();
        let cookie = settings(true).session_cookie(&key).unwrap();
        let cookie = cookie.to_str().unwrap();

        assert!(cookie.starts_with(&format!("session={}", key.as_str())));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.ends_with("; Secure"));
    }

    #[test]
    fn test_clear_session_cookie() {
        let cookie = settings(false).clear_session_cookie().unwrap();
        let cookie = cookie.to_str().unwrap();

        assert!(cookie.starts_with("session=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_identity_cookie_lasts_a_year() {
        let token = IdentityToken::new("device").unwrap();
        let cookie = settings(false).identity_cookie(&token).unwrap();

        assert!(cookie
            .to_str()
            .unwrap()
            .contains(&format!("Max-Age={}", 365 * 24 * 3600)));
    }
}
