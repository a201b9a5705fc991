pub mod errors;
pub mod memory;

pub use errors::CsrfError;
pub use memory::InMemoryCsrfTokens;

/// Anti-forgery token capability.
///
/// Tokens are opaque and scoped to a user id (0 for anonymous visitors) and
/// to a per-browser session value, such as the session cookie. The session
/// binding keeps anonymous visitors, who share user id 0, apart.
/// Implementations decide storage and expiry.
pub trait CsrfTokenService: Send + Sync + 'static {
    /// Issue a token for `user_id` in `session`.
    ///
    /// # Errors
    /// * `Unbound` - `session` is empty
    /// * `StoreUnavailable` - Backing store could not record the token
    fn generate(&self, user_id: i64, session: &str) -> Result<String, CsrfError>;

    /// Whether `token` was issued for exactly `user_id` in `session` and is
    /// still live.
    ///
    /// Never panics; empty or malformed input is simply invalid.
    fn validate(&self, user_id: i64, session: &str, token: &str) -> bool;
}
