//! Authentication utilities library
//!
//! Provides reusable authentication infrastructure for web services:
//! - Password hashing (SHA-256 pre-normalization + Argon2id) with version tags
//! - Password fingerprints that bind a session to the hash it was created with
//! - Secure random token generation
//! - Anti-forgery (CSRF) tokens
//! - Authentication coordination
//!
//! Services define their own persistence and adapt these implementations.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::{Authenticator, PasswordHasher, PasswordVersion};
//!
//! let auth = Authenticator::new(PasswordHasher::new());
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and pin the fingerprint in the session
//! let pinned = auth
//!     .authenticate("password123", &hash, PasswordVersion::Current)
//!     .unwrap();
//!
//! // Every later request: the session is valid while the hash is unchanged
//! assert!(pinned.matches(&hash));
//! ```
//!
//! ## CSRF Tokens
//! ```
//! use auth::{CsrfTokenService, InMemoryCsrfTokens};
//!
//! let csrf = InMemoryCsrfTokens::default();
//! let token = csrf.generate(42, "session-key").unwrap();
//! assert!(csrf.validate(42, "session-key", &token));
//! assert!(!csrf.validate(7, "session-key", &token));
//! assert!(!csrf.validate(42, "another-session", &token));
//! ```

pub mod authenticator;
pub mod csrf;
pub mod password;
pub mod tokens;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use csrf::CsrfError;
pub use csrf::CsrfTokenService;
pub use csrf::InMemoryCsrfTokens;
pub use password::PasswordError;
pub use password::PasswordFingerprint;
pub use password::PasswordHasher;
pub use password::PasswordVersion;
