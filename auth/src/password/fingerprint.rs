use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Digest of a stored password hash, pinned into a session at login.
///
/// A session stays valid only while the fingerprint recomputed from the
/// account's current hash equals the pinned one, so any password change
/// silently invalidates every session created before it. The same function
/// is used when writing and when comparing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordFingerprint(String);

impl PasswordFingerprint {
    /// Compute the fingerprint of a stored password hash.
    ///
    /// # Arguments
    /// * `password_hash` - Stored hash string exactly as persisted
    pub fn of(password_hash: &str) -> Self {
        Self(hex::encode(Sha256::digest(password_hash.as_bytes())))
    }

    /// Whether this fingerprint was derived from `password_hash`.
    ///
    /// Comparison is constant time.
    pub fn matches(&self, password_hash: &str) -> bool {
        let current = Self::of(password_hash);
        self.0.as_bytes().ct_eq(current.0.as_bytes()).into()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
