use crate::password::PasswordError;
use crate::password::PasswordFingerprint;
use crate::password::PasswordHasher;
use crate::password::PasswordVersion;

/// Authentication coordinator combining password versioning, verification
/// and session fingerprinting.
///
/// Provides high-level credential operations so that services never call
/// the hasher or the fingerprint function directly.
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    password_hasher: PasswordHasher,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password hash is a legacy version and must be reset")]
    ResetRequired,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `password_hasher` - Hasher configured with the deployment's work factor
    ///
    /// # Returns
    /// Configured Authenticator instance
    pub fn new(password_hasher: PasswordHasher) -> Self {
        Self { password_hasher }
    }

    /// Hash a password for storage.
    ///
    /// Hashes produced here are always `PasswordVersion::Current`.
    ///
    /// # Arguments
    /// * `password` - Plaintext password
    ///
    /// # Returns
    /// Hashed password string
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify credentials and produce the fingerprint to pin in the session.
    ///
    /// A legacy hash is rejected before any comparison is attempted.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    /// * `version` - Version tag stored alongside the hash
    ///
    /// # Returns
    /// Fingerprint of `stored_hash`
    ///
    /// # Errors
    /// * `ResetRequired` - Hash is a legacy version
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Stored hash is malformed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        version: PasswordVersion,
    ) -> Result<PasswordFingerprint, AuthenticationError> {
        if version.is_legacy() {
            return Err(AuthenticationError::ResetRequired);
        }

        let is_valid = self.password_hasher.verify(password, stored_hash)?;

        if !is_valid {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.fingerprint(stored_hash))
    }

    /// Fingerprint of a stored hash, for pinning or comparison.
    pub fn fingerprint(&self, stored_hash: &str) -> PasswordFingerprint {
        PasswordFingerprint::of(stored_hash)
    }
}
