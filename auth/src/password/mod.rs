pub mod argon2;
pub mod errors;
pub mod fingerprint;
pub mod version;

pub use argon2::PasswordHasher;
pub use errors::PasswordError;
pub use fingerprint::PasswordFingerprint;
pub use version::PasswordVersion;
