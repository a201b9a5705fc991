//! Random secret generation.
//!
//! All values are drawn from the operating system CSPRNG.

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use rand::RngCore;
use sha2::Digest;
use sha2::Sha256;

/// Random string over `[A-Za-z0-9]`.
pub fn random_alphanumeric(length: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// `byte_count` random bytes, hex encoded (`2 * byte_count` characters).
pub fn random_hex(byte_count: usize) -> String {
    let mut bytes = vec![0u8; byte_count];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Lowercase hex SHA-256 of `value`.
pub fn sha256_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// Per-login API token handed to the browser session; stored hashed.
pub fn api_token() -> String {
    random_alphanumeric(32)
}

/// Long-lived account API key issued at registration.
pub fn api_key() -> String {
    random_alphanumeric(64)
}

/// Key that must accompany a logout request.
pub fn logout_key() -> String {
    random_hex(16)
}

/// One-shot password reset key.
pub fn password_reset_key() -> String {
    random_hex(32)
}

/// Opaque server-side session key.
pub fn session_key() -> String {
    random_hex(32)
}

/// Device identity token: the digest of a fresh random string.
pub fn identity_token() -> String {
    sha256_hex(&random_alphanumeric(32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_lower_hex(value: &str) -> bool {
        value
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    }

    #[test]
    fn test_token_shapes() {
        assert_eq!(api_token().len(), 32);
        assert_eq!(api_key().len(), 64);
        assert!(api_key().chars().all(|c| c.is_ascii_alphanumeric()));

        for value in [logout_key(), password_reset_key(), session_key(), identity_token()] {
            assert!(is_lower_hex(&value), "{value} is not lowercase hex");
        }
        assert_eq!(logout_key().len(), 32);
        assert_eq!(password_reset_key().len(), 64);
        assert_eq!(session_key().len(), 64);
        assert_eq!(identity_token().len(), 64);
    }

    #[test]
    fn test_tokens_are_unpredictable() {
        assert_ne!(session_key(), session_key());
        assert_ne!(identity_token(), identity_token());
        assert_ne!(api_token(), api_token());
    }

    #[test]
    fn test_sha256_hex_known_value() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
