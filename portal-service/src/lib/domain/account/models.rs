use std::fmt;
use std::str::FromStr;

use auth::PasswordVersion;
use serde::Deserialize;
use serde::Serialize;

use crate::account::errors::EmailError;
use crate::account::errors::PasswordPolicyError;
use crate::account::errors::UserIdError;
use crate::account::errors::UsernameError;
use crate::account::privileges::Privileges;
use crate::account::privileges::UserFlags;
use crate::domain::identity::models::IdentityToken;
use crate::domain::session::models::SessionData;

/// Numeric account identifier. Zero is reserved for "nobody".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    pub const ANONYMOUS: Self = Self(0);

    /// Parse a user ID from string.
    ///
    /// # Arguments
    /// * `s` - Decimal id, as found in query strings
    ///
    /// # Errors
    /// * `InvalidFormat` - Not a positive integer
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        match s.trim().parse::<i64>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            Ok(id) => Err(UserIdError::InvalidFormat(id.to_string())),
            Err(e) => Err(UserIdError::InvalidFormat(e.to_string())),
        }
    }

    pub fn is_anonymous(self) -> bool {
        self.0 <= 0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username value type
///
/// 2 to 15 characters from `A-Za-z0-9`, space, `_`, `[`, `]` and `-`, never
/// mixing underscores with spaces (both map to the same safe form).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    const MIN_LENGTH: usize = 2;
    const MAX_LENGTH: usize = 15;

    /// Create a new valid username.
    ///
    /// # Errors
    /// * `InvalidFormat` - Length or character set violated
    /// * `MixedSeparators` - Contains both `_` and a space
    pub fn new(username: String) -> Result<Self, UsernameError> {
        let length = username.chars().count();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&length) {
            return Err(UsernameError::InvalidFormat);
        }

        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '[' | ']' | '-'))
        {
            return Err(UsernameError::InvalidFormat);
        }

        if username.contains('_') && username.contains(' ') {
            return Err(UsernameError::MixedSeparators);
        }

        Ok(Self(username))
    }

    /// Lookup form used for uniqueness: lowercase, spaces as underscores.
    pub fn safe(&self) -> String {
        safe_username(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Safe form of an arbitrary (possibly unvalidated) username or login input.
pub fn safe_username(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

const COMMON_PASSWORDS: &[&str] = &[
    "password", "12345678", "123456789", "1234567890", "qwertyuiop", "iloveyou",
    "trustno1", "baseball", "football", "starwars", "superman", "1qaz2wsx",
    "jennifer", "sunshine", "computer", "michelle", "11111111", "princess",
    "987654321", "corvette", "1234qwer", "88888888", "internet", "samantha",
    "whatever", "maverick", "steelers", "mercedes", "123123123", "qwer1234",
    "hardcore", "q1w2e3r4", "midnight", "bigdaddy", "victoria", "1q2w3e4r",
    "cocacola", "marlboro", "asdfasdf", "87654321", "password1", "password123",
    "abc12345", "abcd1234", "qwerty123", "letmein1", "welcome1", "monkey123",
    "dragon123", "master123",
];

/// Check a new password against the minimum length and the common list.
pub fn validate_password(password: &str) -> Result<(), PasswordPolicyError> {
    if password.len() < 8 {
        return Err(PasswordPolicyError::TooShort);
    }

    let lower = password.to_lowercase();
    if COMMON_PASSWORDS.contains(&lower.as_str()) {
        return Err(PasswordPolicyError::TooCommon);
    }

    Ok(())
}

/// Live credential record used for login and per-request verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub user_id: UserId,
    pub username: String,
    pub password_hash: String,
    pub password_version: PasswordVersion,
    pub privileges: Privileges,
    pub flags: UserFlags,
}

/// Addressing data for password recovery mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountContact {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClanMembership {
    pub clan_id: i64,
    pub is_owner: bool,
}

impl ClanMembership {
    const OWNER_PERMS: i32 = 8;

    pub fn from_perms(clan_id: i64, perms: i32) -> Self {
        Self {
            clan_id,
            is_owner: perms == Self::OWNER_PERMS,
        }
    }
}

/// Identity attached to every request after hydration.
///
/// Always present. An anonymous visitor carries the zero value, so handlers
/// never have to distinguish "missing" from "anonymous".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestIdentity {
    pub user_id: UserId,
    pub username: String,
    pub privileges: Privileges,
    pub flags: UserFlags,
    pub clan_id: i64,
    pub clan_is_owner: bool,
    pub token: String,
}

impl RequestIdentity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Identity for a credential that passed verification.
    pub fn verified(
        credential: &Credential,
        membership: Option<ClanMembership>,
        token: Option<String>,
    ) -> Self {
        let (clan_id, clan_is_owner) = membership
            .map(|m| (m.clan_id, m.is_owner))
            .unwrap_or_default();

        Self {
            user_id: credential.user_id,
            username: credential.username.clone(),
            privileges: credential.privileges,
            flags: credential.flags,
            clan_id,
            clan_is_owner,
            token: token.unwrap_or_default(),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        !self.user_id.is_anonymous()
    }
}

/// Row to insert for a new registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: Username,
    pub email: EmailAddress,
    pub password_hash: String,
    pub api_key: String,
    pub privileges: Privileges,
    pub registered_at: i64,
}

#[derive(Debug, Clone)]
pub struct LoginCommand {
    /// Username (any casing, spaces or underscores) or email address.
    pub identifier: String,
    pub password: String,
    pub client_ip: String,
}

#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub username: Username,
    pub email: EmailAddress,
    pub password: String,
    pub client_ip: String,
}

impl RegisterCommand {
    /// Validate raw form input into a registration command.
    ///
    /// # Errors
    /// * `UsernameError` - Username rules violated
    /// * `EmailError` - Email malformed
    pub fn parse(
        username: String,
        email: String,
        password: String,
        client_ip: String,
    ) -> Result<Self, crate::account::errors::AccountError> {
        Ok(Self {
            username: Username::new(username)?,
            email: EmailAddress::new(email)?,
            password,
            client_ip,
        })
    }
}

/// Successful credential check, ready to become a session.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user_id: UserId,
    pub username: String,
    pub session: SessionData,
    pub identity_token: IdentityToken,
}

#[derive(Debug, Clone)]
pub enum LoginOutcome {
    SignedIn(SignedIn),
    /// Password was right but the account has not been verified yet. The
    /// caller still delivers the identity token so the registration flow can
    /// resume on this device.
    PendingVerification {
        user_id: UserId,
        identity_token: IdentityToken,
    },
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub user_id: UserId,
    pub identity_token: IdentityToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_accepts_allowed_characters() {
        for name in ["ab", "Cookie Monster", "x_y-z", "[Clan]Tag", "abcdefghijklmno"] {
            assert!(Username::new(name.to_string()).is_ok(), "{name} rejected");
        }
    }

    #[test]
    fn test_username_rejects_invalid() {
        assert_eq!(Username::new("a".into()), Err(UsernameError::InvalidFormat));
        assert_eq!(
            Username::new("abcdefghijklmnop".into()),
            Err(UsernameError::InvalidFormat)
        );
        assert_eq!(Username::new("osu!".into()), Err(UsernameError::InvalidFormat));
        assert_eq!(Username::new("ümlaut".into()), Err(UsernameError::InvalidFormat));
        assert_eq!(
            Username::new("mixed_up name".into()),
            Err(UsernameError::MixedSeparators)
        );
    }

    #[test]
    fn test_safe_username() {
        let username = Username::new("Cookie Monster".to_string()).unwrap();
        assert_eq!(username.safe(), "cookie_monster");
        assert_eq!(safe_username("  Cookie_Monster "), "cookie_monster");
    }

    #[test]
    fn test_user_id_parsing() {
        assert_eq!(UserId::from_string("42"), Ok(UserId(42)));
        assert!(UserId::from_string("0").is_err());
        assert!(UserId::from_string("-3").is_err());
        assert!(UserId::from_string("abc").is_err());
        assert!(UserId::ANONYMOUS.is_anonymous());
    }

    #[test]
    fn test_password_policy() {
        assert_eq!(validate_password("short"), Err(PasswordPolicyError::TooShort));
        assert_eq!(validate_password("PassWord1"), Err(PasswordPolicyError::TooCommon));
        assert_eq!(validate_password("correct horse battery"), Ok(()));
    }

    #[test]
    fn test_clan_membership_owner() {
        assert!(ClanMembership::from_perms(3, 8).is_owner);
        assert!(!ClanMembership::from_perms(3, 1).is_owner);
    }

    #[test]
    fn test_anonymous_identity_is_zero_valued() {
        let identity = RequestIdentity::anonymous();
        assert!(!identity.is_logged_in());
        assert_eq!(identity.privileges, Privileges::empty());
        assert_eq!(identity.clan_id, 0);
        assert!(identity.token.is_empty());
    }

    #[test]
    fn test_verified_identity_copies_credential() {
        let credential = Credential {
            user_id: UserId(42),
            username: "alice".to_string(),
            password_hash: "h".to_string(),
            password_version: PasswordVersion::Current,
            privileges: Privileges::from_bits(3),
            flags: UserFlags::from_bits(0),
        };

        let identity = RequestIdentity::verified(
            &credential,
            Some(ClanMembership::from_perms(9, 8)),
            Some("tok".to_string()),
        );

        assert_eq!(identity.user_id, UserId(42));
        assert_eq!(identity.privileges, Privileges::from_bits(3));
        assert_eq!(identity.clan_id, 9);
        assert!(identity.clan_is_owner);
        assert_eq!(identity.token, "tok");
    }
}
