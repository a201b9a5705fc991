use std::fmt;

use super::errors::PasswordError;

/// Storage generation of a password hash.
///
/// `Legacy` hashes were written by a scheme that is no longer trusted for
/// verification; accounts holding one must reset their password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasswordVersion {
    Legacy,
    Current,
}

impl PasswordVersion {
    /// Parse the numeric tag stored alongside a hash.
    ///
    /// # Errors
    /// * `UnknownVersion` - Tag is neither 1 nor 2
    pub fn from_i32(value: i32) -> Result<Self, PasswordError> {
        match value {
            1 => Ok(Self::Legacy),
            2 => Ok(Self::Current),
            other => Err(PasswordError::UnknownVersion(other)),
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            Self::Legacy => 1,
            Self::Current => 2,
        }
    }

    pub fn is_legacy(self) -> bool {
        matches!(self, Self::Legacy)
    }
}

impl fmt::Display for PasswordVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_i32().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_versions() {
        assert_eq!(PasswordVersion::from_i32(1), Ok(PasswordVersion::Legacy));
        assert_eq!(PasswordVersion::from_i32(2), Ok(PasswordVersion::Current));
        assert_eq!(PasswordVersion::Current.as_i32(), 2);
        assert!(PasswordVersion::Legacy.is_legacy());
    }

    #[test]
    fn test_parse_unknown_version() {
        assert_eq!(
            PasswordVersion::from_i32(3),
            Err(PasswordError::UnknownVersion(3))
        );
    }
}
