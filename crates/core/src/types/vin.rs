//! Vehicle identification number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Vin`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum VinError {
    /// The input is not exactly 17 characters long.
    #[error("VIN must be exactly {expected} characters, got {got}")]
    InvalidLength {
        /// Required length.
        expected: usize,
        /// Actual length of the input.
        got: usize,
    },
    /// The input contains a character outside the VIN alphabet.
    #[error("VIN contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// A vehicle identification number.
///
/// ## Constraints
///
/// - Exactly 17 characters (ISO 3779)
/// - Uppercase letters and digits only
/// - The letters I, O and Q are excluded from the VIN alphabet
///
/// Input is uppercased and trimmed before validation, so scraped values
/// in mixed case parse cleanly.
///
/// ## Examples
///
/// ```
/// use dealerdesk_core::Vin;
///
/// assert!(Vin::parse("WVWZZZ1JZXW000001").is_ok());
/// assert!(Vin::parse("wvwzzz1jzxw000001").is_ok()); // normalized
///
/// assert!(Vin::parse("SHORT").is_err());             // wrong length
/// assert!(Vin::parse("WVWZZZ1JZXW00000I").is_err()); // I not allowed
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Vin(String);

impl Vin {
    /// Required length of a VIN (ISO 3779).
    pub const LENGTH: usize = 17;

    /// Parse a `Vin` from a string, uppercasing and trimming first.
    ///
    /// # Errors
    ///
    /// Returns an error if the normalized input:
    /// - Is not exactly 17 characters long
    /// - Contains a character outside `A-Z0-9` (or one of I, O, Q)
    pub fn parse(s: &str) -> Result<Self, VinError> {
        let normalized = s.trim().to_uppercase();

        if normalized.chars().count() != Self::LENGTH {
            return Err(VinError::InvalidLength {
                expected: Self::LENGTH,
                got: normalized.chars().count(),
            });
        }

        for c in normalized.chars() {
            let valid = matches!(c, 'A'..='Z' | '0'..='9') && !matches!(c, 'I' | 'O' | 'Q');
            if !valid {
                return Err(VinError::InvalidCharacter(c));
            }
        }

        Ok(Self(normalized))
    }

    /// Returns the VIN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Vin` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Vin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Vin {
    type Err = VinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Vin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Vin {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Vin {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Vin {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_vins() {
        assert!(Vin::parse("WVWZZZ1JZXW000001").is_ok());
        assert!(Vin::parse("1HGBH41JXMN109186").is_ok());
        assert!(Vin::parse("ABCDEFGHJKLMNPRST").is_ok());
    }

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let vin = Vin::parse("  wvwzzz1jzxw000001 ").unwrap();
        assert_eq!(vin.as_str(), "WVWZZZ1JZXW000001");
    }

    #[test]
    fn test_parse_wrong_length() {
        assert!(matches!(
            Vin::parse("SHORT"),
            Err(VinError::InvalidLength { got: 5, .. })
        ));
        assert!(matches!(
            Vin::parse("WVWZZZ1JZXW0000001"),
            Err(VinError::InvalidLength { got: 18, .. })
        ));
        assert!(matches!(
            Vin::parse(""),
            Err(VinError::InvalidLength { got: 0, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_forbidden_letters() {
        assert!(matches!(
            Vin::parse("WVWZZZ1JZXW00000I"),
            Err(VinError::InvalidCharacter('I'))
        ));
        assert!(matches!(
            Vin::parse("WVWZZZ1JZXW00000O"),
            Err(VinError::InvalidCharacter('O'))
        ));
        assert!(matches!(
            Vin::parse("WVWZZZ1JZXW00000Q"),
            Err(VinError::InvalidCharacter('Q'))
        ));
    }

    #[test]
    fn test_parse_rejects_symbols() {
        assert!(matches!(
            Vin::parse("WVWZZZ1JZXW00000-"),
            Err(VinError::InvalidCharacter('-'))
        ));
    }

    #[test]
    fn test_display() {
        let vin = Vin::parse("WVWZZZ1JZXW000001").unwrap();
        assert_eq!(format!("{vin}"), "WVWZZZ1JZXW000001");
    }

    #[test]
    fn test_serde_roundtrip() {
        let vin = Vin::parse("WVWZZZ1JZXW000001").unwrap();
        let json = serde_json::to_string(&vin).unwrap();
        assert_eq!(json, "\"WVWZZZ1JZXW000001\"");

        let parsed: Vin = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vin);
    }

    #[test]
    fn test_from_str() {
        let vin: Vin = "WVWZZZ1JZXW000001".parse().unwrap();
        assert_eq!(vin.as_str(), "WVWZZZ1JZXW000001");
    }
}
