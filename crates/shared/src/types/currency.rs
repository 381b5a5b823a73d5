//! Three-letter currency codes.
//!
//! The set of currencies is open: any code of three uppercase ASCII letters is accepted.
//! Which currencies get balance rows eagerly is a configuration concern, not a type concern.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string is not a valid currency code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid currency code '{0}': expected three uppercase letters")]
pub struct CurrencyCodeError(pub String);

/// A validated ISO-4217-shaped currency code, e.g. `PLN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    /// Parses a currency code, rejecting anything but `^[A-Z]{3}$`.
    ///
    /// # Errors
    ///
    /// Returns `CurrencyCodeError` when the input is not three uppercase ASCII letters.
    pub fn parse(code: &str) -> Result<Self, CurrencyCodeError> {
        let bytes = code.as_bytes();
        match bytes {
            [a, b, c] if bytes.iter().all(u8::is_ascii_uppercase) => Ok(Self([*a, *b, *c])),
            _ => Err(CurrencyCodeError(code.to_string())),
        }
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only ASCII uppercase bytes are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = CurrencyCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.as_str().to_string()
    }
}
