use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid UUID: \"{0}\"")]
pub struct ParseUuidError(pub String);

/// Opaque identifier of every element in a project.
///
/// Only non-nil, lowercase hyphenated UUIDs are accepted when parsing, so the
/// textual form of a value is always the same as the one it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uuid(uuid::Uuid);

impl Uuid {
    /// Create a new random (v4) identifier.
    pub fn new_random() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Build an identifier from a raw 128 bit value. Mostly useful for
    /// fixtures and tests that need stable identifiers.
    pub const fn from_u128(value: u128) -> Self {
        Self(uuid::Uuid::from_u128(value))
    }

    pub fn parse(text: &str) -> Result<Self, ParseUuidError> {
        let parsed =
            uuid::Uuid::parse_str(text).map_err(|_| ParseUuidError(text.to_string()))?;
        if parsed.is_nil() || parsed.hyphenated().to_string() != text {
            return Err(ParseUuidError(text.to_string()));
        }
        Ok(Self(parsed))
    }

    pub fn to_str(&self) -> String {
        self.0.hyphenated().to_string()
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for Uuid {
    type Err = ParseUuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Uuid {
    type Error = ParseUuidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Uuid> for String {
    fn from(value: Uuid) -> Self {
        value.to_str()
    }
}
