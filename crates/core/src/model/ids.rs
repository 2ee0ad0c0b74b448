use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while building a `CalcId`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalcIdError {
    #[error("calculation id must not be empty")]
    Empty,
}

/// Opaque identifier of a calculation on the remote engine.
///
/// The engine hands out numeric ids, but the client never does arithmetic on
/// them, so the value is kept as trimmed text. JSON numbers and strings both
/// deserialize into a `CalcId`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawCalcId", into = "String")]
pub struct CalcId(String);

impl CalcId {
    /// Creates a new `CalcId`.
    ///
    /// # Errors
    ///
    /// Returns `CalcIdError::Empty` if the id is empty or only whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, CalcIdError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(CalcIdError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the id as text, ready to be used as a URL path segment.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for CalcId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl FromStr for CalcId {
    type Err = CalcIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<CalcId> for String {
    fn from(id: CalcId) -> Self {
        id.0
    }
}

impl fmt::Debug for CalcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CalcId({})", self.0)
    }
}

impl fmt::Display for CalcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCalcId {
    Number(u64),
    Text(String),
}

impl TryFrom<RawCalcId> for CalcId {
    type Error = CalcIdError;

    fn try_from(raw: RawCalcId) -> Result<Self, Self::Error> {
        match raw {
            RawCalcId::Number(value) => Ok(Self::from(value)),
            RawCalcId::Text(text) => Self::new(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_ids() {
        assert_eq!(CalcId::new(""), Err(CalcIdError::Empty));
        assert_eq!(CalcId::new("   "), Err(CalcIdError::Empty));
        assert!("".parse::<CalcId>().is_err());
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let id = CalcId::new(" 42 ").unwrap();
        assert_eq!(id.as_str(), "42");
        assert_eq!(id.to_string(), "42");
        assert_eq!(format!("{id:?}"), "CalcId(42)");
    }

    #[test]
    fn deserializes_numbers_and_strings() {
        let from_number: CalcId = serde_json::from_str("17").unwrap();
        let from_text: CalcId = serde_json::from_str("\"17\"").unwrap();
        assert_eq!(from_number, from_text);
        assert!(serde_json::from_str::<CalcId>("\"\"").is_err());
    }

    #[test]
    fn serializes_as_text() {
        let id = CalcId::from(9);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"9\"");
    }
}
