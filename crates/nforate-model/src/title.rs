use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// An IMDb title identifier such as `tt0111161`.
///
/// Always `tt` followed by at least one ASCII digit. Surrounding whitespace
/// is stripped on construction, nothing else is normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TitleId(String);

impl TitleId {
    pub const PREFIX: &'static str = "tt";

    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let trimmed = raw.trim();
        let valid = trimmed
            .strip_prefix(Self::PREFIX)
            .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()));

        if valid {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ModelError::InvalidTitleId(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TitleId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TitleId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TitleId> for String {
    fn from(id: TitleId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let id = TitleId::parse("tt0111161").unwrap();
        assert_eq!(id.as_str(), "tt0111161");
        assert_eq!(id.to_string(), "tt0111161");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let id: TitleId = "  tt0068646\n".parse().unwrap();
        assert_eq!(id.as_str(), "tt0068646");
    }

    #[test]
    fn test_parse_rejects_bad_identifiers() {
        for raw in ["", "tt", "0111161", "nm0000151", "tt01a1161", "TT0111161", "tt 0111161"] {
            assert_eq!(
                TitleId::parse(raw),
                Err(ModelError::InvalidTitleId(raw.trim().to_string())),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_serde_validates() {
        let id: TitleId = serde_json::from_str("\"tt0133093\"").unwrap();
        assert_eq!(id.as_str(), "tt0133093");
        assert!(serde_json::from_str::<TitleId>("\"12345\"").is_err());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"tt0133093\"");
    }
}
