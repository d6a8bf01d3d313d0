use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_SOURCE_LEN: usize = 32;

/// Identifier of a data source, used for priority ordering, health and cache scoping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceId(Cow<'static, str>);

impl SourceId {
    /// Financial Modeling Prep, the premium source.
    pub const FMP: Self = Self(Cow::Borrowed("fmp"));
    /// Yahoo Finance, keyless.
    pub const YAHOO: Self = Self(Cow::Borrowed("yahoo"));
    /// Alpha Vantage, quotes only.
    pub const ALPHA_VANTAGE: Self = Self(Cow::Borrowed("alpha_vantage"));

    /// Parse and normalize a source identifier to lowercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_lowercase();
        let valid = !normalized.is_empty()
            && normalized.len() <= MAX_SOURCE_LEN
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-');

        if !valid {
            return Err(ValidationError::InvalidSource {
                value: input.to_owned(),
            });
        }

        Ok(Self(Cow::Owned(normalized)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Default priority: premium first, then the free fallbacks.
    pub fn default_priority() -> Vec<Self> {
        vec![Self::FMP, Self::YAHOO, Self::ALPHA_VANTAGE]
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for SourceId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SourceId> for String {
    fn from(value: SourceId) -> Self {
        value.0.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_source() {
        let parsed = SourceId::parse(" FMP ").expect("source should parse");
        assert_eq!(parsed, SourceId::FMP);
    }

    #[test]
    fn rejects_invalid_source() {
        assert!(matches!(
            SourceId::parse("alpha vantage"),
            Err(ValidationError::InvalidSource { .. })
        ));
        assert!(SourceId::parse("").is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&SourceId::ALPHA_VANTAGE).expect("serialize");
        assert_eq!(json, "\"alpha_vantage\"");
        let back: SourceId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, SourceId::ALPHA_VANTAGE);
    }
}
