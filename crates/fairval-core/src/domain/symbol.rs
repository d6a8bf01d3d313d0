use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_SYMBOL_LEN: usize = 15;

/// Normalized market symbol/ticker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Parse and normalize a symbol to uppercase.
    ///
    /// Tokyo listings are numeric codes, so a leading digit is accepted.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        let normalized = trimmed.to_ascii_uppercase();
        let len = normalized.chars().count();
        if len > MAX_SYMBOL_LEN {
            return Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_SYMBOL_LEN,
            });
        }

        if let Some(first) = normalized.chars().next() {
            if !first.is_ascii_alphanumeric() {
                return Err(ValidationError::SymbolInvalidStart { ch: first });
            }
        }

        for (index, ch) in normalized.chars().enumerate() {
            let valid = ch.is_ascii_alphanumeric() || ch == '.' || ch == '-';
            if !valid {
                return Err(ValidationError::SymbolInvalidChar { ch, index });
            }
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

/// Exchange country a listing trades in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    Us,
    Jp,
}

impl Market {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Us => "US",
            Self::Jp => "JP",
        }
    }

    /// Currency assumed when a provider omits it.
    pub const fn default_currency(self) -> &'static str {
        match self {
            Self::Us => "USD",
            Self::Jp => "JPY",
        }
    }
}

impl Display for Market {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "US" => Ok(Self::Us),
            "JP" => Ok(Self::Jp),
            _ => Err(ValidationError::UnsupportedMarket {
                value: value.to_owned(),
            }),
        }
    }
}

/// A symbol qualified by the market it is listed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Listing {
    pub symbol: Symbol,
    pub market: Market,
}

impl Listing {
    pub fn new(symbol: Symbol, market: Market) -> Self {
        Self { symbol, market }
    }

    pub fn us(symbol: Symbol) -> Self {
        Self::new(symbol, Market::Us)
    }

    /// Parses user input such as `AAPL.US` or `5801.JP`, dropping any `.suffix`.
    pub fn parse(raw_symbol: &str, market: &str) -> Result<Self, ValidationError> {
        let market = market.parse::<Market>()?;
        let code = raw_symbol.trim().split('.').next().unwrap_or_default();
        Ok(Self::new(Symbol::parse(code)?, market))
    }

    /// Symbol in the exchange-prefixed form most providers accept.
    pub fn provider_symbol(&self) -> String {
        match self.market {
            Market::Us => self.symbol.as_str().to_owned(),
            Market::Jp => format!("TYO:{}", self.symbol),
        }
    }
}

impl Display for Listing {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.symbol, self.market)
    }
}
