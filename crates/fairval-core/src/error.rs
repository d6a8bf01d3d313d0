use thiserror::Error;

/// Validation and contract errors exposed by `fairval-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter or digit: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("unsupported market '{value}', expected one of US, JP")]
    UnsupportedMarket { value: String },
    #[error("invalid source id '{value}', expected lowercase [a-z0-9_-]")]
    InvalidSource { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("unix timestamp {value} is out of range")]
    TimestampOutOfRange { value: i64 },

    #[error("currency must be a 3-letter uppercase ISO code: '{value}'")]
    InvalidCurrency { value: String },

    #[error("required field '{field}' is missing")]
    MissingField { field: &'static str },
    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("field '{field}' must be greater than zero")]
    NonPositiveValue { field: &'static str },
}

/// Invalid configuration supplied to a coordinator or engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("source priority list must name at least one source")]
    EmptyPriority,
    #[error("source '{source_id}' appears more than once in the priority list")]
    DuplicateSource { source_id: String },
    #[error("'{field}' must be greater than zero")]
    NotPositive { field: &'static str },
    #[error("'{field}' must lie within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
}
