//! Source adapter contract and fetch-failure types.
//!
//! Every provider implements [`SourceAdapter`]. Adapters only translate a
//! provider response into a [`MarketRecord`] or [`FinancialRecord`]; retry,
//! health tracking, caching and validation belong to the
//! [`FailoverCoordinator`](crate::FailoverCoordinator).
//!
//! # Example
//!
//! ```rust,ignore
//! use fairval_core::{Listing, SourceAdapter, SourceError, Symbol, YahooAdapter};
//!
//! async fn fetch_price(adapter: &YahooAdapter) -> Result<(), SourceError> {
//!     let listing = Listing::us(Symbol::parse("AAPL")?);
//!     let record = adapter.fetch_market(&listing).await?;
//!     println!("{:?}", record.price);
//!     Ok(())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{FinancialRecord, Listing, MarketRecord, SourceId, ValidationError};

/// Kind of record requested from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    Market,
    Financials,
}

impl DataKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Financials => "financials",
        }
    }
}

impl Display for DataKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record kinds a source can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    pub market: bool,
    pub financials: bool,
}

impl CapabilitySet {
    pub const fn new(market: bool, financials: bool) -> Self {
        Self { market, financials }
    }

    pub const fn full() -> Self {
        Self::new(true, true)
    }

    pub const fn market_only() -> Self {
        Self::new(true, false)
    }

    pub const fn supports(self, kind: DataKind) -> bool {
        match kind {
            DataKind::Market => self.market,
            DataKind::Financials => self.financials,
        }
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    Unsupported,
    MalformedResponse,
    Internal,
}

/// Structured fetch failure reported by an adapter.
///
/// `retryable` decides whether [`RetryPolicy`](crate::RetryPolicy) tries the
/// same source again or gives up on it immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn unsupported(kind: DataKind) -> Self {
        Self {
            kind: SourceErrorKind::Unsupported,
            message: format!("{kind} data is not supported by this source"),
            retryable: false,
        }
    }

    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::MalformedResponse,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Unsupported => "source.unsupported",
            SourceErrorKind::MalformedResponse => "source.malformed_response",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<ValidationError> for SourceError {
    fn from(value: ValidationError) -> Self {
        Self::invalid_request(value.to_string())
    }
}

/// Boxed future returned by adapter fetches.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Source adapter contract.
///
/// Implementations must be `Send + Sync`; the coordinator shares them across
/// concurrent requests behind an `Arc`.
pub trait SourceAdapter: Send + Sync {
    /// Returns the identifier used in priority lists, health and cache keys.
    fn id(&self) -> SourceId;

    /// Returns the record kinds this source serves.
    fn capabilities(&self) -> CapabilitySet;

    /// Reports whether the source can be used at all, e.g. a credential is configured.
    fn is_available(&self) -> bool;

    /// Fetches the latest market snapshot for a listing.
    fn fetch_market<'a>(&'a self, listing: &'a Listing) -> SourceFuture<'a, MarketRecord>;

    /// Fetches the latest reported financial statement figures for a listing.
    fn fetch_financials<'a>(&'a self, listing: &'a Listing) -> SourceFuture<'a, FinancialRecord>;
}
