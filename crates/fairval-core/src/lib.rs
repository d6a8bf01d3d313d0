//! # Fairval Core
//!
//! Data acquisition for the fairval valuation engine.
//!
//! ## Overview
//!
//! - **Canonical domain models** for listings, market data and financials
//! - **Source identifiers** and the [`SourceAdapter`] contract
//! - **Concrete adapters** for Financial Modeling Prep, Yahoo Finance and Alpha Vantage
//! - **Failover** across sources in priority order, with health tracking,
//!   bounded retry and a TTL cache
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (FMP, Yahoo, Alpha Vantage) |
//! | [`cache`] | In-memory TTL cache |
//! | [`config`] | Acquisition settings |
//! | [`data_source`] | Adapter trait and fetch-failure types |
//! | [`domain`] | Domain models (Listing, MarketData, FinancialData) |
//! | [`error`] | Validation and configuration errors |
//! | [`failover`] | Priority-ordered acquisition |
//! | [`health`] | Per-source health accounting |
//! | [`http_client`] | HTTP client abstraction |
//! | [`registry`] | Adapter registry and builder |
//! | [`retry`] | Retry with exponential backoff |
//! | [`source`] | Source identifiers |
//! | [`throttling`] | Client-side rate budget |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fairval_core::{AdapterRegistryBuilder, FailoverCoordinator, Listing, SourcesConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = AdapterRegistryBuilder::from_env().build();
//!     let coordinator = FailoverCoordinator::new(registry, &SourcesConfig::default())?;
//!
//!     let listing = Listing::parse("AAPL", "US")?;
//!     let market = coordinator.get_market_data(&listing).await?;
//!     println!("{listing}: {:.2} {} via {}", market.price, market.currency, market.source);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐     ┌──────────────────┐
//! │ FailoverCoordinator  │────▶│ HealthTracker    │
//! │                      │────▶│ CacheStore       │
//! └──────────┬───────────┘     └──────────────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │ RetryPolicy          │
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐     ┌──────────────────┐
//! │ SourceAdapter        │────▶│ HttpClient       │
//! │ (FMP, Yahoo, AV)     │     │ (reqwest)        │
//! └──────────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use fairval_core::{SourceError, SourceErrorKind};
//!
//! fn handle_error(error: SourceError) {
//!     match error.kind() {
//!         SourceErrorKind::RateLimited | SourceErrorKind::Unavailable => {
//!             // retried, then failed over
//!         }
//!         SourceErrorKind::InvalidRequest => {
//!             // failed over without retry
//!         }
//!         _ => {}
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - API keys are read from environment variables by [`AdapterRegistryBuilder::from_env`] only
//! - Keys are masked in every logged URL

pub mod adapters;
pub mod cache;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod failover;
pub mod health;
pub mod http_client;
pub mod registry;
pub mod retry;
pub mod source;
pub mod throttling;

// Adapter implementations
pub use adapters::{AlphaVantageAdapter, FmpAdapter, YahooAdapter};

// Caching
pub use cache::{CacheKey, CacheStore, CachedRecord, DEFAULT_CACHE_TTL};

// Configuration
pub use config::SourcesConfig;

// Adapter contract
pub use data_source::{
    CapabilitySet, DataKind, SourceAdapter, SourceError, SourceErrorKind, SourceFuture,
};

// Domain models
pub use domain::{
    validate_currency_code, FinancialData, FinancialRecord, Listing, Market, MarketData,
    MarketRecord, Symbol, UtcDateTime,
};

// Error types
pub use error::{ConfigError, ValidationError};

// Failover
pub use failover::{AcquisitionError, AttemptOutcome, FailoverCoordinator, SkipReason, SourceAttempt};

// Health
pub use health::{HealthStatus, HealthTracker, HEALTHY_SUCCESS_RATIO};

// Transport
pub use http_client::{HttpClient, HttpError, HttpFuture, HttpRequest, HttpResponse, ReqwestHttpClient};

// Registry
pub use registry::{AdapterRegistry, AdapterRegistryBuilder};

// Retry
pub use retry::{Backoff, FetchError, RetryPolicy};

// Source identifiers
pub use source::SourceId;

// Throttling
pub use throttling::RateBudget;
