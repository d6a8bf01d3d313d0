//! # Domain Models
//!
//! Canonical domain types shared by data acquisition and valuation.
//!
//! Adapters return loosely-typed records ([`MarketRecord`],
//! [`FinancialRecord`]); the failover coordinator validates those into the
//! canonical [`MarketData`] and [`FinancialData`] values handed to the
//! valuation engine.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated ticker |
//! | [`Market`] | Listing country (US, JP) |
//! | [`Listing`] | Symbol qualified by market |
//! | [`MarketData`] | Price, volume, trailing PE |
//! | [`FinancialData`] | Revenue, earnings, free cash flow |
//! | [`UtcDateTime`] | UTC timestamp |

mod models;
mod symbol;
mod timestamp;

pub use models::{
    validate_currency_code, FinancialData, FinancialRecord, MarketData, MarketRecord,
};
pub use symbol::{Listing, Market, Symbol};
pub use timestamp::UtcDateTime;
