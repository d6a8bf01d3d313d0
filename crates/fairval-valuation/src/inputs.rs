use fairval_core::{FinancialData, MarketData};
use serde::Serialize;

use crate::ValuationError;

/// PE used when the trailing multiple is missing or outside `(0, 50]`.
pub const DEFAULT_REFERENCE_PE: f64 = 15.0;

/// Trailing multiples above this are treated as noise.
pub const MAX_REFERENCE_PE: f64 = 50.0;

/// Immutable market and financial snapshot for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationInputs {
    market: MarketData,
    financials: FinancialData,
}

impl ValuationInputs {
    /// Fails unless the current price is finite and positive.
    pub fn new(market: MarketData, financials: FinancialData) -> Result<Self, ValuationError> {
        if !market.price.is_finite() || market.price <= 0.0 {
            return Err(ValuationError::InvalidInput(format!(
                "current price must be positive, got {}",
                market.price
            )));
        }

        Ok(Self { market, financials })
    }

    pub fn market(&self) -> &MarketData {
        &self.market
    }

    pub fn financials(&self) -> &FinancialData {
        &self.financials
    }

    pub fn current_price(&self) -> f64 {
        self.market.price
    }

    /// Missing EPS contributes nothing to the PE leg.
    pub fn eps(&self) -> f64 {
        self.financials.eps.unwrap_or(0.0)
    }

    /// Center of the PE draw distribution.
    pub fn reference_pe(&self) -> f64 {
        match self.market.pe_ratio {
            Some(pe) if pe.is_finite() && pe > 0.0 && pe <= MAX_REFERENCE_PE => pe,
            _ => DEFAULT_REFERENCE_PE,
        }
    }
}

/// Parameters sampled for one Monte Carlo iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationDraw {
    pub growth_rate: f64,
    pub discount_rate: f64,
    pub terminal_growth: f64,
    pub pe_multiple: f64,
    /// Earnings growth is assumed to move one-for-one with cash flow growth.
    pub earnings_growth_correlation: f64,
}
