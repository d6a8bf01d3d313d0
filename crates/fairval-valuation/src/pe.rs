use crate::ValuationError;

/// Reference multiple the peer PE is averaged against.
pub const REFERENCE_PE: f64 = 15.0;

/// Growth- and peer-adjusted price/earnings model.
///
/// `value = net_income * pe * (1 + growth / 100) * industry_pe / mean(industry_pe, 15)`.
/// `earnings_growth` is in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeValuation {
    net_income: f64,
    industry_pe: f64,
}

impl PeValuation {
    pub fn new(net_income: f64, industry_pe: f64) -> Result<Self, ValuationError> {
        if !net_income.is_finite() {
            return Err(ValuationError::InvalidInput(String::from(
                "net income must be finite",
            )));
        }
        if !industry_pe.is_finite() || industry_pe <= 0.0 {
            return Err(ValuationError::InvalidParameters(format!(
                "industry PE must be positive, got {industry_pe}"
            )));
        }

        Ok(Self {
            net_income,
            industry_pe,
        })
    }

    /// Scale applied for the peer premium or discount.
    pub fn peer_adjustment(&self) -> f64 {
        self.industry_pe / ((self.industry_pe + REFERENCE_PE) / 2.0)
    }

    pub fn adjusted_pe(&self, pe_ratio: f64, earnings_growth: f64) -> f64 {
        pe_ratio * (1.0 + earnings_growth / 100.0) * self.peer_adjustment()
    }

    pub fn calculate(&self, pe_ratio: f64, earnings_growth: f64) -> f64 {
        self.net_income * self.adjusted_pe(pe_ratio, earnings_growth)
    }
}
