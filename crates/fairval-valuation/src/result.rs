use fairval_core::Listing;
use serde::{Deserialize, Serialize};
use time::macros::{date, format_description};
use time::Date;
use tracing::error;

use crate::ValuationInputs;

/// Interquartile fair-value band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationRange {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

/// Share of draws below, above, and within 10% of the current price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationProbabilities {
    pub undervalued: f64,
    pub overvalued: f64,
    pub fair_valued: f64,
}

impl ValuationProbabilities {
    pub fn total(&self) -> f64 {
        self.undervalued + self.overvalued + self.fair_valued
    }
}

/// Output of one Monte Carlo run. Prices carry 2 decimals, probabilities 4.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub valuation_range: ValuationRange,
    pub probabilities: ValuationProbabilities,
    pub next_quarters: [f64; 4],
}

/// Stand-in when a provider's report date cannot be read.
pub const FALLBACK_REPORT_DATE: Date = date!(1982 - 09 - 17);

/// Flat mapping handed to notification templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationReport {
    pub symbol: String,
    pub report_date: String,
    pub current_price: f64,
    pub currency: String,
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub undervalued_prob: f64,
    pub overvalued_prob: f64,
    pub fair_valued_prob: f64,
    pub next_quarters: [f64; 4],
}

impl ValuationReport {
    pub fn new(listing: &Listing, inputs: &ValuationInputs, result: &ValuationResult) -> Self {
        let market = inputs.market();
        Self {
            symbol: listing.to_string(),
            report_date: format_report_date(&inputs.financials().report_date),
            current_price: market.price,
            currency: market.currency.clone(),
            low: result.valuation_range.low,
            medium: result.valuation_range.medium,
            high: result.valuation_range.high,
            undervalued_prob: result.probabilities.undervalued,
            overvalued_prob: result.probabilities.overvalued,
            fair_valued_prob: result.probabilities.fair_valued,
            next_quarters: result.next_quarters,
        }
    }
}

/// Normalizes a provider date such as `2024-03-31 00:00:00` to `YYYY-MM-DD`.
pub fn format_report_date(raw: &str) -> String {
    let format = format_description!("[year]-[month]-[day]");
    let parsed = raw
        .get(..10)
        .and_then(|prefix| Date::parse(prefix, &format).ok());

    let date = match parsed {
        Some(date) => date,
        None => {
            error!(raw = %raw, "unreadable report date, using fallback");
            FALLBACK_REPORT_DATE
        }
    };

    date.format(&format)
        .unwrap_or_else(|_| String::from("1982-09-17"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_date_keeps_first_ten_characters() {
        assert_eq!(format_report_date("2024-03-31"), "2024-03-31");
        assert_eq!(format_report_date("2024-03-31T00:00:00Z"), "2024-03-31");
        assert_eq!(format_report_date("2024-03-31 16:00:00"), "2024-03-31");
    }

    #[test]
    fn unreadable_report_date_falls_back() {
        assert_eq!(format_report_date(""), "1982-09-17");
        assert_eq!(format_report_date("31/03/2024"), "1982-09-17");
        assert_eq!(format_report_date("2024-13-01"), "1982-09-17");
    }

    #[test]
    fn probabilities_total() {
        let probabilities = ValuationProbabilities {
            undervalued: 0.25,
            overvalued: 0.5,
            fair_valued: 0.25,
        };
        assert_eq!(probabilities.total(), 1.0);
    }
}
