use serde::{Deserialize, Serialize};

use crate::{Listing, SourceId, UtcDateTime, ValidationError};

/// Market snapshot as an adapter extracted it from a provider response.
///
/// Fields are optional because providers omit them freely; the coordinator
/// turns a record into [`MarketData`] only after validating it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    pub price: Option<f64>,
    pub volume: Option<u64>,
    pub pe_ratio: Option<f64>,
    pub currency: Option<String>,
    pub timestamp: Option<UtcDateTime>,
}

/// Financial statement figures as an adapter extracted them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub eps: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub report_date: Option<String>,
    pub currency: Option<String>,
}

/// Canonical, validated market data for one listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub source: SourceId,
    pub price: f64,
    pub volume: u64,
    pub pe_ratio: Option<f64>,
    pub currency: String,
    pub timestamp: UtcDateTime,
}

impl MarketData {
    /// Validates the record shape and normalizes it into the shared type.
    ///
    /// `price` must be present, finite and positive. A missing currency falls
    /// back to the listing market's currency, a missing timestamp to now, and
    /// a non-finite PE ratio is dropped.
    pub fn from_record(
        source: &SourceId,
        listing: &Listing,
        record: MarketRecord,
    ) -> Result<Self, ValidationError> {
        let price = required("price", record.price)?;
        if price <= 0.0 {
            return Err(ValidationError::NonPositiveValue { field: "price" });
        }

        let currency = record
            .currency
            .as_deref()
            .unwrap_or(listing.market.default_currency());

        Ok(Self {
            source: source.clone(),
            price,
            volume: record.volume.unwrap_or(0),
            pe_ratio: record.pe_ratio.filter(|value| value.is_finite()),
            currency: validate_currency_code(currency)?,
            timestamp: record.timestamp.unwrap_or_else(UtcDateTime::now),
        })
    }
}

/// Canonical, validated financial statement data for one listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialData {
    pub source: SourceId,
    pub revenue: f64,
    pub net_income: f64,
    pub eps: Option<f64>,
    pub free_cash_flow: f64,
    pub shares_outstanding: f64,
    pub report_date: String,
    pub currency: String,
}

impl FinancialData {
    /// Validates the record shape and normalizes it into the shared type.
    ///
    /// `revenue` and `net_income` must be present and finite. Free cash flow
    /// and share count default to zero when absent.
    pub fn from_record(
        source: &SourceId,
        listing: &Listing,
        record: FinancialRecord,
    ) -> Result<Self, ValidationError> {
        let revenue = required("revenue", record.revenue)?;
        let net_income = required("net_income", record.net_income)?;
        let free_cash_flow = optional_finite("free_cash_flow", record.free_cash_flow)?;
        let shares_outstanding =
            optional_finite("shares_outstanding", record.shares_outstanding)?;
        if shares_outstanding < 0.0 {
            return Err(ValidationError::NegativeValue {
                field: "shares_outstanding",
            });
        }

        let currency = record
            .currency
            .as_deref()
            .unwrap_or(listing.market.default_currency());

        Ok(Self {
            source: source.clone(),
            revenue,
            net_income,
            eps: record.eps.filter(|value| value.is_finite()),
            free_cash_flow,
            shares_outstanding,
            report_date: record.report_date.unwrap_or_default(),
            currency: validate_currency_code(currency)?,
        })
    }
}

/// Validate and normalize currency to uppercase 3-letter code.
pub fn validate_currency_code(input: &str) -> Result<String, ValidationError> {
    let normalized = input.trim().to_ascii_uppercase();
    let is_valid = normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphabetic());

    if !is_valid {
        return Err(ValidationError::InvalidCurrency {
            value: input.to_owned(),
        });
    }

    Ok(normalized)
}

fn required(field: &'static str, value: Option<f64>) -> Result<f64, ValidationError> {
    let value = value.ok_or(ValidationError::MissingField { field })?;
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    Ok(value)
}

fn optional_finite(field: &'static str, value: Option<f64>) -> Result<f64, ValidationError> {
    match value {
        Some(value) if !value.is_finite() => Err(ValidationError::NonFiniteValue { field }),
        Some(value) => Ok(value),
        None => Ok(0.0),
    }
}
