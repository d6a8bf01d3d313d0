use std::sync::Arc;

use serde::Deserialize;

use crate::adapters::{get_json, DEFAULT_TIMEOUT_MS};
use crate::data_source::{CapabilitySet, SourceAdapter, SourceError, SourceFuture};
use crate::http_client::{HttpClient, HttpRequest};
use crate::{FinancialRecord, Listing, Market, MarketRecord, SourceId, UtcDateTime};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo Finance adapter. Keyless, so always available.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl YahooAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(DEFAULT_BASE_URL),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Yahoo lists Tokyo shares with a `.T` suffix.
    fn yahoo_symbol(listing: &Listing) -> String {
        match listing.market {
            Market::Us => listing.symbol.as_str().to_owned(),
            Market::Jp => format!("{}.T", listing.symbol),
        }
    }

    async fn fetch_market_record(&self, listing: &Listing) -> Result<MarketRecord, SourceError> {
        let request = HttpRequest::get(format!("{}/v7/finance/quote", self.base_url))
            .with_query("symbols", Self::yahoo_symbol(listing))
            .with_timeout_ms(self.timeout_ms);

        let response: YahooQuoteResponse =
            get_json(self.http_client.as_ref(), &SourceId::YAHOO, request).await?;

        if let Some(error) = response.quote_response.error.filter(|error| !error.is_empty()) {
            return Err(SourceError::unavailable(format!("yahoo API error: {error}")));
        }

        let quote = response
            .quote_response
            .result
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::invalid_request(format!("yahoo has no quote for {listing}")))?;

        Ok(MarketRecord {
            price: quote.regular_market_price,
            volume: quote
                .regular_market_volume
                .filter(|volume| *volume >= 0.0)
                .map(|volume| volume as u64),
            pe_ratio: quote.trailing_pe,
            currency: quote.currency,
            timestamp: quote
                .regular_market_time
                .and_then(|seconds| UtcDateTime::from_unix_timestamp(seconds).ok()),
        })
    }

    async fn fetch_financial_record(
        &self,
        listing: &Listing,
    ) -> Result<FinancialRecord, SourceError> {
        let request = HttpRequest::get(format!(
            "{}/v10/finance/quoteSummary/{}",
            self.base_url,
            urlencoding::encode(&Self::yahoo_symbol(listing))
        ))
        .with_query("modules", "financialData,defaultKeyStatistics")
        .with_timeout_ms(self.timeout_ms);

        let response: YahooQuoteSummaryResponse =
            get_json(self.http_client.as_ref(), &SourceId::YAHOO, request).await?;

        if let Some(error) = response.quote_summary.error {
            return Err(SourceError::invalid_request(format!(
                "yahoo quote summary error: {}",
                error.description.unwrap_or_else(|| String::from("unknown"))
            )));
        }

        let result = response
            .quote_summary
            .result
            .into_iter()
            .next()
            .ok_or_else(|| {
                SourceError::invalid_request(format!("yahoo has no financials for {listing}"))
            })?;

        let financial = result.financial_data.unwrap_or_default();
        let statistics = result.default_key_statistics.unwrap_or_default();

        Ok(FinancialRecord {
            revenue: YahooRawValue::number(financial.total_revenue.as_ref()),
            net_income: YahooRawValue::number(statistics.net_income_to_common.as_ref()),
            eps: YahooRawValue::number(statistics.trailing_eps.as_ref()),
            free_cash_flow: YahooRawValue::number(financial.free_cashflow.as_ref()),
            shares_outstanding: YahooRawValue::number(statistics.shares_outstanding.as_ref()),
            report_date: statistics
                .last_fiscal_year_end
                .and_then(|value| value.fmt),
            currency: financial.financial_currency,
        })
    }
}

impl SourceAdapter for YahooAdapter {
    fn id(&self) -> SourceId {
        SourceId::YAHOO
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::full()
    }

    fn is_available(&self) -> bool {
        true
    }

    fn fetch_market<'a>(&'a self, listing: &'a Listing) -> SourceFuture<'a, MarketRecord> {
        Box::pin(self.fetch_market_record(listing))
    }

    fn fetch_financials<'a>(&'a self, listing: &'a Listing) -> SourceFuture<'a, FinancialRecord> {
        Box::pin(self.fetch_financial_record(listing))
    }
}

impl std::fmt::Debug for YahooAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooAdapter")
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

// Yahoo Finance API response structures

#[derive(Debug, Deserialize)]
struct YahooQuoteResponse {
    #[serde(rename = "quoteResponse")]
    quote_response: YahooQuoteResponseData,
}

#[derive(Debug, Deserialize)]
struct YahooQuoteResponseData {
    #[serde(default)]
    result: Vec<YahooQuoteData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuoteData {
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    regular_market_volume: Option<f64>,
    #[serde(rename = "trailingPE", default)]
    trailing_pe: Option<f64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    regular_market_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct YahooQuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: YahooQuoteSummaryData,
}

#[derive(Debug, Deserialize)]
struct YahooQuoteSummaryData {
    #[serde(default)]
    result: Vec<YahooQuoteSummaryResult>,
    #[serde(default)]
    error: Option<YahooSummaryError>,
}

#[derive(Debug, Deserialize)]
struct YahooSummaryError {
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuoteSummaryResult {
    #[serde(default)]
    financial_data: Option<YahooFinancialData>,
    #[serde(default)]
    default_key_statistics: Option<YahooKeyStatistics>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooFinancialData {
    #[serde(default)]
    total_revenue: Option<YahooRawValue>,
    #[serde(default)]
    free_cashflow: Option<YahooRawValue>,
    #[serde(default)]
    financial_currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooKeyStatistics {
    #[serde(default)]
    net_income_to_common: Option<YahooRawValue>,
    #[serde(default)]
    trailing_eps: Option<YahooRawValue>,
    #[serde(default)]
    shares_outstanding: Option<YahooRawValue>,
    #[serde(default)]
    last_fiscal_year_end: Option<YahooRawValue>,
}

/// Yahoo wraps numbers as `{"raw": 1.5, "fmt": "1.50"}`, or `{}` when absent.
#[derive(Debug, Deserialize)]
struct YahooRawValue {
    #[serde(default)]
    raw: Option<f64>,
    #[serde(default)]
    fmt: Option<String>,
}

impl YahooRawValue {
    fn number(value: Option<&Self>) -> Option<f64> {
        value.and_then(|value| value.raw).filter(|raw| raw.is_finite())
    }
}
