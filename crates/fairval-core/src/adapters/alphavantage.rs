use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::adapters::{get_json, parse_number, DEFAULT_TIMEOUT_MS};
use crate::data_source::{CapabilitySet, DataKind, SourceAdapter, SourceError, SourceFuture};
use crate::http_client::{HttpClient, HttpRequest};
use crate::throttling::RateBudget;
use crate::{FinancialRecord, Listing, MarketRecord, SourceId, UtcDateTime};

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage adapter. Needs an API key and serves quotes only.
#[derive(Clone)]
pub struct AlphaVantageAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: Option<String>,
    base_url: String,
    timeout_ms: u64,
    budget: RateBudget,
}

impl AlphaVantageAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: String::from(DEFAULT_BASE_URL),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            budget: RateBudget::alphavantage_free_tier(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_budget(mut self, budget: RateBudget) -> Self {
        self.budget = budget;
        self
    }

    async fn fetch_market_record(&self, listing: &Listing) -> Result<MarketRecord, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SourceError::invalid_request("alpha_vantage api key is not configured"))?;

        if let Err(wait) = self.budget.acquire() {
            warn!(source = %SourceId::ALPHA_VANTAGE, wait_ms = wait.as_millis() as u64, "local rate budget spent");
            return Err(SourceError::rate_limited(format!(
                "alpha_vantage free-tier limit exceeded; retry in {:.2}s",
                wait.as_secs_f64()
            )));
        }

        let request = HttpRequest::get(&self.base_url)
            .with_query("function", "GLOBAL_QUOTE")
            .with_query("symbol", listing.provider_symbol())
            .with_query("apikey", api_key)
            .with_timeout_ms(self.timeout_ms);

        let response: AlphaVantageQuoteResponse =
            get_json(self.http_client.as_ref(), &SourceId::ALPHA_VANTAGE, request).await?;

        // Quota notices come back as HTTP 200.
        if let Some(note) = response.note.or(response.information) {
            return Err(SourceError::rate_limited(format!("alpha_vantage: {note}")));
        }
        if let Some(message) = response.error_message {
            return Err(SourceError::invalid_request(format!("alpha_vantage: {message}")));
        }

        let quote = response
            .quote
            .filter(|quote| quote.price.is_some())
            .ok_or_else(|| {
                SourceError::invalid_request(format!("alpha_vantage has no quote for {listing}"))
            })?;

        Ok(MarketRecord {
            price: parse_number(quote.price.as_deref()),
            volume: parse_number(quote.volume.as_deref())
                .filter(|volume| *volume >= 0.0)
                .map(|volume| volume as u64),
            pe_ratio: None,
            currency: None,
            timestamp: quote
                .latest_trading_day
                .and_then(|day| UtcDateTime::parse(&format!("{day}T00:00:00Z")).ok()),
        })
    }
}

impl SourceAdapter for AlphaVantageAdapter {
    fn id(&self) -> SourceId {
        SourceId::ALPHA_VANTAGE
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::market_only()
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn fetch_market<'a>(&'a self, listing: &'a Listing) -> SourceFuture<'a, MarketRecord> {
        Box::pin(self.fetch_market_record(listing))
    }

    fn fetch_financials<'a>(&'a self, _listing: &'a Listing) -> SourceFuture<'a, FinancialRecord> {
        Box::pin(async { Err(SourceError::unsupported(DataKind::Financials)) })
    }
}

impl std::fmt::Debug for AlphaVantageAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlphaVantageAdapter")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .field("timeout_ms", &self.timeout_ms)
            .field("budget", &self.budget)
            .finish()
    }
}

// Alpha Vantage API response structures

#[derive(Debug, Deserialize)]
struct AlphaVantageQuoteResponse {
    #[serde(rename = "Global Quote", default)]
    quote: Option<AlphaVantageQuote>,
    #[serde(rename = "Note", default)]
    note: Option<String>,
    #[serde(rename = "Information", default)]
    information: Option<String>,
    #[serde(rename = "Error Message", default)]
    error_message: Option<String>,
}

/// Alpha Vantage encodes every number as a string.
#[derive(Debug, Deserialize)]
struct AlphaVantageQuote {
    #[serde(rename = "05. price", default)]
    price: Option<String>,
    #[serde(rename = "06. volume", default)]
    volume: Option<String>,
    #[serde(rename = "07. latest trading day", default)]
    latest_trading_day: Option<String>,
}
