use std::sync::Arc;

use serde::Deserialize;

use crate::adapters::{get_json, DEFAULT_TIMEOUT_MS};
use crate::data_source::{CapabilitySet, SourceAdapter, SourceError, SourceFuture};
use crate::http_client::{HttpClient, HttpRequest};
use crate::{FinancialRecord, Listing, MarketRecord, SourceId, UtcDateTime};

const DEFAULT_BASE_URL: &str = "https://financialmodelingprep.com/api/v3";

/// Financial Modeling Prep adapter. Needs an API key.
#[derive(Clone)]
pub struct FmpAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: Option<String>,
    base_url: String,
    timeout_ms: u64,
    period: String,
}

impl FmpAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: String::from(DEFAULT_BASE_URL),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            period: String::from("annual"),
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

    /// Statement period, `annual` or `quarter`.
    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = period.into();
        self
    }

    fn request(&self, path: &str, listing: &Listing) -> Result<HttpRequest, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SourceError::invalid_request("fmp api key is not configured"))?;

        Ok(HttpRequest::get(format!(
            "{}/{}/{}",
            self.base_url,
            path,
            urlencoding::encode(&listing.provider_symbol())
        ))
        .with_query("apikey", api_key)
        .with_timeout_ms(self.timeout_ms))
    }

    async fn rows<T>(&self, request: HttpRequest) -> Result<Vec<T>, SourceError>
    where
        T: for<'de> Deserialize<'de>,
    {
        match get_json::<FmpPayload<T>>(self.http_client.as_ref(), &SourceId::FMP, request).await? {
            FmpPayload::Rows(rows) => Ok(rows),
            FmpPayload::Error { message } => Err(SourceError::invalid_request(format!(
                "fmp rejected the request: {message}"
            ))),
        }
    }

    async fn fetch_market_record(&self, listing: &Listing) -> Result<MarketRecord, SourceError> {
        let request = self.request("quote", listing)?;
        let quote = self
            .rows::<FmpQuote>(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::invalid_request(format!("fmp has no quote for {listing}")))?;

        Ok(MarketRecord {
            price: quote.price,
            volume: quote.volume.filter(|volume| *volume >= 0.0).map(|volume| volume as u64),
            pe_ratio: quote.pe,
            currency: None,
            timestamp: quote
                .timestamp
                .and_then(|seconds| UtcDateTime::from_unix_timestamp(seconds).ok()),
        })
    }

    async fn fetch_financial_record(
        &self,
        listing: &Listing,
    ) -> Result<FinancialRecord, SourceError> {
        let income = self
            .request("income-statement", listing)?
            .with_query("period", self.period.as_str())
            .with_query("limit", "1");
        let cash_flow = self
            .request("cash-flow-statement", listing)?
            .with_query("period", self.period.as_str())
            .with_query("limit", "1");
        let profile = self.request("profile", listing)?;

        let (income, cash_flow, profile) = tokio::try_join!(
            self.rows::<FmpIncomeStatement>(income),
            self.rows::<FmpCashFlowStatement>(cash_flow),
            self.rows::<FmpProfile>(profile),
        )?;

        let income = income.into_iter().next().ok_or_else(|| {
            SourceError::invalid_request(format!("fmp has no income statement for {listing}"))
        })?;
        let cash_flow = cash_flow.into_iter().next();
        let profile = profile.into_iter().next();

        let shares_outstanding = profile.and_then(|profile| match (profile.mkt_cap, profile.price) {
            (Some(market_cap), Some(price)) if price > 0.0 => Some(market_cap / price),
            _ => None,
        });

        Ok(FinancialRecord {
            revenue: income.revenue,
            net_income: income.net_income,
            eps: income.eps,
            free_cash_flow: cash_flow.and_then(|statement| statement.free_cash_flow),
            shares_outstanding,
            report_date: income.date,
            currency: income.reported_currency,
        })
    }
}

impl SourceAdapter for FmpAdapter {
    fn id(&self) -> SourceId {
        SourceId::FMP
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::full()
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn fetch_market<'a>(&'a self, listing: &'a Listing) -> SourceFuture<'a, MarketRecord> {
        Box::pin(self.fetch_market_record(listing))
    }

    fn fetch_financials<'a>(&'a self, listing: &'a Listing) -> SourceFuture<'a, FinancialRecord> {
        Box::pin(self.fetch_financial_record(listing))
    }
}

impl std::fmt::Debug for FmpAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FmpAdapter")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .field("timeout_ms", &self.timeout_ms)
            .field("period", &self.period)
            .finish()
    }
}

// FMP API response structures

/// FMP answers with a JSON array, or an object carrying `Error Message`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FmpPayload<T> {
    Rows(Vec<T>),
    Error {
        #[serde(rename = "Error Message")]
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct FmpQuote {
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    volume: Option<f64>,
    #[serde(default)]
    pe: Option<f64>,
    #[serde(default)]
    timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FmpIncomeStatement {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    reported_currency: Option<String>,
    #[serde(default)]
    revenue: Option<f64>,
    #[serde(default)]
    net_income: Option<f64>,
    #[serde(default)]
    eps: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FmpCashFlowStatement {
    #[serde(default)]
    free_cash_flow: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FmpProfile {
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    mkt_cap: Option<f64>,
}
