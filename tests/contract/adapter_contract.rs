use std::sync::{Arc, Mutex};

use fairval_core::{
    AlphaVantageAdapter, CapabilitySet, DataKind, FmpAdapter, HttpClient, HttpError, HttpFuture,
    HttpRequest, HttpResponse, Listing, Market, SourceAdapter, SourceErrorKind, Symbol,
    YahooAdapter,
};

/// Answers each request with the first scripted response whose pattern
/// occurs in the request URL, and records every request.
#[derive(Default)]
struct ScriptedHttpClient {
    routes: Vec<(String, Result<HttpResponse, HttpError>)>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    fn route(mut self, pattern: &str, response: HttpResponse) -> Self {
        self.routes.push((pattern.to_owned(), Ok(response)));
        self
    }

    fn fail(mut self, pattern: &str, error: &str) -> Self {
        self.routes.push((pattern.to_owned(), Err(HttpError::new(error))));
        self
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("request log").clone()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        let url = request.full_url();
        self.requests.lock().expect("request log").push(request);
        let response = self
            .routes
            .iter()
            .find(|(pattern, _)| url.contains(pattern.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| Ok(HttpResponse::with_status(404, "not scripted")));
        Box::pin(async move { response })
    }
}

fn aapl() -> Listing {
    Listing::us(Symbol::parse("AAPL").expect("valid symbol"))
}

fn toyota() -> Listing {
    Listing::new(Symbol::parse("7203").expect("valid symbol"), Market::Jp)
}

#[tokio::test]
async fn fmp_market_record_comes_from_quote_endpoint() {
    let client = Arc::new(ScriptedHttpClient::default().route(
        "/quote/AAPL",
        HttpResponse::ok_json(
            r#"[{"symbol":"AAPL","price":189.84,"volume":52000000,"pe":29.4,"timestamp":1704412800}]"#,
        ),
    ));
    let adapter = FmpAdapter::new(client.clone(), Some(String::from("secret-key")))
        .with_base_url("https://fmp.test/api/v3");

    let record = adapter.fetch_market(&aapl()).await.expect("quote parses");

    assert_eq!(record.price, Some(189.84));
    assert_eq!(record.volume, Some(52_000_000));
    assert_eq!(record.pe_ratio, Some(29.4));
    assert_eq!(
        record.timestamp.map(|ts| ts.format_rfc3339()),
        Some(String::from("2024-01-05T00:00:00Z"))
    );

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].full_url().contains("apikey=secret-key"));
    assert!(!requests[0].redacted_url().contains("secret-key"));
}

#[tokio::test]
async fn fmp_financial_record_joins_three_statements() {
    let client = Arc::new(
        ScriptedHttpClient::default()
            .route(
                "/income-statement/AAPL",
                HttpResponse::ok_json(
                    r#"[{"date":"2023-09-30","reportedCurrency":"USD","revenue":383285000000,"netIncome":96995000000,"eps":6.16}]"#,
                ),
            )
            .route(
                "/cash-flow-statement/AAPL",
                HttpResponse::ok_json(r#"[{"freeCashFlow":99584000000}]"#),
            )
            .route(
                "/profile/AAPL",
                HttpResponse::ok_json(r#"[{"price":200.0,"mktCap":3000000000000}]"#),
            ),
    );
    let adapter = FmpAdapter::new(client.clone(), Some(String::from("k")))
        .with_base_url("https://fmp.test/api/v3");

    let record = adapter
        .fetch_financials(&aapl())
        .await
        .expect("statements parse");

    assert_eq!(record.revenue, Some(383_285_000_000.0));
    assert_eq!(record.net_income, Some(96_995_000_000.0));
    assert_eq!(record.eps, Some(6.16));
    assert_eq!(record.free_cash_flow, Some(99_584_000_000.0));
    assert_eq!(record.shares_outstanding, Some(15_000_000_000.0));
    assert_eq!(record.report_date.as_deref(), Some("2023-09-30"));
    assert_eq!(record.currency.as_deref(), Some("USD"));
    assert_eq!(client.requests().len(), 3);
}

#[tokio::test]
async fn fmp_error_message_is_not_retryable() {
    let client = Arc::new(ScriptedHttpClient::default().route(
        "/quote/AAPL",
        HttpResponse::ok_json(r#"{"Error Message":"Invalid API KEY."}"#),
    ));
    let adapter =
        FmpAdapter::new(client, Some(String::from("bad"))).with_base_url("https://fmp.test");

    let error = adapter.fetch_market(&aapl()).await.expect_err("rejected");
    assert_eq!(error.kind(), SourceErrorKind::InvalidRequest);
    assert!(!error.retryable());
}

#[tokio::test]
async fn fmp_without_key_is_unavailable() {
    let adapter = FmpAdapter::new(Arc::new(ScriptedHttpClient::default()), None);
    assert!(!adapter.is_available());
    assert_eq!(adapter.capabilities(), CapabilitySet::full());
}

#[tokio::test]
async fn yahoo_market_record_uses_tokyo_suffix() {
    let client = Arc::new(ScriptedHttpClient::default().route(
        "/v7/finance/quote",
        HttpResponse::ok_json(
            r#"{"quoteResponse":{"result":[{"symbol":"7203.T","regularMarketPrice":2750.5,"regularMarketVolume":1200000,"trailingPE":9.8,"currency":"JPY","regularMarketTime":1704412800}],"error":null}}"#,
        ),
    ));
    let adapter = YahooAdapter::new(client.clone()).with_base_url("https://yahoo.test");

    let record = adapter.fetch_market(&toyota()).await.expect("quote parses");

    assert_eq!(record.price, Some(2750.5));
    assert_eq!(record.volume, Some(1_200_000));
    assert_eq!(record.pe_ratio, Some(9.8));
    assert_eq!(record.currency.as_deref(), Some("JPY"));
    assert!(client.requests()[0].full_url().ends_with("symbols=7203.T"));
}

#[tokio::test]
async fn yahoo_financial_record_reads_raw_values() {
    let client = Arc::new(ScriptedHttpClient::default().route(
        "/v10/finance/quoteSummary/AAPL",
        HttpResponse::ok_json(
            r#"{"quoteSummary":{"result":[{
                "financialData":{"totalRevenue":{"raw":383285000000,"fmt":"383.29B"},"freeCashflow":{"raw":99584000000},"financialCurrency":"USD"},
                "defaultKeyStatistics":{"netIncomeToCommon":{"raw":96995000000},"trailingEps":{"raw":6.16},"sharesOutstanding":{"raw":15550000000},"lastFiscalYearEnd":{"raw":1696032000,"fmt":"2023-09-30"}}
            }],"error":null}}"#,
        ),
    ));
    let adapter = YahooAdapter::new(client).with_base_url("https://yahoo.test");

    let record = adapter
        .fetch_financials(&aapl())
        .await
        .expect("summary parses");

    assert_eq!(record.revenue, Some(383_285_000_000.0));
    assert_eq!(record.net_income, Some(96_995_000_000.0));
    assert_eq!(record.eps, Some(6.16));
    assert_eq!(record.free_cash_flow, Some(99_584_000_000.0));
    assert_eq!(record.shares_outstanding, Some(15_550_000_000.0));
    assert_eq!(record.report_date.as_deref(), Some("2023-09-30"));
}

#[tokio::test]
async fn yahoo_empty_result_is_not_found() {
    let client = Arc::new(ScriptedHttpClient::default().route(
        "/v7/finance/quote",
        HttpResponse::ok_json(r#"{"quoteResponse":{"result":[],"error":null}}"#),
    ));
    let adapter = YahooAdapter::new(client).with_base_url("https://yahoo.test");

    let error = adapter.fetch_market(&aapl()).await.expect_err("no quote");
    assert_eq!(error.kind(), SourceErrorKind::InvalidRequest);
    assert!(adapter.is_available());
}

#[tokio::test]
async fn alphavantage_parses_string_encoded_quote() {
    let client = Arc::new(ScriptedHttpClient::default().route(
        "function=GLOBAL_QUOTE",
        HttpResponse::ok_json(
            r#"{"Global Quote":{"01. symbol":"AAPL","05. price":"189.8400","06. volume":"52000000","07. latest trading day":"2024-01-05"}}"#,
        ),
    ));
    let adapter = AlphaVantageAdapter::new(client, Some(String::from("k")))
        .with_base_url("https://av.test/query");

    let record = adapter.fetch_market(&aapl()).await.expect("quote parses");

    assert_eq!(record.price, Some(189.84));
    assert_eq!(record.volume, Some(52_000_000));
    assert_eq!(record.pe_ratio, None);
    assert_eq!(
        record.timestamp.map(|ts| ts.format_rfc3339()),
        Some(String::from("2024-01-05T00:00:00Z"))
    );
}

#[tokio::test]
async fn alphavantage_quota_note_is_rate_limited() {
    let client = Arc::new(ScriptedHttpClient::default().route(
        "function=GLOBAL_QUOTE",
        HttpResponse::ok_json(
            r#"{"Note":"Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#,
        ),
    ));
    let adapter = AlphaVantageAdapter::new(client, Some(String::from("k")))
        .with_base_url("https://av.test/query");

    let error = adapter.fetch_market(&aapl()).await.expect_err("throttled");
    assert_eq!(error.kind(), SourceErrorKind::RateLimited);
    assert!(error.retryable());
}

#[tokio::test]
async fn alphavantage_serves_quotes_only() {
    let adapter = AlphaVantageAdapter::new(
        Arc::new(ScriptedHttpClient::default()),
        Some(String::from("k")),
    );

    assert!(!adapter.capabilities().supports(DataKind::Financials));
    let error = adapter
        .fetch_financials(&aapl())
        .await
        .expect_err("unsupported");
    assert_eq!(error.kind(), SourceErrorKind::Unsupported);
}

#[tokio::test]
async fn transport_and_status_failures_are_classified() {
    let client = Arc::new(
        ScriptedHttpClient::default()
            .route("/quote/AAPL", HttpResponse::with_status(429, "slow down"))
            .route("/quote/MSFT", HttpResponse::with_status(503, "maintenance"))
            .route("/quote/IBM", HttpResponse::with_status(403, "forbidden"))
            .route("/quote/ORCL", HttpResponse::ok_json("<html>not json</html>"))
            .fail("/quote/NVDA", "connection reset"),
    );
    let adapter =
        FmpAdapter::new(client, Some(String::from("k"))).with_base_url("https://fmp.test");

    let kind_for = |symbol: &str| {
        let listing = Listing::us(Symbol::parse(symbol).expect("valid symbol"));
        let adapter = adapter.clone();
        async move {
            adapter
                .fetch_market(&listing)
                .await
                .expect_err("scripted failure")
                .kind()
        }
    };

    assert_eq!(kind_for("AAPL").await, SourceErrorKind::RateLimited);
    assert_eq!(kind_for("MSFT").await, SourceErrorKind::Unavailable);
    assert_eq!(kind_for("IBM").await, SourceErrorKind::InvalidRequest);
    assert_eq!(kind_for("ORCL").await, SourceErrorKind::MalformedResponse);
    assert_eq!(kind_for("NVDA").await, SourceErrorKind::Unavailable);
}
