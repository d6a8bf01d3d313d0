use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::SourceError;

/// Query parameters that must never appear in logs.
const SECRET_PARAMS: [&str; 2] = ["apikey", "token"];

/// GET request envelope used by adapter transport calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            timeout_ms: 15_000,
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Full URL with percent-encoded query string.
    pub fn full_url(&self) -> String {
        self.render(false)
    }

    /// Full URL with credential parameters masked, safe for logs and errors.
    pub fn redacted_url(&self) -> String {
        self.render(true)
    }

    fn render(&self, redact: bool) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }

        let query = self
            .query
            .iter()
            .map(|(name, value)| {
                let value = if redact && SECRET_PARAMS.contains(&name.to_ascii_lowercase().as_str())
                {
                    String::from("***")
                } else {
                    urlencoding::encode(value).into_owned()
                };
                format!("{}={}", urlencoding::encode(name), value)
            })
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.url, query)
    }
}

/// HTTP response envelope returned by an adapter transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Maps a non-2xx status onto the source error taxonomy.
    ///
    /// 429 is rate limiting, 408 and 5xx are transient outages, and every
    /// other client error (bad key, unknown symbol) is not worth retrying.
    pub fn ensure_success(&self, source: &str) -> Result<(), SourceError> {
        match self.status {
            200..=299 => Ok(()),
            429 => Err(SourceError::rate_limited(format!(
                "{source} returned status 429"
            ))),
            408 | 500..=599 => Err(SourceError::unavailable(format!(
                "{source} returned status {}",
                self.status
            ))),
            status => Err(SourceError::invalid_request(format!(
                "{source} returned status {status}"
            ))),
        }
    }
}

/// Transport-level HTTP error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    message: String,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

pub type HttpFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

/// Adapter transport contract.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a>;
}

/// Production HTTP client backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: Arc::new(
                reqwest::Client::builder()
                    .user_agent(concat!("fairval/", env!("CARGO_PKG_VERSION")))
                    .build()
                    .unwrap_or_else(|_| reqwest::Client::new()),
            ),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            let response = self
                .client
                .get(&request.url)
                .query(&request.query)
                .timeout(Duration::from_millis(request.timeout_ms))
                .send()
                .await
                .map_err(|e| {
                    // reqwest errors embed the URL, which carries the API key.
                    let e = e.without_url();
                    if e.is_timeout() {
                        HttpError::new(format!("request timeout: {e}"))
                    } else if e.is_connect() {
                        HttpError::new(format!("connection failed: {e}"))
                    } else {
                        HttpError::new(format!("request failed: {e}"))
                    }
                })?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| HttpError::new(format!("failed to read response body: {}", e.without_url())))?;

            Ok(HttpResponse { status, body })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceErrorKind;

    #[test]
    fn redacted_url_masks_api_key() {
        let request = HttpRequest::get("https://example.test/api/v3/quote/AAPL")
            .with_query("apikey", "secret-123");

        assert_eq!(
            request.full_url(),
            "https://example.test/api/v3/quote/AAPL?apikey=secret-123"
        );
        assert_eq!(
            request.redacted_url(),
            "https://example.test/api/v3/quote/AAPL?apikey=***"
        );
    }

    #[test]
    fn query_values_are_percent_encoded() {
        let request = HttpRequest::get("https://example.test/q").with_query("symbols", "TYO:7203");
        assert_eq!(request.full_url(), "https://example.test/q?symbols=TYO%3A7203");
    }

    #[test]
    fn status_classification() {
        let kind = |status| {
            HttpResponse::with_status(status, "")
                .ensure_success("fmp")
                .map_err(|error| error.kind())
        };

        assert_eq!(kind(200), Ok(()));
        assert_eq!(kind(429), Err(SourceErrorKind::RateLimited));
        assert_eq!(kind(503), Err(SourceErrorKind::Unavailable));
        assert_eq!(kind(408), Err(SourceErrorKind::Unavailable));
        assert_eq!(kind(401), Err(SourceErrorKind::InvalidRequest));
        assert_eq!(kind(404), Err(SourceErrorKind::InvalidRequest));
    }
}
