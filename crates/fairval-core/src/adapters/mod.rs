//! Concrete provider adapters.
//!
//! | Adapter | Key | Market | Financials |
//! |---------|-----|--------|------------|
//! | [`FmpAdapter`] | required | yes | yes |
//! | [`YahooAdapter`] | none | yes | yes |
//! | [`AlphaVantageAdapter`] | required | yes | no |

mod alphavantage;
mod fmp;
mod yahoo;

pub use alphavantage::AlphaVantageAdapter;
pub use fmp::FmpAdapter;
pub use yahoo::YahooAdapter;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::http_client::{HttpClient, HttpRequest};
use crate::{SourceError, SourceId};

/// Default per-request timeout for provider calls.
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Executes one GET and decodes the JSON body.
///
/// Transport failures are retryable outages; bodies that do not decode into
/// `T` are malformed responses.
pub(crate) async fn get_json<T>(
    http_client: &dyn HttpClient,
    source: &SourceId,
    request: HttpRequest,
) -> Result<T, SourceError>
where
    T: DeserializeOwned,
{
    debug!(source = %source, url = %request.redacted_url(), "requesting");

    let response = http_client.execute(request).await.map_err(|e| {
        SourceError::unavailable(format!("{source} transport error: {}", e.message()))
    })?;
    response.ensure_success(source.as_str())?;

    serde_json::from_str(&response.body).map_err(|e| {
        SourceError::malformed_response(format!("failed to parse {source} response: {e}"))
    })
}

/// Parses a numeric field that some providers encode as a JSON string.
pub(crate) fn parse_number(value: Option<&str>) -> Option<f64> {
    value
        .map(str::trim)
        .filter(|raw| !raw.is_empty() && *raw != "None" && *raw != "-")
        .and_then(|raw| raw.parse::<f64>().ok())
        .filter(|number| number.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_ignores_placeholders() {
        assert_eq!(parse_number(Some("189.84")), Some(189.84));
        assert_eq!(parse_number(Some(" 42 ")), Some(42.0));
        assert_eq!(parse_number(Some("None")), None);
        assert_eq!(parse_number(Some("")), None);
        assert_eq!(parse_number(Some("NaN")), None);
        assert_eq!(parse_number(None), None);
    }
}
