use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use tracing::{debug, info};

use crate::adapters::{AlphaVantageAdapter, FmpAdapter, YahooAdapter, DEFAULT_TIMEOUT_MS};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::{SourceAdapter, SourceId};

/// Explicit map from source identifier to adapter.
///
/// Populated by [`AdapterRegistry::register`] calls or by
/// [`AdapterRegistryBuilder`]; there is no implicit discovery.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<SourceId, Arc<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `adapter` under its own id, replacing any previous adapter.
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) -> &mut Self {
        let id = adapter.id();
        debug!(source = %id, "registering source adapter");
        self.adapters.insert(id, adapter);
        self
    }

    pub fn with(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, id: &SourceId) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.get(id).cloned()
    }

    pub fn contains(&self, id: &SourceId) -> bool {
        self.adapters.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<SourceId> {
        let mut ids = self.adapters.keys().cloned().collect::<Vec<_>>();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("sources", &self.ids())
            .finish()
    }
}

/// Builds the concrete provider adapters.
///
/// # Environment Variables
///
/// | Provider | Primary Env Var | Fallback Env Var |
/// |----------|----------------|------------------|
/// | FMP | `FAIRVAL_FMP_API_KEY` | `FMP_API_KEY` |
/// | Alpha Vantage | `FAIRVAL_ALPHAVANTAGE_API_KEY` | `ALPHAVANTAGE_API_KEY` |
/// | Yahoo | (no key required) | - |
///
/// Adapters without a key are still registered; they report themselves
/// unavailable and the coordinator skips them.
///
/// # Example
///
/// ```rust,ignore
/// use fairval_core::AdapterRegistryBuilder;
///
/// let registry = AdapterRegistryBuilder::from_env()
///     .with_timeout_ms(10_000)
///     .build();
/// ```
pub struct AdapterRegistryBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    fmp_api_key: Option<String>,
    alphavantage_api_key: Option<String>,
    timeout_ms: u64,
}

impl Default for AdapterRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AdapterRegistryBuilder {
    /// Builder without credentials.
    pub fn new() -> Self {
        Self {
            http_client: None,
            fmp_api_key: None,
            alphavantage_api_key: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Reads API keys from the environment.
    pub fn from_env() -> Self {
        Self {
            fmp_api_key: env::var("FAIRVAL_FMP_API_KEY")
                .or_else(|_| env::var("FMP_API_KEY"))
                .ok(),
            alphavantage_api_key: env::var("FAIRVAL_ALPHAVANTAGE_API_KEY")
                .or_else(|_| env::var("ALPHAVANTAGE_API_KEY"))
                .ok(),
            ..Self::new()
        }
    }

    pub fn with_fmp_key(mut self, key: impl Into<String>) -> Self {
        self.fmp_api_key = Some(key.into());
        self
    }

    pub fn with_alphavantage_key(mut self, key: impl Into<String>) -> Self {
        self.alphavantage_api_key = Some(key.into());
        self
    }

    /// Transport shared by all adapters; defaults to [`ReqwestHttpClient`].
    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn build(self) -> AdapterRegistry {
        let http_client = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));

        let registry = AdapterRegistry::new()
            .with(Arc::new(
                FmpAdapter::new(Arc::clone(&http_client), self.fmp_api_key)
                    .with_timeout_ms(self.timeout_ms),
            ))
            .with(Arc::new(
                YahooAdapter::new(Arc::clone(&http_client)).with_timeout_ms(self.timeout_ms),
            ))
            .with(Arc::new(
                AlphaVantageAdapter::new(http_client, self.alphavantage_api_key)
                    .with_timeout_ms(self.timeout_ms),
            ));

        let available = registry
            .ids()
            .into_iter()
            .filter(|id| registry.get(id).is_some_and(|adapter| adapter.is_available()))
            .map(|id| id.to_string())
            .collect::<Vec<_>>();
        info!(available = ?available, "source adapters ready");

        registry
    }
}
