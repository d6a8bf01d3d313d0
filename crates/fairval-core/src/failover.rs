//! Priority-ordered acquisition across redundant sources.

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheKey, CacheStore, CachedRecord};
use crate::data_source::{DataKind, SourceAdapter, SourceFuture};
use crate::health::HealthTracker;
use crate::registry::AdapterRegistry;
use crate::retry::{FetchError, RetryPolicy};
use crate::{
    ConfigError, FinancialData, FinancialRecord, Listing, MarketData, MarketRecord, SourceError,
    SourceId, SourcesConfig, ValidationError,
};

/// Why a source was passed over without being called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotRegistered,
    Unsupported,
    Unavailable,
    Unhealthy,
}

impl SkipReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotRegistered => "no adapter registered",
            Self::Unsupported => "data kind not supported",
            Self::Unavailable => "source unavailable",
            Self::Unhealthy => "source unhealthy",
        }
    }
}

/// Outcome of one source in a failed acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Skipped(SkipReason),
    Failed(FetchError),
}

/// One entry of the per-source error list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAttempt {
    pub source: SourceId,
    pub outcome: AttemptOutcome,
}

impl Display for SourceAttempt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            AttemptOutcome::Skipped(reason) => {
                write!(f, "{}: skipped, {}", self.source, reason.as_str())
            }
            AttemptOutcome::Failed(FetchError::Source { error, .. }) => {
                write!(f, "{}: {}", self.source, error)
            }
            AttemptOutcome::Failed(FetchError::RetryExhausted { attempts, last, .. }) => write!(
                f,
                "{}: retry exhausted after {} attempt(s), last error: {}",
                self.source, attempts, last
            ),
        }
    }
}

/// Terminal failure of one acquisition call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AcquisitionError {
    #[error("no data sources configured")]
    NoSourcesConfigured,
    /// The source answered, but the record breaks the data contract.
    #[error("{source_id} returned invalid {kind} data for {listing}: {error}")]
    Validation {
        source_id: SourceId,
        kind: DataKind,
        listing: Listing,
        error: ValidationError,
    },
    #[error(
        "all sources failed to provide {kind} data for {listing}: {}",
        render_attempts(.attempts)
    )]
    AllSourcesExhausted {
        kind: DataKind,
        listing: Listing,
        attempts: Vec<SourceAttempt>,
    },
}

fn render_attempts(attempts: &[SourceAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Record kinds the coordinator can acquire.
trait Acquired: Sized + Clone {
    type Record: Send;

    const KIND: DataKind;

    fn fetch<'a>(adapter: &'a dyn SourceAdapter, listing: &'a Listing)
        -> SourceFuture<'a, Self::Record>;

    fn normalize(
        source: &SourceId,
        listing: &Listing,
        record: Self::Record,
    ) -> Result<Self, ValidationError>;

    fn into_cached(self) -> CachedRecord;

    fn from_cached(record: CachedRecord) -> Option<Self>;
}

impl Acquired for MarketData {
    type Record = MarketRecord;

    const KIND: DataKind = DataKind::Market;

    fn fetch<'a>(
        adapter: &'a dyn SourceAdapter,
        listing: &'a Listing,
    ) -> SourceFuture<'a, MarketRecord> {
        adapter.fetch_market(listing)
    }

    fn normalize(
        source: &SourceId,
        listing: &Listing,
        record: MarketRecord,
    ) -> Result<Self, ValidationError> {
        Self::from_record(source, listing, record)
    }

    fn into_cached(self) -> CachedRecord {
        CachedRecord::Market(self)
    }

    fn from_cached(record: CachedRecord) -> Option<Self> {
        match record {
            CachedRecord::Market(data) => Some(data),
            CachedRecord::Financials(_) => None,
        }
    }
}

impl Acquired for FinancialData {
    type Record = FinancialRecord;

    const KIND: DataKind = DataKind::Financials;

    fn fetch<'a>(
        adapter: &'a dyn SourceAdapter,
        listing: &'a Listing,
    ) -> SourceFuture<'a, FinancialRecord> {
        adapter.fetch_financials(listing)
    }

    fn normalize(
        source: &SourceId,
        listing: &Listing,
        record: FinancialRecord,
    ) -> Result<Self, ValidationError> {
        Self::from_record(source, listing, record)
    }

    fn into_cached(self) -> CachedRecord {
        CachedRecord::Financials(self)
    }

    fn from_cached(record: CachedRecord) -> Option<Self> {
        match record {
            CachedRecord::Financials(data) => Some(data),
            CachedRecord::Market(_) => None,
        }
    }
}

/// Walks the configured sources in priority order until one yields valid data.
///
/// The coordinator owns the cache and, unless one is injected with
/// [`FailoverCoordinator::with_health_tracker`], its own health table. Both
/// are shared by every request issued through the same coordinator.
///
/// For each source in order:
///
/// 1. skip it if it is not registered, does not serve the data kind, reports
///    itself unavailable, or is unhealthy;
/// 2. return a fresh cache entry for `(kind, listing, source)` if present;
/// 3. otherwise fetch through the [`RetryPolicy`], validate and cache the
///    record.
///
/// Every attempt is bounded by the configured per-source timeout and its
/// outcome is recorded in the [`HealthTracker`], so retries count towards
/// the success rate. A timed-out attempt is retryable.
///
/// A fetch failure moves on to the next source. A record that fails
/// validation ends the call with [`AcquisitionError::Validation`].
pub struct FailoverCoordinator {
    registry: AdapterRegistry,
    priority: Vec<SourceId>,
    health: Arc<HealthTracker>,
    cache: CacheStore<CacheKey, CachedRecord>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl FailoverCoordinator {
    pub fn new(registry: AdapterRegistry, config: &SourcesConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let cache = if config.cache_ttl() == Duration::ZERO {
            CacheStore::disabled()
        } else {
            CacheStore::new(config.cache_ttl())
        };

        Ok(Self {
            registry,
            priority: config.priority.clone(),
            health: Arc::new(HealthTracker::new()),
            cache,
            retry: config.retry_policy(),
            timeout: config.timeout(),
        })
    }

    /// Shares an existing health table, e.g. across coordinators.
    pub fn with_health_tracker(mut self, health: Arc<HealthTracker>) -> Self {
        self.health = health;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn priority(&self) -> &[SourceId] {
        &self.priority
    }

    pub fn health(&self) -> &HealthTracker {
        &self.health
    }

    pub fn cache(&self) -> &CacheStore<CacheKey, CachedRecord> {
        &self.cache
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub async fn get_market_data(&self, listing: &Listing) -> Result<MarketData, AcquisitionError> {
        self.acquire::<MarketData>(listing).await
    }

    pub async fn get_financials(
        &self,
        listing: &Listing,
    ) -> Result<FinancialData, AcquisitionError> {
        self.acquire::<FinancialData>(listing).await
    }

    async fn acquire<T: Acquired>(&self, listing: &Listing) -> Result<T, AcquisitionError> {
        if self.priority.is_empty() {
            return Err(AcquisitionError::NoSourcesConfigured);
        }

        let kind = T::KIND;
        let started = Instant::now();
        let mut attempts = Vec::with_capacity(self.priority.len());

        for source in &self.priority {
            let adapter = match self.check_source(source, kind) {
                Ok(adapter) => adapter,
                Err(reason) => {
                    attempts.push(SourceAttempt {
                        source: source.clone(),
                        outcome: AttemptOutcome::Skipped(reason),
                    });
                    continue;
                }
            };

            let key = CacheKey::new(kind, listing, source);
            if let Some(data) = self.cache.get(&key).await.and_then(T::from_cached) {
                debug!(source = %source, key = %key, "cache hit");
                return Ok(data);
            }

            let adapter: &dyn SourceAdapter = adapter.as_ref();
            let fetched = self
                .retry
                .run(source, || self.attempt::<T>(source, adapter, listing))
                .await;

            match fetched {
                Ok(record) => {
                    let data = match T::normalize(source, listing, record) {
                        Ok(data) => data,
                        Err(error) => {
                            self.health.record(source, false);
                            error!(
                                source = %source,
                                kind = %kind,
                                symbol = %listing,
                                error = %error,
                                "source returned invalid record"
                            );
                            return Err(AcquisitionError::Validation {
                                source_id: source.clone(),
                                kind,
                                listing: listing.clone(),
                                error,
                            });
                        }
                    };

                    self.cache.put(key, data.clone().into_cached(), None).await;
                    info!(
                        source = %source,
                        kind = %kind,
                        symbol = %listing,
                        latency_ms = started.elapsed().as_millis() as u64,
                        "acquired data"
                    );
                    return Ok(data);
                }
                Err(error) => {
                    warn!(
                        source = %source,
                        kind = %kind,
                        symbol = %listing,
                        error = %error,
                        "source failed, trying next"
                    );
                    attempts.push(SourceAttempt {
                        source: source.clone(),
                        outcome: AttemptOutcome::Failed(error),
                    });
                }
            }
        }

        let error = AcquisitionError::AllSourcesExhausted {
            kind,
            listing: listing.clone(),
            attempts,
        };
        error!(kind = %kind, symbol = %listing, error = %error, "all sources exhausted");
        Err(error)
    }

    /// One timed fetch; its outcome feeds the health table.
    async fn attempt<T: Acquired>(
        &self,
        source: &SourceId,
        adapter: &dyn SourceAdapter,
        listing: &Listing,
    ) -> Result<T::Record, SourceError> {
        let outcome = match tokio::time::timeout(self.timeout, T::fetch(adapter, listing)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    source = %source,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "fetch timed out"
                );
                Err(SourceError::unavailable(format!(
                    "no response within {} ms",
                    self.timeout.as_millis()
                )))
            }
        };

        self.health.record(source, outcome.is_ok());
        outcome
    }

    fn check_source(
        &self,
        source: &SourceId,
        kind: DataKind,
    ) -> Result<Arc<dyn SourceAdapter>, SkipReason> {
        let Some(adapter) = self.registry.get(source) else {
            debug!(source = %source, "skipping source without adapter");
            return Err(SkipReason::NotRegistered);
        };

        if !adapter.capabilities().supports(kind) {
            debug!(source = %source, kind = %kind, "skipping source without capability");
            return Err(SkipReason::Unsupported);
        }

        if !adapter.is_available() {
            debug!(source = %source, "skipping unavailable source");
            return Err(SkipReason::Unavailable);
        }

        if !self.health.is_healthy(source) {
            warn!(source = %source, "skipping unhealthy source");
            return Err(SkipReason::Unhealthy);
        }

        Ok(adapter)
    }
}

impl std::fmt::Debug for FailoverCoordinator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailoverCoordinator")
            .field("priority", &self.priority)
            .field("registry", &self.registry)
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish()
    }
}
