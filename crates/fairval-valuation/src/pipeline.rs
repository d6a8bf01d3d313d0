use std::time::Duration;

use fairval_core::{AdapterRegistry, FailoverCoordinator, Listing};
use tracing::{info, warn};

use crate::{MonteCarloEngine, PipelineConfig, ValuationError, ValuationInputs, ValuationReport};

/// Fetch, validate, simulate and report for one listing per call.
///
/// Market data and financials are fetched concurrently. The whole call is
/// bounded by `overall_timeout`; dropping the future cancels pending retries.
#[derive(Debug)]
pub struct ValuationPipeline {
    coordinator: FailoverCoordinator,
    engine: MonteCarloEngine,
    overall_timeout: Duration,
}

impl ValuationPipeline {
    pub fn new(
        coordinator: FailoverCoordinator,
        engine: MonteCarloEngine,
        overall_timeout: Duration,
    ) -> Self {
        Self {
            coordinator,
            engine,
            overall_timeout,
        }
    }

    pub fn from_config(
        registry: AdapterRegistry,
        config: &PipelineConfig,
    ) -> Result<Self, ValuationError> {
        config.validate()?;
        let coordinator = FailoverCoordinator::new(registry, &config.sources)?;
        let engine = MonteCarloEngine::new(config.model.clone())?;
        Ok(Self::new(coordinator, engine, config.overall_timeout()))
    }

    pub fn coordinator(&self) -> &FailoverCoordinator {
        &self.coordinator
    }

    pub fn engine(&self) -> &MonteCarloEngine {
        &self.engine
    }

    /// Parses `raw_symbol` for `market` (e.g. `"7203"`, `"JP"`) and values it.
    pub async fn analyze(
        &self,
        raw_symbol: &str,
        market: &str,
    ) -> Result<ValuationReport, ValuationError> {
        let listing = Listing::parse(raw_symbol, market)?;
        self.analyze_listing(&listing).await
    }

    pub async fn analyze_listing(&self, listing: &Listing) -> Result<ValuationReport, ValuationError> {
        match tokio::time::timeout(self.overall_timeout, self.run(listing)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    symbol = %listing,
                    timeout_ms = self.overall_timeout.as_millis() as u64,
                    "valuation timed out"
                );
                Err(ValuationError::Timeout {
                    after: self.overall_timeout,
                })
            }
        }
    }

    async fn run(&self, listing: &Listing) -> Result<ValuationReport, ValuationError> {
        let (market, financials) = tokio::try_join!(
            async {
                self.coordinator
                    .get_market_data(listing)
                    .await
                    .map_err(ValuationError::from)
            },
            async {
                self.coordinator
                    .get_financials(listing)
                    .await
                    .map_err(ValuationError::from)
            },
        )?;

        let inputs = ValuationInputs::new(market, financials)?;
        let result = self.engine.evaluate(&inputs)?;
        let report = ValuationReport::new(listing, &inputs, &result);

        info!(
            symbol = %listing,
            price = report.current_price,
            low = report.low,
            medium = report.medium,
            high = report.high,
            "valuation complete"
        );

        Ok(report)
    }
}
