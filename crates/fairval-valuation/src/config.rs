use std::time::Duration;

use fairval_core::{ConfigError, SourcesConfig};
use serde::{Deserialize, Serialize};

/// Monte Carlo and DCF model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Number of draws per valuation.
    pub monte_carlo_sims: usize,
    pub risk_free_rate: f64,
    /// Length of the high-growth DCF phase in years.
    pub dcf_growth_years: u32,
    /// Number of parallel draw shards. 1 runs on the calling thread.
    pub worker_shards: usize,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            monte_carlo_sims: 10_000,
            risk_free_rate: 0.02,
            dcf_growth_years: 5,
            worker_shards: 1,
            seed: None,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monte_carlo_sims == 0 {
            return Err(ConfigError::NotPositive {
                field: "monte_carlo_sims",
            });
        }
        if self.dcf_growth_years == 0 {
            return Err(ConfigError::NotPositive {
                field: "dcf_growth_years",
            });
        }
        if self.worker_shards == 0 {
            return Err(ConfigError::NotPositive {
                field: "worker_shards",
            });
        }
        unit_interval("risk_free_rate", self.risk_free_rate)?;
        Ok(())
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfRange {
            field,
            min: 0.0,
            max: 1.0,
            value,
        });
    }
    Ok(())
}

/// Settings for a whole fetch-and-simulate request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sources: SourcesConfig,
    pub model: ModelConfig,
    /// Upper bound on one `analyze` call, acquisition included.
    pub overall_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sources: SourcesConfig::default(),
            model: ModelConfig::default(),
            overall_timeout_secs: 60,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sources.validate()?;
        self.model.validate()?;
        if self.overall_timeout_secs == 0 {
            return Err(ConfigError::NotPositive {
                field: "overall_timeout_secs",
            });
        }
        Ok(())
    }

    pub fn overall_timeout(&self) -> Duration {
        Duration::from_secs(self.overall_timeout_secs)
    }
}
