use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, RetryPolicy, SourceId, DEFAULT_CACHE_TTL};

/// Data acquisition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Sources tried in order, most trusted first.
    pub priority: Vec<SourceId>,
    /// Upper bound on a single fetch attempt against one source.
    pub timeout_ms: u64,
    pub cache_ttl_secs: u64,
    pub max_retries: u32,
    /// First backoff wait; each later wait doubles.
    pub backoff_factor_ms: u64,
    /// Randomizes each backoff wait by +/- 50%.
    pub backoff_jitter: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            priority: SourceId::default_priority(),
            timeout_ms: 15_000,
            cache_ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
            max_retries: 3,
            backoff_factor_ms: 500,
            backoff_jitter: false,
        }
    }
}

impl SourcesConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.priority.is_empty() {
            return Err(ConfigError::EmptyPriority);
        }

        let mut seen = HashSet::with_capacity(self.priority.len());
        for source in &self.priority {
            if !seen.insert(source) {
                return Err(ConfigError::DuplicateSource {
                    source_id: source.to_string(),
                });
            }
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::NotPositive { field: "timeout_ms" });
        }
        if self.backoff_factor_ms == 0 {
            return Err(ConfigError::NotPositive {
                field: "backoff_factor_ms",
            });
        }

        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(
            self.max_retries,
            Duration::from_millis(self.backoff_factor_ms),
        )
        .with_jitter(self.backoff_jitter)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// A zero TTL disables caching.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SourcesConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn jitter_flag_reaches_the_retry_policy() {
        let config: SourcesConfig =
            serde_json::from_str(r#"{"backoff_factor_ms": 200, "backoff_jitter": true}"#)
                .expect("valid config");

        let policy = config.retry_policy();
        assert!(policy.backoff.jitter);
        assert_eq!(policy.backoff.base, Duration::from_millis(200));
        for _ in 0..20 {
            let wait = policy.delay_for_attempt(0);
            assert!(wait >= Duration::from_millis(100) && wait <= Duration::from_millis(300));
        }
    }

    #[test]
    fn rejects_empty_and_duplicate_priority() {
        let empty = SourcesConfig {
            priority: Vec::new(),
            ..SourcesConfig::default()
        };
        assert_eq!(empty.validate(), Err(ConfigError::EmptyPriority));

        let duplicate = SourcesConfig {
            priority: vec![SourceId::YAHOO, SourceId::FMP, SourceId::YAHOO],
            ..SourcesConfig::default()
        };
        assert_eq!(
            duplicate.validate(),
            Err(ConfigError::DuplicateSource {
                source_id: String::from("yahoo")
            })
        );
    }

    #[test]
    fn deserializes_partial_config_with_defaults() {
        let config: SourcesConfig =
            serde_json::from_str(r#"{"priority": ["yahoo"], "max_retries": 1}"#)
                .expect("valid config");

        assert_eq!(config.priority, vec![SourceId::YAHOO]);
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.timeout_ms, 15_000);
    }

    #[test]
    fn rejects_unknown_source_id_shape() {
        let result = serde_json::from_str::<SourcesConfig>(r#"{"priority": ["Not Valid!"]}"#);
        assert!(result.is_err());
    }
}
