//! Bounded retry with exponential backoff around a single source fetch.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, warn};

use crate::{SourceError, SourceId};

/// Exponential backoff between retries: `base * factor^attempt`, capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub base: Duration,
    pub factor: f64,
    pub max: Duration,
    /// Spreads each wait uniformly over +/- 50% of its nominal value.
    pub jitter: bool,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            factor: 2.0,
            max: Duration::from_secs(30),
            jitter: false,
        }
    }
}

impl Backoff {
    /// Delay before retry number `attempt + 1` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        let scale = self.factor.powi(attempt.min(i32::MAX as u32) as i32);
        let seconds = (self.base.as_secs_f64() * scale).min(self.max.as_secs_f64());
        let delay = Duration::from_secs_f64(seconds);

        if !self.jitter {
            return delay;
        }

        let nominal_ms = delay.as_millis() as u64;
        let spread_ms = nominal_ms / 2;
        let offset_ms = fastrand::u64(0..=(spread_ms * 2));
        Duration::from_millis(nominal_ms - spread_ms + offset_ms)
    }
}

/// Terminal outcome of a retried fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The failure is outside the retryable category and was surfaced at once.
    #[error("{source_id}: {error}")]
    Source {
        source_id: SourceId,
        error: SourceError,
    },
    /// Every attempt failed with a retryable error.
    #[error("{source_id}: retry exhausted after {attempts} attempt(s), last error: {last}")]
    RetryExhausted {
        source_id: SourceId,
        attempts: u32,
        last: SourceError,
    },
}

impl FetchError {
    pub fn source_id(&self) -> &SourceId {
        match self {
            Self::Source { source_id, .. } | Self::RetryExhausted { source_id, .. } => source_id,
        }
    }

    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, Self::RetryExhausted { .. })
    }
}

/// Retry wrapper: `max_retries` extra attempts with `backoff` between them.
///
/// Total attempts = `max_retries + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Backoff::default(),
        }
    }
}

impl RetryPolicy {
    /// Waits `backoff_factor * 2^attempt` between attempts.
    pub fn exponential(max_retries: u32, backoff_factor: Duration) -> Self {
        Self {
            max_retries,
            backoff: Backoff {
                base: backoff_factor,
                ..Backoff::default()
            },
        }
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.backoff.jitter = jitter;
        self
    }

    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }

    /// Runs `operation` until it succeeds, fails non-retryably, or the budget is spent.
    ///
    /// Backoff waits are `tokio` sleeps, so dropping the returned future
    /// cancels any pending wait.
    pub async fn run<T, F, Fut>(&self, source: &SourceId, mut operation: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let mut attempt = 0;
        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !error.retryable() {
                return Err(FetchError::Source {
                    source_id: source.clone(),
                    error,
                });
            }

            if attempt >= self.max_retries {
                error!(source = %source, attempts = attempt + 1, "retry exhausted");
                return Err(FetchError::RetryExhausted {
                    source_id: source.clone(),
                    attempts: attempt + 1,
                    last: error,
                });
            }

            let wait = self.delay_for_attempt(attempt);
            warn!(
                source = %source,
                retry = attempt + 1,
                max_retries = self.max_retries,
                wait_ms = wait.as_millis() as u64,
                error = %error,
                "fetch failed, backing off"
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }
}
