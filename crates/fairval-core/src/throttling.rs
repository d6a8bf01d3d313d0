use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Client-side request budget for providers with a hard per-window quota.
///
/// Requests beyond the budget are refused locally instead of spending a call
/// that the provider would answer with a rate-limit notice.
#[derive(Clone)]
pub struct RateBudget {
    limiter: Arc<DirectRateLimiter>,
    window: Duration,
    limit: u32,
}

impl RateBudget {
    pub fn new(window: Duration, limit: u32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_window(window, limit))),
            window,
            limit: limit.max(1),
        }
    }

    /// Alpha Vantage free tier: five calls per minute.
    pub fn alphavantage_free_tier() -> Self {
        Self::new(Duration::from_secs(60), 5)
    }

    /// Takes one unit of budget, or returns the time until one frees up.
    pub fn acquire(&self) -> Result<(), Duration> {
        self.limiter.check().map_err(|_| self.replenish_interval())
    }

    pub fn replenish_interval(&self) -> Duration {
        self.window / self.limit
    }
}

impl std::fmt::Debug for RateBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateBudget")
            .field("window", &self.window)
            .field("limit", &self.limit)
            .finish()
    }
}

fn quota_from_window(window: Duration, limit: u32) -> Quota {
    let burst = NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (window.as_secs_f64() / f64::from(burst.get())).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
        .allow_burst(burst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_once_burst_is_spent() {
        let budget = RateBudget::new(Duration::from_secs(60), 2);

        assert!(budget.acquire().is_ok());
        assert!(budget.acquire().is_ok());

        let wait = budget.acquire().expect_err("third call exceeds budget");
        assert_eq!(wait, Duration::from_secs(30));
    }

    #[test]
    fn zero_limit_is_treated_as_one() {
        let budget = RateBudget::new(Duration::from_secs(10), 0);
        assert!(budget.acquire().is_ok());
        assert!(budget.acquire().is_err());
    }
}
