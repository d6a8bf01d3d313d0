use std::sync::Arc;
use std::time::Duration;

use fairval_tests::*;
use tokio::time::Instant;

fn only(adapter: &Arc<ScriptedAdapter>, max_retries: u32) -> FailoverCoordinator {
    FailoverCoordinator::new(
        registry(&[adapter.clone()]),
        &SourcesConfig {
            priority: vec![adapter.id()],
            max_retries,
            ..SourcesConfig::default()
        },
    )
    .expect("valid config")
}

#[tokio::test(start_paused = true)]
async fn two_transient_failures_cost_exactly_two_backoff_waits() {
    let fmp = Arc::new(ScriptedAdapter::new(SourceId::FMP).with_market_script(vec![
        Err(SourceError::unavailable("503")),
        Err(SourceError::rate_limited("429")),
    ]));
    let coordinator = only(&fmp, 3);
    let started = Instant::now();

    let market = coordinator
        .get_market_data(&listing("AAPL"))
        .await
        .expect("third attempt succeeds");

    // 500 ms then 1 s; timer ticks may round each wait up by a millisecond.
    let elapsed = started.elapsed();
    assert!(
        elapsed >= Duration::from_millis(1_500) && elapsed < Duration::from_millis(1_510),
        "elapsed={elapsed:?}"
    );
    assert_eq!(fmp.market_calls(), 3);
    assert_eq!(market.source, SourceId::FMP);

    let status = coordinator.health().status(&SourceId::FMP).expect("fmp tracked");
    assert_eq!(status.error_count, 2);
    assert_eq!(status.success_count, 1);
    assert!(!coordinator.health().is_healthy(&SourceId::FMP));
}

#[tokio::test(start_paused = true)]
async fn persistent_failure_exhausts_after_max_retries_plus_one() {
    let yahoo = Arc::new(ScriptedAdapter::failing(
        SourceId::YAHOO,
        SourceError::unavailable("connection reset"),
    ));
    let coordinator = only(&yahoo, 2);

    let err = coordinator
        .get_market_data(&listing("AAPL"))
        .await
        .expect_err("source never recovers");

    assert_eq!(yahoo.market_calls(), 3);
    let AcquisitionError::AllSourcesExhausted { attempts, .. } = err else {
        panic!("expected exhausted sources");
    };
    assert!(matches!(
        attempts[0].outcome,
        AttemptOutcome::Failed(FetchError::RetryExhausted { attempts: 3, .. })
    ));
    assert!(attempts[0].to_string().contains("retry exhausted after 3 attempt(s)"));
}

#[tokio::test(start_paused = true)]
async fn exhausted_source_fails_over_and_turns_unhealthy() {
    let fmp = Arc::new(ScriptedAdapter::failing(
        SourceId::FMP,
        SourceError::rate_limited("429"),
    ));
    let yahoo = Arc::new(ScriptedAdapter::new(SourceId::YAHOO));
    let coordinator =
        FailoverCoordinator::new(registry(&[fmp.clone(), yahoo.clone()]), &sources_config(1))
            .expect("valid config");

    let market = coordinator
        .get_market_data(&listing("AAPL"))
        .await
        .expect("yahoo serves after fmp gives up");

    assert_eq!(market.source, SourceId::YAHOO);
    assert_eq!(fmp.market_calls(), 2);
    assert!(!coordinator.health().is_healthy(&SourceId::FMP));

    // The next request skips fmp entirely.
    coordinator
        .get_financials(&listing("AAPL"))
        .await
        .expect("yahoo serves financials");
    assert_eq!(fmp.financial_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn non_retryable_failure_is_not_retried() {
    let fmp = Arc::new(ScriptedAdapter::failing(
        SourceId::FMP,
        SourceError::invalid_request("invalid api key"),
    ));
    let coordinator = only(&fmp, 3);
    let started = Instant::now();

    let err = coordinator
        .get_market_data(&listing("AAPL"))
        .await
        .expect_err("credential problem");

    assert_eq!(fmp.market_calls(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert!(err.to_string().contains("invalid api key"), "{err}");
}
