use fairval_tests::*;
use fairval_valuation::{
    DcfValuation, ModelConfig, MonteCarloEngine, PeValuation, ValuationError, ValuationInputs,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn market(price: f64, pe_ratio: Option<f64>) -> MarketData {
    MarketData {
        source: SourceId::FMP,
        price,
        volume: 1_000_000,
        pe_ratio,
        currency: String::from("USD"),
        timestamp: UtcDateTime::now(),
    }
}

fn financials(eps: Option<f64>, free_cash_flow: f64) -> FinancialData {
    FinancialData {
        source: SourceId::FMP,
        revenue: 10_000.0,
        net_income: 500.0,
        eps,
        free_cash_flow,
        shares_outstanding: 100.0,
        report_date: String::from("2024-03-31"),
        currency: String::from("USD"),
    }
}

fn engine(sims: usize, seed: u64) -> MonteCarloEngine {
    MonteCarloEngine::new(ModelConfig {
        monte_carlo_sims: sims,
        seed: Some(seed),
        ..ModelConfig::default()
    })
    .expect("valid config")
}

#[test]
fn dcf_increases_with_growth_and_decreases_with_discount() {
    let dcf = DcfValuation::new(1_000.0, 5).expect("valid model");

    let mut previous = f64::NEG_INFINITY;
    for step in 0..10 {
        let growth = 0.01 * f64::from(step);
        let value = dcf.calculate(growth, 0.09, 0.02).expect("valid rates");
        assert!(value.is_finite());
        assert!(value > previous, "growth={growth}, value={value}, previous={previous}");
        previous = value;
    }

    let mut previous = f64::INFINITY;
    for step in 0..10 {
        let discount = 0.03 + 0.01 * f64::from(step);
        let value = dcf.calculate(0.05, discount, 0.02).expect("valid rates");
        assert!(value.is_finite());
        assert!(value < previous, "discount={discount}, value={value}, previous={previous}");
        previous = value;
    }
}

#[test]
fn dcf_is_linear_in_free_cash_flow() {
    let single = DcfValuation::new(1_000.0, 5)
        .expect("valid model")
        .calculate(0.05, 0.08, 0.02)
        .expect("valid rates");
    let double = DcfValuation::new(2_000.0, 5)
        .expect("valid model")
        .calculate(0.05, 0.08, 0.02)
        .expect("valid rates");

    assert!(single > 0.0);
    assert_eq!(double, 2.0 * single);
}

#[test]
fn dcf_refuses_undefined_perpetuity() {
    let dcf = DcfValuation::new(1_000.0, 5).expect("valid model");
    assert!(matches!(
        dcf.calculate(0.05, 0.02, 0.03),
        Err(ValuationError::InvalidParameters(_))
    ));
}

#[test]
fn pe_valuation_scales_with_net_income() {
    let model = PeValuation::new(500.0, 20.0).expect("valid model");
    let doubled = PeValuation::new(1_000.0, 20.0).expect("valid model");

    assert_eq!(doubled.calculate(18.0, 5.0), 2.0 * model.calculate(18.0, 5.0));
}

#[test]
fn monte_carlo_range_is_ordered_and_bounded() {
    let result = engine(2_000, 17)
        .run(&financials(Some(5.0), 1_000.0), &market(100.0, Some(20.0)))
        .expect("valuation");

    let range = result.valuation_range;
    assert!(range.low <= range.medium && range.medium <= range.high, "{range:?}");
    for value in [range.low, range.medium, range.high] {
        assert!((50.0..=200.0).contains(&value), "{range:?}");
    }
}

#[test]
fn every_draw_is_clamped_to_the_price_band() {
    // Cash flow sized so raw draws land on both sides of the band.
    for (price, free_cash_flow) in [(10.0, 0.4), (100.0, 4.5), (250.0, 25.0)] {
        let inputs =
            ValuationInputs::new(market(price, Some(18.0)), financials(Some(price / 20.0), free_cash_flow))
                .expect("valid inputs");
        let values = engine(1_000, 1)
            .sample_values(&inputs, &mut StdRng::seed_from_u64(99))
            .expect("draws");

        let (lower, upper) = (0.8 * price, 1.5 * price);
        assert!(
            values.iter().all(|value| *value >= lower && *value <= upper),
            "price={price}"
        );
    }
}

#[test]
fn probabilities_partition_the_draws() {
    for (seed, free_cash_flow) in [(1, 3.0), (2, 4.5), (3, 6.0), (4, 1_000.0)] {
        let result = engine(1_500, seed)
            .run(&financials(Some(5.0), free_cash_flow), &market(100.0, Some(20.0)))
            .expect("valuation");

        let probabilities = result.probabilities;
        let total = probabilities.undervalued + probabilities.overvalued + probabilities.fair_valued;
        assert!((total - 1.0).abs() < 1e-6, "{probabilities:?}");
        assert!(probabilities.fair_valued >= 0.0);
    }
}

#[test]
fn outlier_trailing_pe_uses_default_reference() {
    let inputs = ValuationInputs::new(market(100.0, Some(400.0)), financials(Some(5.0), 0.0))
        .expect("valid inputs");
    assert_eq!(inputs.reference_pe(), 15.0);
}

#[test]
fn non_positive_price_fails_fast() {
    let err = engine(100, 1)
        .run(&financials(Some(5.0), 1_000.0), &market(-1.0, None))
        .expect_err("negative price");
    assert!(matches!(err, ValuationError::InvalidInput(_)));
}
