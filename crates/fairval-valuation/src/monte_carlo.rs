use fairval_core::{ConfigError, FinancialData, MarketData};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, LogNormal, Normal, StandardNormal};
use rayon::prelude::*;
use tracing::debug;

use crate::stats::{mean, percentile_sorted, round_to, std_dev};
use crate::{
    DcfValuation, ModelConfig, SimulationDraw, ValuationError, ValuationInputs,
    ValuationProbabilities, ValuationRange, ValuationResult,
};

pub const DCF_WEIGHT: f64 = 0.7;
pub const PE_WEIGHT: f64 = 0.3;

/// Per-draw values are clamped into `[LOWER, UPPER] * current_price`.
pub const LOWER_CLAMP: f64 = 0.8;
pub const UPPER_CLAMP: f64 = 1.5;

/// Relative distance from the current price that still counts as fair.
pub const FAIR_BAND: f64 = 0.10;

pub const GROWTH_MEAN: f64 = 0.05;
pub const GROWTH_STD: f64 = 0.01;
pub const EQUITY_RISK_PREMIUM: f64 = 0.04;
pub const DISCOUNT_STD: f64 = 0.005;
pub const TERMINAL_GROWTH: f64 = 0.02;
pub const PE_LOG_STD: f64 = 0.15;

const MAX_DISCOUNT_REDRAWS: usize = 64;

const QUARTERS: usize = 4;
const MAX_ANNUAL_DRIFT: f64 = 0.10;
const MIN_VOLATILITY: f64 = 0.05;
const MAX_VOLATILITY: f64 = 0.20;
const MAX_QUARTER_MOVE: f64 = 0.20;

/// Distributions every draw is sampled from.
#[derive(Debug, Clone, Copy)]
struct DrawSampler {
    growth: Normal<f64>,
    discount: Normal<f64>,
    pe: LogNormal<f64>,
}

impl DrawSampler {
    fn new(risk_free_rate: f64, reference_pe: f64) -> Result<Self, ValuationError> {
        let invalid = |err: rand_distr::NormalError| ValuationError::InvalidParameters(err.to_string());

        Ok(Self {
            growth: Normal::new(GROWTH_MEAN, GROWTH_STD).map_err(invalid)?,
            discount: Normal::new(risk_free_rate + EQUITY_RISK_PREMIUM, DISCOUNT_STD)
                .map_err(invalid)?,
            pe: LogNormal::new(reference_pe.ln(), PE_LOG_STD).map_err(invalid)?,
        })
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SimulationDraw, ValuationError> {
        let growth_rate = self.growth.sample(rng);

        let mut discount_rate = self.discount.sample(rng);
        let mut redraws = 0;
        while discount_rate <= TERMINAL_GROWTH {
            if redraws == MAX_DISCOUNT_REDRAWS {
                return Err(ValuationError::InvalidParameters(format!(
                    "could not draw a discount rate above terminal growth {TERMINAL_GROWTH}"
                )));
            }
            discount_rate = self.discount.sample(rng);
            redraws += 1;
        }

        Ok(SimulationDraw {
            growth_rate,
            discount_rate,
            terminal_growth: TERMINAL_GROWTH,
            pe_multiple: self.pe.sample(rng),
            earnings_growth_correlation: 1.0,
        })
    }
}

/// Everything a shard needs to value draws independently.
#[derive(Debug, Clone, Copy)]
struct DrawContext {
    sampler: DrawSampler,
    dcf: DcfValuation,
    eps: f64,
    price: f64,
}

impl DrawContext {
    fn value<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64, ValuationError> {
        let draw = self.sampler.sample(rng)?;
        let dcf_value =
            self.dcf
                .calculate(draw.growth_rate, draw.discount_rate, draw.terminal_growth)?;
        let pe_value = draw.pe_multiple * self.eps;
        let combined = DCF_WEIGHT * dcf_value + PE_WEIGHT * pe_value;

        Ok(clamp_to_price(combined, self.price))
    }

    fn values<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Result<Vec<f64>, ValuationError> {
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.value(rng)?);
        }
        Ok(values)
    }
}

fn clamp_to_price(value: f64, price: f64) -> f64 {
    value.clamp(LOWER_CLAMP * price, UPPER_CLAMP * price)
}

/// Splits `total` draws into `shards` contiguous sizes, remainder first.
fn shard_sizes(total: usize, shards: usize) -> Vec<usize> {
    let shards = shards.clamp(1, total.max(1));
    let base = total / shards;
    let remainder = total % shards;
    (0..shards)
        .map(|index| base + usize::from(index < remainder))
        .collect()
}

/// Fuses DCF and PE valuations over randomized assumptions.
#[derive(Debug, Clone)]
pub struct MonteCarloEngine {
    config: ModelConfig,
}

impl MonteCarloEngine {
    pub fn new(config: ModelConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Values one security. Seeds from `config.seed` when set, else from entropy.
    pub fn run(
        &self,
        financials: &FinancialData,
        market: &MarketData,
    ) -> Result<ValuationResult, ValuationError> {
        let inputs = ValuationInputs::new(market.clone(), financials.clone())?;
        self.evaluate(&inputs)
    }

    pub fn evaluate(&self, inputs: &ValuationInputs) -> Result<ValuationResult, ValuationError> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.evaluate_with_rng(inputs, &mut rng)
    }

    pub fn evaluate_with_rng<R: Rng + ?Sized>(
        &self,
        inputs: &ValuationInputs,
        rng: &mut R,
    ) -> Result<ValuationResult, ValuationError> {
        let price = inputs.current_price();
        let mut values = self.sample_values(inputs, rng)?;
        values.sort_by(f64::total_cmp);

        let valuation_range = ValuationRange {
            low: round_to(percentile_sorted(&values, 25.0), 2),
            medium: round_to(percentile_sorted(&values, 50.0), 2),
            high: round_to(percentile_sorted(&values, 75.0), 2),
        };

        let value_mean = mean(&values);
        let value_std = std_dev(&values);
        let mu = value_mean / price - 1.0;
        let sigma = value_std / price;
        let drift = if sigma > 0.0 {
            mu - 0.5 * sigma * sigma
        } else {
            mu
        };

        debug!(
            sims = values.len(),
            mean = value_mean,
            std_dev = value_std,
            mu,
            sigma,
            drift,
            "simulation summary"
        );

        Ok(ValuationResult {
            valuation_range,
            probabilities: probabilities(&values, price),
            next_quarters: forecast_quarters(price, drift, sigma, rng),
        })
    }

    /// Clamped combined value of every draw, in draw order.
    ///
    /// With `worker_shards > 1` each shard runs on the rayon pool with its
    /// own RNG seeded from `rng`, and shard outputs are concatenated in order.
    pub fn sample_values<R: Rng + ?Sized>(
        &self,
        inputs: &ValuationInputs,
        rng: &mut R,
    ) -> Result<Vec<f64>, ValuationError> {
        let context = DrawContext {
            sampler: DrawSampler::new(self.config.risk_free_rate, inputs.reference_pe())?,
            dcf: DcfValuation::new(
                inputs.financials().free_cash_flow,
                self.config.dcf_growth_years,
            )?,
            eps: inputs.eps(),
            price: inputs.current_price(),
        };

        let sims = self.config.monte_carlo_sims;
        if self.config.worker_shards <= 1 {
            return context.values(sims, rng);
        }

        let plan: Vec<(u64, usize)> = shard_sizes(sims, self.config.worker_shards)
            .into_iter()
            .map(|count| (rng.gen::<u64>(), count))
            .collect();

        let shards = plan
            .into_par_iter()
            .map(|(seed, count)| context.values(count, &mut StdRng::seed_from_u64(seed)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(shards.into_iter().flatten().collect())
    }
}

fn probabilities(values: &[f64], price: f64) -> ValuationProbabilities {
    if values.is_empty() {
        return ValuationProbabilities {
            undervalued: 0.0,
            overvalued: 0.0,
            fair_valued: 1.0,
        };
    }

    let total = values.len() as f64;
    let relative = |value: &&f64| (**value - price) / price;
    let under = values.iter().filter(|v| relative(v) < -FAIR_BAND).count() as f64 / total;
    let over = values.iter().filter(|v| relative(v) > FAIR_BAND).count() as f64 / total;

    let undervalued = round_to(under, 4);
    let overvalued = round_to(over, 4);
    ValuationProbabilities {
        undervalued,
        overvalued,
        fair_valued: round_to(1.0 - undervalued - overvalued, 4),
    }
}

/// One sampled path of a discretized geometric walk, one point per quarter.
fn forecast_quarters<R: Rng + ?Sized>(price: f64, drift: f64, sigma: f64, rng: &mut R) -> [f64; 4] {
    let drift = drift.clamp(-MAX_ANNUAL_DRIFT, MAX_ANNUAL_DRIFT);
    let sigma = sigma.clamp(MIN_VOLATILITY, MAX_VOLATILITY);
    let floor = price * (1.0 - MAX_QUARTER_MOVE);
    let ceiling = price * (1.0 + MAX_QUARTER_MOVE);

    let mut quarters = [0.0; QUARTERS];
    let mut path = price;
    for quarter in &mut quarters {
        let shock: f64 = StandardNormal.sample(rng);
        path *= 1.0 + drift / QUARTERS as f64 + sigma / 2.0 * shock;
        path = path.clamp(floor, ceiling);
        *quarter = round_to(path, 2);
    }
    quarters
}
