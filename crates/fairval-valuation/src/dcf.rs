use crate::ValuationError;

/// Years over which growth steps down to the terminal rate.
pub const TRANSITION_YEARS: u32 = 3;

/// Three-phase discounted cash flow model.
///
/// Cash flows compound at `growth_rate` for `high_growth_years`, then for
/// [`TRANSITION_YEARS`] at a rate stepped down by
/// `(growth_rate - terminal_growth) / (TRANSITION_YEARS + 1)` each year.
/// The transition phase compounds from the base free cash flow, not from the
/// last high-growth flow. A Gordon growth terminal value on the last
/// transition flow follows as the final cash flow. Every flow at year `t` is discounted
/// by `1 / (1 + discount_rate)^t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DcfValuation {
    free_cash_flow: f64,
    high_growth_years: u32,
}

impl DcfValuation {
    pub fn new(free_cash_flow: f64, high_growth_years: u32) -> Result<Self, ValuationError> {
        if !free_cash_flow.is_finite() {
            return Err(ValuationError::InvalidInput(String::from(
                "free cash flow must be finite",
            )));
        }
        if high_growth_years == 0 {
            return Err(ValuationError::InvalidParameters(String::from(
                "high-growth phase must last at least one year",
            )));
        }

        Ok(Self {
            free_cash_flow,
            high_growth_years,
        })
    }

    pub const fn free_cash_flow(&self) -> f64 {
        self.free_cash_flow
    }

    pub const fn high_growth_years(&self) -> u32 {
        self.high_growth_years
    }

    /// Present value of all phases, in the currency of the free cash flow.
    ///
    /// Fails when `discount_rate <= terminal_growth`, where the perpetuity
    /// is undefined.
    pub fn calculate(
        &self,
        growth_rate: f64,
        discount_rate: f64,
        terminal_growth: f64,
    ) -> Result<f64, ValuationError> {
        if !(growth_rate.is_finite() && discount_rate.is_finite() && terminal_growth.is_finite())
        {
            return Err(ValuationError::InvalidParameters(String::from(
                "growth, discount and terminal rates must be finite",
            )));
        }
        if discount_rate <= terminal_growth {
            return Err(ValuationError::InvalidParameters(format!(
                "discount rate {discount_rate} must exceed terminal growth {terminal_growth}"
            )));
        }
        if discount_rate <= -1.0 {
            return Err(ValuationError::InvalidParameters(format!(
                "discount rate {discount_rate} must be greater than -100%"
            )));
        }

        // Accumulate per unit of free cash flow so the result scales linearly.
        let discount = 1.0 + discount_rate;
        let mut unit_flow = 1.0;
        let mut present_value = 0.0;
        let mut year = 0;

        for _ in 0..self.high_growth_years {
            year += 1;
            unit_flow *= 1.0 + growth_rate;
            present_value += unit_flow / discount.powi(year);
        }

        let step = (growth_rate - terminal_growth) / f64::from(TRANSITION_YEARS + 1);
        let mut stepped_growth = growth_rate;
        unit_flow = 1.0;
        for _ in 0..TRANSITION_YEARS {
            year += 1;
            stepped_growth -= step;
            unit_flow *= 1.0 + stepped_growth;
            present_value += unit_flow / discount.powi(year);
        }

        year += 1;
        let terminal_value = unit_flow * (1.0 + terminal_growth) / (discount_rate - terminal_growth);
        present_value += terminal_value / discount.powi(year);

        Ok(self.free_cash_flow * present_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_year_matches_closed_form() {
        let dcf = DcfValuation::new(100.0, 1).expect("valid model");
        let value = dcf.calculate(0.10, 0.10, 0.02).expect("valid rates");

        let g1 = 0.10 - 0.02;
        let g2 = g1 - 0.02;
        let g3 = g2 - 0.02;
        let f1 = 110.0;
        let f2 = 100.0 * (1.0 + g1);
        let f3 = f2 * (1.0 + g2);
        let f4 = f3 * (1.0 + g3);
        let tv = f4 * 1.02 / 0.08;
        let expected = f1 / 1.1 + f2 / 1.1_f64.powi(2) + f3 / 1.1_f64.powi(3)
            + f4 / 1.1_f64.powi(4)
            + tv / 1.1_f64.powi(5);

        assert!((value - expected).abs() < 1e-9, "value={value}, expected={expected}");
    }

    #[test]
    fn five_year_reference_value() {
        let dcf = DcfValuation::new(1_000.0, 5).expect("valid model");
        let value = dcf.calculate(0.05, 0.08, 0.02).expect("valid rates");

        assert!((value - 15_912.25).abs() < 0.01, "value={value}");
    }

    #[test]
    fn rejects_discount_not_above_terminal_growth() {
        let dcf = DcfValuation::new(1_000.0, 5).expect("valid model");

        assert!(matches!(
            dcf.calculate(0.05, 0.02, 0.02),
            Err(ValuationError::InvalidParameters(_))
        ));
        assert!(matches!(
            dcf.calculate(0.05, 0.01, 0.02),
            Err(ValuationError::InvalidParameters(_))
        ));
        assert!(dcf.calculate(f64::NAN, 0.08, 0.02).is_err());
    }

    #[test]
    fn zero_cash_flow_values_at_zero() {
        let dcf = DcfValuation::new(0.0, 5).expect("valid model");
        assert_eq!(dcf.calculate(0.05, 0.08, 0.02), Ok(0.0));
    }

    #[test]
    fn rejects_non_finite_cash_flow_and_empty_horizon() {
        assert!(DcfValuation::new(f64::INFINITY, 5).is_err());
        assert!(DcfValuation::new(1.0, 0).is_err());
    }
}
