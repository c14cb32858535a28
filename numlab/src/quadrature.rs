//! Composite midpoint rule, and an empirical estimate of its order of accuracy.

use crate::{Interval, ScalarFunction, SolverError, Warning, WarningContent, function::eval_checked};

/// Differences smaller than this, relative to the integral, are rounding noise.
const ORDER_DENOMINATOR_THRESHOLD: f64 = 1e-12;

/// Composite midpoint rule with `n` equal subintervals:
/// I(N) = h · Σ f(a + h(i + ½)), h = (b − a) / N.
pub fn midpoint<F>(f: &F, interval: Interval, n: usize) -> Result<f64, SolverError>
where
    F: ScalarFunction + ?Sized,
{
    if n == 0 {
        return Err(SolverError::ZeroSubintervals);
    }
    let a = interval.lo();
    let h = interval.length() / n as f64;
    let mut sum = 0.0;
    for i in 0..n {
        sum += eval_checked(f, a + h * (i as f64 + 0.5))?;
    }
    Ok(h * sum)
}

/// Midpoint estimates on three successively halved grids, and the order they imply.
#[derive(Debug, Clone)]
pub struct OrderEstimate {
    pub(crate) subintervals: [usize; 3],
    pub(crate) estimates: [f64; 3],
    pub(crate) order: f64,
    pub(crate) warnings: Vec<Warning>,
}

impl OrderEstimate {
    /// N, 2N and 4N.
    pub fn subintervals(&self) -> [usize; 3] {
        self.subintervals
    }

    /// I(N), I(2N) and I(4N).
    pub fn estimates(&self) -> [f64; 3] {
        self.estimates
    }

    /// The finest estimate, I(4N).
    pub fn integral(&self) -> f64 {
        self.estimates[2]
    }

    /// p = log2(|(I(N) − I(2N)) / (I(2N) − I(4N))|), or NaN if that's undefined.
    pub fn order(&self) -> f64 {
        self.order
    }

    /// Set when the order couldn't be estimated.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

/// Integrate with N, 2N and 4N subintervals and estimate the empirical order
/// of accuracy by Richardson/Aitken extrapolation.
///
/// If the last two estimates agree exactly (e.g. the rule is exact for `f`),
/// the order is NaN and a warning says so.
pub fn estimate_order<F>(f: &F, interval: Interval, n: usize) -> Result<OrderEstimate, SolverError>
where
    F: ScalarFunction + ?Sized,
{
    let Some(finest) = n.checked_mul(4) else {
        return Err(SolverError::TooManySubintervals { n });
    };
    let subintervals = [n, finest / 2, finest];
    let estimates = [
        midpoint(f, interval, subintervals[0])?,
        midpoint(f, interval, subintervals[1])?,
        midpoint(f, interval, subintervals[2])?,
    ];
    let numerator = estimates[0] - estimates[1];
    let denominator = estimates[1] - estimates[2];
    let ratio = (numerator / denominator).abs();
    let mut warnings = Vec::new();
    let scale = estimates[2].abs().max(1.0);
    let order = if denominator.abs() < ORDER_DENOMINATOR_THRESHOLD * scale
        || !(ratio > 0.0 && ratio.is_finite())
    {
        warnings.push(Warning::from(WarningContent::OrderUndefined));
        f64::NAN
    } else {
        ratio.log2()
    };
    Ok(OrderEstimate {
        subintervals,
        estimates,
        order,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problems::{lab_integrand, lab_interval};

    #[test]
    fn midpoint_is_exact_for_lines() {
        let i = midpoint(&|x: f64| 2.0 * x + 1.0, Interval::new(0.0, 2.0).unwrap(), 3).unwrap();
        assert!((i - 6.0).abs() < 1e-12);
    }

    #[test]
    fn zero_subintervals() {
        assert_eq!(
            midpoint(&|x: f64| x, Interval::new(0.0, 1.0).unwrap(), 0),
            Err(SolverError::ZeroSubintervals)
        );
    }

    #[test]
    fn smooth_functions_are_second_order() {
        let estimate = estimate_order(&|x: f64| x.exp(), Interval::new(0.0, 1.0).unwrap(), 100).unwrap();
        assert!((estimate.order() - 2.0).abs() < 0.01);
        assert!((estimate.integral() - (1f64.exp() - 1.0)).abs() < 1e-6);
        assert!(estimate.warnings().is_empty());
    }

    #[test]
    fn lab_integrand_is_finite_with_a_reduced_order() {
        // The √(x + 4) factor has an infinite derivative at the left end,
        // which pulls the observed order below 2.
        let estimate = estimate_order(&lab_integrand, lab_interval(), 100).unwrap();
        for i in estimate.estimates() {
            assert!(i.is_finite());
        }
        assert!((estimate.integral() + 10.5605).abs() < 1e-3);
        assert!(estimate.order() > 1.4 && estimate.order() < 1.7);
    }

    #[test]
    fn grids_that_overflow_are_rejected() {
        let interval = Interval::new(0.0, 1.0).unwrap();
        let n = usize::MAX / 2;
        assert_eq!(
            estimate_order(&|x: f64| x, interval, n).unwrap_err(),
            SolverError::TooManySubintervals { n }
        );
        assert_eq!(
            estimate_order(&|x: f64| x, interval, 0).unwrap_err(),
            SolverError::ZeroSubintervals
        );
    }

    #[test]
    fn exact_rules_have_no_order() {
        let estimate = estimate_order(&|x: f64| 3.0 * x, Interval::new(0.0, 1.0).unwrap(), 10).unwrap();
        assert!(estimate.order().is_nan());
        assert_eq!(estimate.warnings()[0].content, WarningContent::OrderUndefined);
    }
}
