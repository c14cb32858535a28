//! Euler-Cauchy (improved Euler) integration of y' = f(x, y).

use crate::{BivariateFunction, Interval, SolverError, config::check_step, function::eval2_checked};

/// Grid points closer than this fraction of a step to `x_end` count as reaching it.
const END_SLACK: f64 = 1e-9;

/// The (x, y) pairs an integration visited, starting with the initial condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    points: Vec<(f64, f64)>,
    step: f64,
}

impl Trajectory {
    /// All points, in order of increasing x.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// The step size used.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of steps taken (one less than the number of points).
    pub fn steps(&self) -> usize {
        self.points.len() - 1
    }

    /// The last point. Its x is at or just past the requested end.
    pub fn last(&self) -> (f64, f64) {
        // Never empty: the initial condition is always stored.
        self.points[self.points.len() - 1]
    }

    /// Compare the trajectory's slope with f(x, y) at the nodes nearest each of `xs`.
    /// The slope is a forward difference quotient, or a backward one at the last node.
    pub fn derivative_check<F>(&self, f: &F, xs: &[f64]) -> Result<Vec<DerivativeCheck>, SolverError>
    where
        F: BivariateFunction + ?Sized,
    {
        let mut checks = Vec::with_capacity(xs.len());
        for &requested in xs {
            let i = self.nearest(requested);
            let (x, y) = self.points[i];
            let quotient = if let Some(&(x_next, y_next)) = self.points.get(i + 1) {
                (y_next - y) / (x_next - x)
            } else if i > 0 {
                let (x_prev, y_prev) = self.points[i - 1];
                (y - y_prev) / (x - x_prev)
            } else {
                f64::NAN
            };
            let slope = eval2_checked(f, x, y)?;
            checks.push(DerivativeCheck {
                x,
                y,
                difference_quotient: quotient,
                slope,
                error: (quotient - slope).abs(),
            });
        }
        Ok(checks)
    }

    fn nearest(&self, x: f64) -> usize {
        let mut best = 0;
        for (i, &(xi, _)) in self.points.iter().enumerate() {
            if (xi - x).abs() < (self.points[best].0 - x).abs() {
                best = i;
            }
        }
        best
    }
}

/// How well the trajectory's slope matches the ODE at one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivativeCheck {
    /// The node's x.
    pub x: f64,
    /// The node's y.
    pub y: f64,
    /// Δy / Δx from the neighbouring node.
    pub difference_quotient: f64,
    /// f(x, y), what the slope should be.
    pub slope: f64,
    /// |difference_quotient − slope|
    pub error: f64,
}

/// Integrate y' = f(x, y) from (x0, y0) with fixed step `h` until x reaches `x_end`.
///
/// Each step predicts with explicit Euler, ŷ = y + h·f(x, y), then corrects with
/// the trapezoidal rule, y' = y + h/2·(f(x, y) + f(x + h, ŷ)).
/// Grid points are x_k = x0 + k·h. Integration stops at the first grid point at or past
/// `x_end`, so the last point can overshoot `x_end` by less than one step.
/// `x_end` must be past `x0`.
pub fn euler_cauchy<F>(
    f: &F,
    x0: f64,
    y0: f64,
    x_end: f64,
    h: f64,
) -> Result<Trajectory, SolverError>
where
    F: BivariateFunction + ?Sized,
{
    check_step(h)?;
    Interval::new(x0, x_end)?;
    let mut points = vec![(x0, y0)];
    let (mut x, mut y) = (x0, y0);
    let mut k = 0usize;
    while x < x_end - END_SLACK * h {
        let slope = eval2_checked(f, x, y)?;
        k += 1;
        let x_next = x0 + k as f64 * h;
        let predicted = y + h * slope;
        let corrected = y + h / 2.0 * (slope + eval2_checked(f, x_next, predicted)?);
        x = x_next;
        y = corrected;
        points.push((x, y));
    }
    Ok(Trajectory { points, step: h })
}
