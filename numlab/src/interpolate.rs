//! Piecewise linear interpolation through tabulated points.

use crate::{Interval, ScalarFunction, SolverError, function::eval_checked};

/// A polyline through `(xs[i], ys[i])`, with strictly increasing `xs`.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseLinear {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

/// One straight piece `y = kx + b` of a [`PiecewiseLinear`], valid on `[x_lo, x_hi]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Left node.
    pub x_lo: f64,
    /// Right node.
    pub x_hi: f64,
    /// k
    pub slope: f64,
    /// b
    pub intercept: f64,
}

impl Segment {
    /// kx + b
    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

impl std::fmt::Display for Segment {
    #[mutants::skip]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.intercept < 0.0 { '-' } else { '+' };
        write!(
            f,
            "y = {}x {sign} {} on [{}, {}]",
            self.slope,
            self.intercept.abs(),
            self.x_lo,
            self.x_hi
        )
    }
}

impl PiecewiseLinear {
    /// Needs at least two nodes, as many `ys` as `xs`, and strictly increasing finite `xs`.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, SolverError> {
        if xs.len() != ys.len() {
            return Err(SolverError::DimensionMismatch {
                expected: xs.len(),
                actual: ys.len(),
            });
        }
        if xs.len() < 2 {
            return Err(SolverError::TooFewNodes { count: xs.len() });
        }
        if let Some(index) = xs.iter().position(|x| !x.is_finite()) {
            return Err(SolverError::UnsortedNodes { index });
        }
        if let Some(index) = xs.windows(2).position(|w| w[0] >= w[1]) {
            return Err(SolverError::UnsortedNodes { index: index + 1 });
        }
        Ok(Self { xs, ys })
    }

    /// Tabulate `f` at `n + 1` equally spaced nodes spanning `interval`.
    pub fn sample<F>(f: &F, interval: Interval, n: usize) -> Result<Self, SolverError>
    where
        F: ScalarFunction + ?Sized,
    {
        if n == 0 {
            return Err(SolverError::TooFewNodes { count: 1 });
        }
        let h = interval.length() / n as f64;
        let mut xs = Vec::with_capacity(n + 1);
        let mut ys = Vec::with_capacity(n + 1);
        for i in 0..=n {
            // Pin the last node so rounding can't move it off the interval.
            let x = if i == n {
                interval.hi()
            } else {
                interval.lo() + i as f64 * h
            };
            xs.push(x);
            ys.push(eval_checked(f, x)?);
        }
        Self::new(xs, ys)
    }

    /// Node abscissae.
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Node ordinates.
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// The span from the first node to the last.
    pub fn domain(&self) -> Interval {
        Interval::new_unchecked(self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// The straight piece between each pair of neighbouring nodes.
    pub fn segments(&self) -> Vec<Segment> {
        self.xs
            .windows(2)
            .zip(self.ys.windows(2))
            .map(|(x, y)| {
                let slope = (y[1] - y[0]) / (x[1] - x[0]);
                Segment {
                    x_lo: x[0],
                    x_hi: x[1],
                    slope,
                    intercept: y[0] - slope * x[0],
                }
            })
            .collect()
    }

    /// Value of the polyline at `x`. Fails outside the node span.
    pub fn interpolate(&self, x: f64) -> Result<f64, SolverError> {
        let domain = self.domain();
        if !domain.contains(x) {
            return Err(SolverError::OutOfRange {
                x,
                lo: domain.lo(),
                hi: domain.hi(),
            });
        }
        // Index of the first node strictly right of x, clamped so the last node uses the last segment.
        let right = self.xs.partition_point(|&node| node <= x).min(self.xs.len() - 1);
        let left = right - 1;
        let t = (x - self.xs[left]) / (self.xs[right] - self.xs[left]);
        Ok(self.ys[left] + t * (self.ys[right] - self.ys[left]))
    }
}
