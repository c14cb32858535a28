//! Solvers for functions of one variable.

mod bisection;
mod golden;
mod parabolic;

pub use bisection::{BisectionConfig, BisectionOutcome, BisectionStep, bisect};
pub use golden::{
    Bracket, BracketConfig, GoldenConfig, GoldenOutcome, GoldenStep, MinimizeOutcome, bracket,
    golden_section, minimize,
};
pub use parabolic::{
    ExtremumKind, Goal, ParabolicConfig, ParabolicOutcome, ParabolicStep, parabolic,
    parabolic_in,
};

use crate::SolverError;

/// A finite interval `[lo, hi]` with `lo < hi`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    lo: f64,
    hi: f64,
}

impl Interval {
    /// Fails unless both bounds are finite and `lo < hi`.
    pub fn new(lo: f64, hi: f64) -> Result<Self, SolverError> {
        if lo < hi && lo.is_finite() && hi.is_finite() {
            Ok(Self { lo, hi })
        } else {
            Err(SolverError::InvalidInterval { lo, hi })
        }
    }

    /// For bounds known at compile time to be valid.
    pub(crate) const fn new_unchecked(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// Lower bound.
    pub fn lo(&self) -> f64 {
        self.lo
    }

    /// Upper bound.
    pub fn hi(&self) -> f64 {
        self.hi
    }

    /// `hi - lo`, always positive.
    pub fn length(&self) -> f64 {
        self.hi - self.lo
    }

    /// Center of the interval.
    pub fn midpoint(&self) -> f64 {
        self.lo + 0.5 * (self.hi - self.lo)
    }

    /// Is `x` inside the closed interval?
    pub fn contains(&self, x: f64) -> bool {
        self.lo <= x && x <= self.hi
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}
