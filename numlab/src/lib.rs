//! Classical iterative numerical methods.
//!
//! Root finding (bisection), one-dimensional minimization (bracketing plus golden
//! section, parabolic interpolation), two-dimensional coordinate descent, Newton's
//! method for nonlinear systems, dense linear systems (LU and Gauss-Seidel),
//! midpoint quadrature with an order estimate, the Euler-Cauchy ODE integrator and
//! piecewise linear interpolation.
//!
//! Every iterative solver returns an outcome holding the answer, the number of
//! iterations, a [`Trace`] of each step and any [`Warning`]s. Inputs that make a
//! solve meaningless (reversed intervals, singular pivots, ...) are a [`SolverError`].
//!
//! ```
//! use numlab::{Interval, scalar::{BisectionConfig, bisect}};
//!
//! let interval = Interval::new(1.0, 2.0).unwrap();
//! let outcome = bisect(&|x: f64| x * x * x - x - 2.0, interval, BisectionConfig::default()).unwrap();
//! assert!((outcome.root() - 1.5213797).abs() < 1e-5);
//! ```

pub use crate::error::{EvalError, ExprError, SolverError};
pub use crate::expr::{Bindings, Expr, ExprSystem};
pub use crate::function::{
    BivariateFunction, Fallible, FnSystem, NonlinearSystem, ScalarFunction, SumOfSquares,
};
pub use crate::scalar::Interval;
pub use crate::trace::{IterationRecord, Trace};
pub use crate::warnings::{Warning, WarningContent, lint_diagonal_dominance};

/// Validation shared by solver configs.
mod config;
mod error;
/// The textual expression language.
pub mod expr;
/// Callable traits and finite differences.
pub mod function;
pub mod interpolate;
pub mod linalg;
pub mod multi;
pub mod ode;
pub mod problems;
pub mod quadrature;
#[cfg(feature = "residual-viz")]
pub mod residual_viz;
pub mod scalar;
/// Unit tests
#[cfg(test)]
mod tests;
mod trace;
/// Non-fatal diagnostics attached to outcomes.
mod warnings;
