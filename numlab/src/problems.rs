//! Reference problems from the numerical methods labs, used for defaults, tests and benchmarks.

use faer::Mat;

use crate::{EvalError, Interval, NonlinearSystem};

/// The two-equation system
///
/// ```text
/// cos(ln(0.5 + x²)) − sin(ln(0.4 + (y/2)²)) − 0.025 = 0
/// 4 / (x² + 2y² + 4 − cos(0.01·x·y)) − 0.3 = 0
/// ```
///
/// with its hand-derived Jacobian. Starting from (0.5, 0.5), Newton's method
/// converges to about (−1.758098, 1.902875).
#[derive(Debug, Clone, Copy, Default)]
pub struct LabSystem;

impl LabSystem {
    /// x² + 2y² + 4 − cos(0.01·x·y), the denominator of the second equation.
    fn denominator(x: f64, y: f64) -> f64 {
        x * x + 2.0 * y * y + 4.0 - libm::cos(0.01 * x * y)
    }
}

impl NonlinearSystem for LabSystem {
    fn dim(&self) -> usize {
        2
    }

    fn residual(&self, v: &[f64], out: &mut [f64]) -> Result<(), EvalError> {
        let (x, y) = (v[0], v[1]);
        let half_y = y / 2.0;
        out[0] = libm::cos(libm::log(0.5 + x * x))
            - libm::sin(libm::log(0.4 + half_y * half_y))
            - 0.025;
        out[1] = 4.0 / Self::denominator(x, y) - 0.3;
        Ok(())
    }

    fn jacobian(&self, v: &[f64], jac: &mut Mat<f64>) -> Result<(), EvalError> {
        let (x, y) = (v[0], v[1]);
        let half_y = y / 2.0;
        let inner_x = 0.5 + x * x;
        let inner_y = 0.4 + half_y * half_y;
        jac[(0, 0)] = -libm::sin(libm::log(inner_x)) * 2.0 * x / inner_x;
        // d/dy of ln(0.4 + (y/2)²) is (y/2) / (0.4 + (y/2)²).
        jac[(0, 1)] = -libm::cos(libm::log(inner_y)) * half_y / inner_y;

        let den = Self::denominator(x, y);
        let sin_xy = libm::sin(0.01 * x * y);
        jac[(1, 0)] = -4.0 * (2.0 * x + sin_xy * 0.01 * y) / (den * den);
        jac[(1, 1)] = -4.0 * (4.0 * y + sin_xy * 0.01 * x) / (den * den);
        Ok(())
    }
}

/// (x − 1.5)·√(x + 4) + sin(πx), integrated over [`lab_interval`].
pub fn lab_integrand(x: f64) -> f64 {
    (x - 1.5) * libm::sqrt(x + 4.0) + libm::sin(std::f64::consts::PI * x)
}

/// [−4, 4]
pub fn lab_interval() -> Interval {
    Interval::new_unchecked(-4.0, 4.0)
}

/// y' = asin(1 − 1 / (eˣ + y²)), the right-hand side of [`lab_ode`].
pub fn lab_ode_rhs(x: f64, y: f64) -> f64 {
    libm::asin(1.0 - 1.0 / (libm::exp(x) + y * y))
}

/// Initial condition, range and step of an ODE problem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OdeProblem {
    /// Starting x.
    pub x0: f64,
    /// y(x0)
    pub y0: f64,
    /// Where to stop.
    pub x_end: f64,
    /// Suggested step size.
    pub step: f64,
}

/// [`lab_ode_rhs`] with y(0) = 1 on [0, 1], step 0.01.
pub fn lab_ode() -> OdeProblem {
    OdeProblem {
        x0: 0.0,
        y0: 1.0,
        x_end: 1.0,
        step: 0.01,
    }
}

/// A strictly diagonally dominant 4×4 matrix.
pub fn lab_matrix() -> Mat<f64> {
    faer::mat![
        [-35.15, 2.83, -1.96, 4.69],
        [7.92, -21.41, 3.24, -8.76],
        [2.68, 4.75, -18.82, 1.54],
        [0.93, -3.16, -2.05, -31.11],
    ]
}

/// Right-hand side to go with [`lab_matrix`].
pub fn lab_rhs() -> Vec<f64> {
    vec![0.39, 5.12, -2.37, 4.88]
}
