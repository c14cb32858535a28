//! The callables every solver consumes.
//!
//! Plain closures work everywhere: `|x: f64| x * x - 2.0` is a [`ScalarFunction`],
//! `|x: f64, y: f64| x * y` is a [`BivariateFunction`]. Functions that can fail
//! (e.g. parsed expressions hitting `log(-1)`) report an [`EvalError`], which the
//! solvers pass through unchanged.

use faer::Mat;

use crate::{EvalError, SolverError};

/// Step used for the numeric Jacobian, scaled by the magnitude of each variable.
const JACOBIAN_STEP: f64 = 1e-7;

/// A real function of one real variable.
pub trait ScalarFunction {
    /// Evaluate the function at `x`.
    fn eval(&self, x: f64) -> Result<f64, EvalError>;
}

impl<F> ScalarFunction for F
where
    F: Fn(f64) -> f64,
{
    fn eval(&self, x: f64) -> Result<f64, EvalError> {
        Ok(self(x))
    }
}

/// A real function of two real variables, e.g. the right-hand side `f(x, y)` of an
/// ODE or a 2D objective.
pub trait BivariateFunction {
    /// Evaluate the function at `(x, y)`.
    fn eval(&self, x: f64, y: f64) -> Result<f64, EvalError>;
}

impl<F> BivariateFunction for F
where
    F: Fn(f64, f64) -> f64,
{
    fn eval(&self, x: f64, y: f64) -> Result<f64, EvalError> {
        Ok(self(x, y))
    }
}

/// Adapts a closure which can fail into a [`ScalarFunction`] or [`BivariateFunction`].
#[derive(Clone, Copy, Debug)]
pub struct Fallible<F>(pub F);

impl<F> ScalarFunction for Fallible<F>
where
    F: Fn(f64) -> Result<f64, EvalError>,
{
    fn eval(&self, x: f64) -> Result<f64, EvalError> {
        (self.0)(x)
    }
}

impl<F> BivariateFunction for Fallible<F>
where
    F: Fn(f64, f64) -> Result<f64, EvalError>,
{
    fn eval(&self, x: f64, y: f64) -> Result<f64, EvalError> {
        (self.0)(x, y)
    }
}

/// A square system of nonlinear equations F(x) = 0.
pub trait NonlinearSystem {
    /// Number of unknowns, which is also the number of equations.
    fn dim(&self) -> usize;

    /// Compute the residual F(x), writing one entry per equation into `out`.
    fn residual(&self, x: &[f64], out: &mut [f64]) -> Result<(), EvalError>;

    /// Write the Jacobian J(x) into `jac` (`dim` × `dim`).
    /// Row i holds the partial derivatives of equation i.
    /// The default uses central differences; override it to supply an analytic Jacobian.
    fn jacobian(&self, x: &[f64], jac: &mut Mat<f64>) -> Result<(), EvalError> {
        numeric_jacobian(self, x, jac)
    }
}

/// A [`NonlinearSystem`] built from a closure, with a numeric Jacobian.
pub struct FnSystem<F> {
    dim: usize,
    f: F,
}

impl<F> FnSystem<F>
where
    F: Fn(&[f64], &mut [f64]),
{
    /// `f(x, out)` must write `dim` residuals into `out`.
    pub fn new(dim: usize, f: F) -> Self {
        Self { dim, f }
    }
}

impl<F> NonlinearSystem for FnSystem<F>
where
    F: Fn(&[f64], &mut [f64]),
{
    fn dim(&self) -> usize {
        self.dim
    }

    fn residual(&self, x: &[f64], out: &mut [f64]) -> Result<(), EvalError> {
        (self.f)(x, out);
        Ok(())
    }
}

/// The least-squares objective Φ(x, y) = Σ Fᵢ(x, y)² of a 2D system.
/// Its minima with Φ = 0 are exactly the roots of the system.
pub struct SumOfSquares<'s, S: ?Sized> {
    system: &'s S,
}

impl<'s, S> SumOfSquares<'s, S>
where
    S: NonlinearSystem + ?Sized,
{
    /// Wrap a system of two equations in two unknowns.
    pub fn new(system: &'s S) -> Result<Self, SolverError> {
        if system.dim() != 2 {
            return Err(SolverError::DimensionMismatch {
                expected: 2,
                actual: system.dim(),
            });
        }
        Ok(Self { system })
    }
}

impl<S> BivariateFunction for SumOfSquares<'_, S>
where
    S: NonlinearSystem + ?Sized,
{
    fn eval(&self, x: f64, y: f64) -> Result<f64, EvalError> {
        let mut out = [0.0; 2];
        self.system.residual(&[x, y], &mut out)?;
        Ok(out.iter().map(|r| r * r).sum())
    }
}

/// Central-difference Jacobian, column by column.
pub fn numeric_jacobian<S>(system: &S, x: &[f64], jac: &mut Mat<f64>) -> Result<(), EvalError>
where
    S: NonlinearSystem + ?Sized,
{
    let n = system.dim();
    let mut probe = x.to_vec();
    let mut plus = vec![0.0; n];
    let mut minus = vec![0.0; n];
    for col in 0..n {
        let h = JACOBIAN_STEP * x[col].abs().max(1.0);
        probe[col] = x[col] + h;
        system.residual(&probe, &mut plus)?;
        probe[col] = x[col] - h;
        system.residual(&probe, &mut minus)?;
        probe[col] = x[col];
        for row in 0..n {
            jac[(row, col)] = (plus[row] - minus[row]) / (2.0 * h);
        }
    }
    Ok(())
}

/// Central first difference (f(x+h) − f(x−h)) / 2h.
pub fn derivative<F>(f: &F, x: f64, h: f64) -> Result<f64, SolverError>
where
    F: ScalarFunction + ?Sized,
{
    let plus = eval_checked(f, x + h)?;
    let minus = eval_checked(f, x - h)?;
    Ok((plus - minus) / (2.0 * h))
}

/// Central second difference (f(x+h) − 2f(x) + f(x−h)) / h².
pub fn second_derivative<F>(f: &F, x: f64, h: f64) -> Result<f64, SolverError>
where
    F: ScalarFunction + ?Sized,
{
    let center = eval_checked(f, x)?;
    let plus = eval_checked(f, x + h)?;
    let minus = eval_checked(f, x - h)?;
    Ok((plus - 2.0 * center + minus) / (h * h))
}

/// Evaluate, turning NaN or infinite values into an error.
pub(crate) fn eval_checked<F>(f: &F, x: f64) -> Result<f64, SolverError>
where
    F: ScalarFunction + ?Sized,
{
    let value = f.eval(x)?;
    if !value.is_finite() {
        return Err(SolverError::NonFiniteValue { at: vec![x], value });
    }
    Ok(value)
}

/// Like [`eval_checked`] for functions of two variables.
pub(crate) fn eval2_checked<F>(f: &F, x: f64, y: f64) -> Result<f64, SolverError>
where
    F: BivariateFunction + ?Sized,
{
    let value = f.eval(x, y)?;
    if !value.is_finite() {
        return Err(SolverError::NonFiniteValue {
            at: vec![x, y],
            value,
        });
    }
    Ok(value)
}

/// Residual of a system, rejecting NaN or infinite entries.
pub(crate) fn residual_checked<S>(system: &S, x: &[f64], out: &mut [f64]) -> Result<(), SolverError>
where
    S: NonlinearSystem + ?Sized,
{
    system.residual(x, out)?;
    if let Some(value) = out.iter().copied().find(|v| !v.is_finite()) {
        return Err(SolverError::NonFiniteValue {
            at: x.to_vec(),
            value,
        });
    }
    Ok(())
}

/// Euclidean norm.
pub(crate) fn norm2(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}
