use faer::Mat;

use crate::{
    NonlinearSystem, SolverError, Trace, Warning, WarningContent,
    config::{check_iteration_limit, check_tolerance},
    function::{norm2, residual_checked},
    linalg::lu_decompose,
};

/// Determinants smaller than this make the 2×2 Jacobian singular.
const DETERMINANT_THRESHOLD: f64 = 1e-12;

/// How each Newton step solves J·Δ = F.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub enum StepSolver {
    /// LU decomposition, for systems of any size.
    #[default]
    Lu,
    /// Closed-form inverse of a 2×2 matrix. Only for two equations.
    Inverse2x2,
}

/// Settings for [`newton`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub struct NewtonConfig {
    /// Stop once the step ‖Δ‖₂ is below this.
    pub tolerance: f64,
    /// Iteration cap.
    pub max_iterations: usize,
    /// How to solve for each step.
    pub step_solver: StepSolver,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 50,
            step_solver: StepSolver::default(),
        }
    }
}

impl NewtonConfig {
    /// Change the tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Change the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Change how the linear step is solved.
    pub fn with_step_solver(mut self, step_solver: StepSolver) -> Self {
        self.step_solver = step_solver;
        self
    }

    /// Check the settings are usable.
    pub fn validate(&self) -> Result<(), SolverError> {
        check_tolerance(self.tolerance)?;
        check_iteration_limit(self.max_iterations)
    }
}

/// One Newton update.
#[derive(Debug, Clone, PartialEq)]
pub struct NewtonStep {
    /// The iterate after the update.
    pub x: Vec<f64>,
    /// ‖F‖₂ at the point the update started from.
    pub residual_norm: f64,
}

/// Result of [`newton`].
#[derive(Debug, Clone)]
pub struct NewtonOutcome {
    pub(crate) x: Vec<f64>,
    pub(crate) iterations: usize,
    pub(crate) residual: Vec<f64>,
    pub(crate) residual_norm: f64,
    pub(crate) step_norm: f64,
    pub(crate) converged: bool,
    pub(crate) warnings: Vec<Warning>,
    pub(crate) trace: Trace<NewtonStep>,
}

impl NewtonOutcome {
    /// The solution.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Number of Newton updates applied, including the one whose size met the tolerance.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// F(x)
    pub fn residual(&self) -> &[f64] {
        &self.residual
    }

    /// ‖F(x)‖₂
    pub fn residual_norm(&self) -> f64 {
        self.residual_norm
    }

    /// ‖Δ‖₂ of the last update.
    pub fn final_measure(&self) -> f64 {
        self.step_norm
    }

    /// False if the cap was hit first.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Anything the caller should know about.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Every update, in order.
    pub fn trace(&self) -> &Trace<NewtonStep> {
        &self.trace
    }
}

/// Solve F(x) = 0 by Newton's method from `x0`.
/// Each iteration solves J(x)·Δ = F(x) and moves to x − Δ.
pub fn newton<S>(system: &S, x0: &[f64], config: NewtonConfig) -> Result<NewtonOutcome, SolverError>
where
    S: NonlinearSystem + ?Sized,
{
    config.validate()?;
    let n = system.dim();
    if n == 0 {
        return Err(SolverError::EmptySystem);
    }
    if x0.len() != n {
        return Err(SolverError::DimensionMismatch {
            expected: n,
            actual: x0.len(),
        });
    }
    if config.step_solver == StepSolver::Inverse2x2 && n != 2 {
        return Err(SolverError::DimensionMismatch {
            expected: 2,
            actual: n,
        });
    }

    let mut x = x0.to_vec();
    let mut f = vec![0.0; n];
    let mut jac = Mat::<f64>::zeros(n, n);
    let mut trace = Trace::with_capacity(8);
    let mut iterations = 0;
    let mut step_norm = f64::INFINITY;
    let mut converged = false;
    while iterations < config.max_iterations {
        residual_checked(system, &x, &mut f)?;
        system.jacobian(&x, &mut jac)?;
        iterations += 1;
        let delta = match config.step_solver {
            StepSolver::Lu => solve_lu(&jac, &f, iterations)?,
            StepSolver::Inverse2x2 => solve_2x2(&jac, &f, iterations)?,
        };
        for (xi, di) in x.iter_mut().zip(&delta) {
            *xi -= di;
        }
        step_norm = norm2(&delta);
        trace.record(
            NewtonStep {
                x: x.clone(),
                residual_norm: norm2(&f),
            },
            step_norm,
        );
        if step_norm < config.tolerance {
            converged = true;
            break;
        }
    }
    let mut warnings = Vec::new();
    if !converged {
        warnings.push(Warning::from(WarningContent::IterationLimitReached {
            limit: config.max_iterations,
        }));
    }

    residual_checked(system, &x, &mut f)?;
    let residual_norm = norm2(&f);
    Ok(NewtonOutcome {
        x,
        iterations,
        residual: f,
        residual_norm,
        step_norm,
        converged,
        warnings,
        trace,
    })
}

fn solve_lu(jac: &Mat<f64>, f: &[f64], iteration: usize) -> Result<Vec<f64>, SolverError> {
    let lu = lu_decompose(jac).map_err(|e| match e {
        SolverError::SingularMatrix { value, .. } => {
            SolverError::SingularJacobian { iteration, value }
        }
        other => other,
    })?;
    lu.solve(f)
}

fn solve_2x2(jac: &Mat<f64>, f: &[f64], iteration: usize) -> Result<Vec<f64>, SolverError> {
    let (a, b, c, d) = (jac[(0, 0)], jac[(0, 1)], jac[(1, 0)], jac[(1, 1)]);
    let det = a * d - b * c;
    if det.abs() < DETERMINANT_THRESHOLD {
        return Err(SolverError::SingularJacobian {
            iteration,
            value: det,
        });
    }
    Ok(vec![
        (d * f[0] - b * f[1]) / det,
        (-c * f[0] + a * f[1]) / det,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FnSystem, problems::LabSystem};

    #[test]
    fn solves_the_lab_system() {
        let outcome = newton(&LabSystem, &[0.5, 0.5], NewtonConfig::default()).unwrap();
        assert!(outcome.converged());
        assert!(outcome.residual_norm() < 1e-6);
        assert!(outcome.iterations() < 50);
        assert!((outcome.x()[0] + 1.758098).abs() < 1e-5);
        assert!((outcome.x()[1] - 1.902875).abs() < 1e-5);
        assert_eq!(outcome.iterations(), outcome.trace().len());
        assert!(outcome.final_measure() < 1e-6);
    }

    #[test]
    fn both_step_solvers_agree() {
        let lu = newton(&LabSystem, &[0.5, 0.5], NewtonConfig::default()).unwrap();
        let closed_form = newton(
            &LabSystem,
            &[0.5, 0.5],
            NewtonConfig::default().with_step_solver(StepSolver::Inverse2x2),
        )
        .unwrap();
        assert_eq!(lu.iterations(), closed_form.iterations());
        for (a, b) in lu.x().iter().zip(closed_form.x()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn numeric_jacobian_is_an_equivalent_variant() {
        let numeric = FnSystem::new(2, |x: &[f64], out: &mut [f64]| {
            LabSystem.residual(x, out).unwrap();
        });
        let outcome = newton(&numeric, &[0.5, 0.5], NewtonConfig::default()).unwrap();
        assert!((outcome.x()[0] + 1.758098).abs() < 1e-5);
        assert!((outcome.x()[1] - 1.902875).abs() < 1e-5);
    }

    #[test]
    fn three_unknowns() {
        // x² = 4, y = 2x, z = x + y, solved from near the positive root.
        let system = FnSystem::new(3, |x: &[f64], out: &mut [f64]| {
            out[0] = x[0] * x[0] - 4.0;
            out[1] = x[1] - 2.0 * x[0];
            out[2] = x[2] - x[0] - x[1];
        });
        let outcome = newton(&system, &[1.0, 0.0, 0.0], NewtonConfig::default()).unwrap();
        let expected = [2.0, 4.0, 6.0];
        for (got, want) in outcome.x().iter().zip(expected) {
            assert!((got - want).abs() < 1e-9);
        }
    }

    #[test]
    fn singular_jacobian_names_the_iteration() {
        // Both equations depend only on x + y, so J is singular everywhere.
        let system = FnSystem::new(2, |x: &[f64], out: &mut [f64]| {
            out[0] = x[0] + x[1] - 1.0;
            out[1] = 2.0 * (x[0] + x[1]) - 2.0;
        });
        let err = newton(&system, &[0.0, 0.0], NewtonConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            SolverError::SingularJacobian { iteration: 1, .. }
        ));
        let err = newton(
            &system,
            &[0.0, 0.0],
            NewtonConfig::default().with_step_solver(StepSolver::Inverse2x2),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SolverError::SingularJacobian { iteration: 1, .. }
        ));
    }

    #[test]
    fn wrong_starting_dimension() {
        let err = newton(&LabSystem, &[0.5], NewtonConfig::default()).unwrap_err();
        assert_eq!(
            err,
            SolverError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn capped_runs_warn() {
        let outcome = newton(
            &LabSystem,
            &[0.5, 0.5],
            NewtonConfig::default().with_max_iterations(2),
        )
        .unwrap();
        assert!(!outcome.converged());
        assert_eq!(outcome.iterations(), 2);
        assert_eq!(outcome.warnings().len(), 1);
    }
}
