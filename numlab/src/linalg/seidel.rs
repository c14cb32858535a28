use faer::Mat;

use super::{
    PIVOT_THRESHOLD, check_finite_matrix, check_finite_vector, check_shape, residual,
};
use crate::{
    SolverError, Trace, Warning, WarningContent,
    config::{check_iteration_limit, check_tolerance},
    function::norm2,
    warnings::lint_diagonal_dominance,
};

/// Settings for [`gauss_seidel`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub struct SeidelConfig {
    /// Stop once no component changes by this much in a sweep.
    pub tolerance: f64,
    /// Sweep cap.
    pub max_iterations: usize,
}

impl Default for SeidelConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            max_iterations: 1000,
        }
    }
}

impl SeidelConfig {
    /// Change the tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Change the sweep cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Check the settings are usable.
    pub fn validate(&self) -> Result<(), SolverError> {
        check_tolerance(self.tolerance)?;
        check_iteration_limit(self.max_iterations)
    }
}

/// Result of [`gauss_seidel`].
#[derive(Debug, Clone)]
pub struct SeidelOutcome {
    pub(crate) x: Vec<f64>,
    pub(crate) sweeps: usize,
    pub(crate) max_difference: f64,
    pub(crate) converged: bool,
    pub(crate) residual: Vec<f64>,
    pub(crate) residual_norm: f64,
    pub(crate) warnings: Vec<Warning>,
    pub(crate) trace: Trace<Vec<f64>>,
}

impl SeidelOutcome {
    /// The final iterate.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// How many sweeps were made.
    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    /// Largest change of any component in the last sweep.
    pub fn final_measure(&self) -> f64 {
        self.max_difference
    }

    /// False if the sweep cap was hit first.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// A·x − b, elementwise.
    pub fn residual(&self) -> &[f64] {
        &self.residual
    }

    /// ‖A·x − b‖₂
    pub fn residual_norm(&self) -> f64 {
        self.residual_norm
    }

    /// Diagonal dominance problems, and the cap if it was hit.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// The iterate after each sweep, measured by its largest change.
    pub fn trace(&self) -> &Trace<Vec<f64>> {
        &self.trace
    }
}

/// Solve A·x = b by Gauss-Seidel iteration, starting from zero.
pub fn gauss_seidel(
    a: &Mat<f64>,
    b: &[f64],
    config: SeidelConfig,
) -> Result<SeidelOutcome, SolverError> {
    let zeros = vec![0.0; b.len()];
    gauss_seidel_from(a, b, &zeros, config)
}

/// Solve A·x = b by Gauss-Seidel iteration, starting from `x0`.
///
/// Matrices which aren't strictly diagonally dominant still get solved,
/// but produce a warning per offending row, since the iteration may diverge.
pub fn gauss_seidel_from(
    a: &Mat<f64>,
    b: &[f64],
    x0: &[f64],
    config: SeidelConfig,
) -> Result<SeidelOutcome, SolverError> {
    config.validate()?;
    let n = check_shape(a, b)?;
    if x0.len() != n {
        return Err(SolverError::DimensionMismatch {
            expected: n,
            actual: x0.len(),
        });
    }
    check_finite_matrix(a)?;
    check_finite_vector("b", b)?;
    check_finite_vector("x0", x0)?;
    for i in 0..n {
        let value = a[(i, i)];
        if value.abs() < PIVOT_THRESHOLD {
            return Err(SolverError::SingularMatrix { pivot: i, value });
        }
    }
    let mut warnings = lint_diagonal_dominance(a);

    let mut x = x0.to_vec();
    let mut trace = Trace::with_capacity(32);
    let mut sweeps = 0;
    let mut max_difference = f64::INFINITY;
    let mut converged = false;
    while sweeps < config.max_iterations {
        sweeps += 1;
        max_difference = 0.0;
        for i in 0..n {
            // Components before i already hold this sweep's values.
            let sum: f64 = (0..n).filter(|&j| j != i).map(|j| a[(i, j)] * x[j]).sum();
            let updated = (b[i] - sum) / a[(i, i)];
            if !updated.is_finite() {
                return Err(SolverError::NonFiniteValue {
                    at: x,
                    value: updated,
                });
            }
            max_difference = libm::fmax(max_difference, (updated - x[i]).abs());
            x[i] = updated;
        }
        trace.record(x.clone(), max_difference);
        if !max_difference.is_finite() {
            return Err(SolverError::NonFiniteValue {
                at: x,
                value: max_difference,
            });
        }
        if max_difference < config.tolerance {
            converged = true;
            break;
        }
    }
    if !converged {
        warnings.push(Warning::from(WarningContent::IterationLimitReached {
            limit: config.max_iterations,
        }));
    }

    let residual = residual(a, &x, b)?;
    let residual_norm = norm2(&residual);
    Ok(SeidelOutcome {
        x,
        sweeps,
        max_difference,
        converged,
        residual,
        residual_norm,
        warnings,
        trace,
    })
}

#[cfg(test)]
mod tests {
    use faer::mat;

    use super::*;
    use crate::problems::{lab_matrix, lab_rhs};

    #[test]
    fn converges_on_the_lab_system() {
        let outcome = gauss_seidel(&lab_matrix(), &lab_rhs(), SeidelConfig::default()).unwrap();
        assert!(outcome.converged());
        assert!(outcome.warnings().is_empty());
        assert!(outcome.final_measure() < 1e-4);
        assert!(outcome.residual_norm() < 1e-2);
        assert_eq!(outcome.trace().len(), outcome.sweeps());
    }

    #[test]
    fn reuses_updated_components_within_a_sweep() {
        // After one sweep from zero: x0 = 1/2, then x1 = (1 - 1·x0)/2 = 1/4.
        // Jacobi would give x1 = 1/2.
        let a = mat![[2.0, 1.0], [1.0, 2.0f64]];
        let config = SeidelConfig::default().with_max_iterations(1);
        let outcome = gauss_seidel(&a, &[1.0, 1.0], config).unwrap();
        assert_eq!(outcome.trace().records()[0].step, vec![0.5, 0.25]);
    }

    #[test]
    fn warns_but_still_solves_without_dominance() {
        // Symmetric positive definite, so Gauss-Seidel converges anyway.
        let a = mat![[1.0, 0.9], [0.9, 1.0f64]];
        let outcome = gauss_seidel(
            &a,
            &[1.9, 1.9],
            SeidelConfig::default().with_tolerance(1e-10),
        )
        .unwrap();
        assert_eq!(outcome.warnings().len(), 2);
        assert!(matches!(
            outcome.warnings()[0].content,
            WarningContent::NotDiagonallyDominant { row: 0, .. }
        ));
        assert!((outcome.x()[0] - 1.0).abs() < 1e-8);
        assert!((outcome.x()[1] - 1.0).abs() < 1e-8);
    }

    #[test]
    fn zero_diagonal_is_singular() {
        let a = mat![[1.0, 2.0], [3.0, 0.0f64]];
        let err = gauss_seidel(&a, &[1.0, 1.0], SeidelConfig::default()).unwrap_err();
        assert_eq!(err, SolverError::SingularMatrix { pivot: 1, value: 0.0 });
    }

    #[test]
    fn divergence_is_capped() {
        let a = mat![[1.0, 3.0], [3.0, 1.0f64]];
        let config = SeidelConfig::default().with_max_iterations(10);
        let outcome = gauss_seidel(&a, &[1.0, 1.0], config).unwrap();
        assert!(!outcome.converged());
        assert!(
            outcome
                .warnings()
                .iter()
                .any(|w| w.content == WarningContent::IterationLimitReached { limit: 10 })
        );
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let a = lab_matrix();
        let config = SeidelConfig::default();
        for bad in [f64::NAN, f64::INFINITY] {
            let mut b = lab_rhs();
            b[0] = bad;
            assert!(matches!(
                gauss_seidel(&a, &b, config),
                Err(SolverError::NonFiniteEntry { operand: "b", row: 0, col: 0, .. })
            ));

            let mut a = lab_matrix();
            a[(3, 0)] = bad;
            assert!(matches!(
                gauss_seidel(&a, &lab_rhs(), config),
                Err(SolverError::NonFiniteEntry { operand: "A", row: 3, col: 0, .. })
            ));
        }
        assert!(matches!(
            gauss_seidel_from(&a, &lab_rhs(), &[0.0, f64::NAN, 0.0, 0.0], config),
            Err(SolverError::NonFiniteEntry { operand: "x0", row: 1, .. })
        ));
    }

    #[test]
    fn overflow_while_diverging_is_an_error() {
        // Each sweep multiplies the iterate by about 9, so it overflows long before the cap.
        let a = mat![[1.0, 3.0], [3.0, 1.0f64]];
        let config = SeidelConfig::default().with_max_iterations(10_000);
        let err = gauss_seidel(&a, &[1.0, 1.0], config).unwrap_err();
        assert!(matches!(err, SolverError::NonFiniteValue { .. }), "{err}");
    }

    #[test]
    fn starts_from_the_given_guess() {
        let a = lab_matrix();
        let b = lab_rhs();
        let exact = crate::linalg::lu_solve(&a, &b).unwrap();
        let outcome = gauss_seidel_from(&a, &b, exact.x(), SeidelConfig::default()).unwrap();
        assert_eq!(outcome.sweeps(), 1);
    }
}
