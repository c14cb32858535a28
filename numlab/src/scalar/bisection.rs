use crate::{
    Interval, ScalarFunction, SolverError, Trace, Warning, WarningContent,
    config::{check_iteration_limit, check_tolerance},
    function::eval_checked,
};

/// Settings for [`bisect`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub struct BisectionConfig {
    /// Stop once half the interval is at most this, or `|f(c)|` drops below it.
    pub tolerance: f64,
    /// Safety valve for tolerances below what f64 can resolve.
    pub max_iterations: usize,
}

impl Default for BisectionConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 200,
        }
    }
}

impl BisectionConfig {
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

    /// Check the settings are usable.
    pub fn validate(&self) -> Result<(), SolverError> {
        check_tolerance(self.tolerance)?;
        check_iteration_limit(self.max_iterations)
    }
}

/// One halving of the bracket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BisectionStep {
    /// Lower end of the bracket after this step.
    pub a: f64,
    /// Upper end of the bracket after this step.
    pub b: f64,
    /// The midpoint that was evaluated.
    pub c: f64,
    /// f(c)
    pub fc: f64,
}

/// Result of [`bisect`].
#[derive(Debug, Clone)]
pub struct BisectionOutcome {
    pub(crate) root: f64,
    pub(crate) value: f64,
    pub(crate) iterations: usize,
    pub(crate) converged: bool,
    pub(crate) warnings: Vec<Warning>,
    pub(crate) trace: Trace<BisectionStep>,
}

impl BisectionOutcome {
    /// Approximate root.
    pub fn root(&self) -> f64 {
        self.root
    }

    /// f(root)
    pub fn value(&self) -> f64 {
        self.value
    }

    /// How many times the bracket was halved.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Width of the final bracket.
    pub fn final_measure(&self) -> f64 {
        self.trace.last().map(|r| r.measure).unwrap_or(0.0)
    }

    /// False if the iteration cap stopped the search.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Anything the caller should know about.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Every halving, in order.
    pub fn trace(&self) -> &Trace<BisectionStep> {
        &self.trace
    }
}

/// Find a root of `f` inside `interval` by repeated halving.
/// `f` must change sign over the interval.
pub fn bisect<F>(
    f: &F,
    interval: Interval,
    config: BisectionConfig,
) -> Result<BisectionOutcome, SolverError>
where
    F: ScalarFunction + ?Sized,
{
    config.validate()?;
    let tol = config.tolerance;
    let (mut a, mut b) = (interval.lo(), interval.hi());
    let mut fa = eval_checked(f, a)?;
    let fb = eval_checked(f, b)?;
    if !opposite_signs(fa, fb) {
        return Err(SolverError::NoSignChange {
            lo: a,
            hi: b,
            f_lo: fa,
            f_hi: fb,
        });
    }

    let mut trace = Trace::with_capacity(64);
    let mut iterations = 0;
    let mut warnings = Vec::new();
    let mut converged = true;
    let mut exact = None;
    while (b - a) / 2.0 > tol {
        if iterations == config.max_iterations {
            converged = false;
            warnings.push(Warning::from(WarningContent::IterationLimitReached {
                limit: config.max_iterations,
            }));
            break;
        }
        iterations += 1;
        let c = (a + b) / 2.0;
        let fc = eval_checked(f, c)?;
        if opposite_signs(fa, fc) {
            b = c;
        } else {
            a = c;
            fa = fc;
        }
        trace.record(BisectionStep { a, b, c, fc }, b - a);
        if fc.abs() < tol {
            exact = Some((c, fc));
            break;
        }
    }

    let (root, value) = match exact {
        Some(hit) => hit,
        None => {
            let root = (a + b) / 2.0;
            (root, eval_checked(f, root)?)
        }
    };
    Ok(BisectionOutcome {
        root,
        value,
        iterations,
        converged,
        warnings,
        trace,
    })
}

/// Strictly opposite signs. Zero has no sign.
fn opposite_signs(a: f64, b: f64) -> bool {
    (a < 0.0 && b > 0.0) || (a > 0.0 && b < 0.0)
}
