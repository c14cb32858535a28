use crate::{
    Interval, ScalarFunction, SolverError, Trace, Warning, WarningContent,
    config::{check_iteration_limit, check_tolerance},
    function::{derivative, eval_checked, second_derivative},
};

use super::golden::INV_PHI;

/// Below this the three points are (nearly) collinear and the parabola has no vertex.
const DEGENERATE_DENOMINATOR: f64 = 1e-12;
/// Step for the central first difference at the extremum.
const FIRST_DERIVATIVE_STEP: f64 = 1e-8;
/// Step for the central second difference at the extremum.
const SECOND_DERIVATIVE_STEP: f64 = 1e-5;
/// A second derivative smaller than this can't be told apart from zero.
const CURVATURE_THRESHOLD: f64 = 1e-4;

/// Which kind of extremum to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub enum Goal {
    /// Look for the lowest point.
    #[default]
    Minimum,
    /// Look for the highest point.
    Maximum,
}

/// What the numeric second derivative says about the point that was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremumKind {
    /// f'' > 0
    Minimum,
    /// f'' < 0
    Maximum,
    /// f'' is too close to zero to tell.
    Unclassified,
}

impl std::fmt::Display for ExtremumKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExtremumKind::Minimum => "minimum",
            ExtremumKind::Maximum => "maximum",
            ExtremumKind::Unclassified => "unclassified",
        };
        f.write_str(s)
    }
}

/// Settings for [`parabolic`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub struct ParabolicConfig {
    /// Stop once `x3 − x1` is below this, or two successive estimates agree to within it.
    pub tolerance: f64,
    /// Iteration cap.
    pub max_iterations: usize,
}

impl Default for ParabolicConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 1000,
        }
    }
}

impl ParabolicConfig {
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

/// One quadratic fit and the bracket it produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParabolicStep {
    /// Left point after the update.
    pub x1: f64,
    /// Middle point after the update.
    pub x2: f64,
    /// Right point after the update.
    pub x3: f64,
    /// The new point this step evaluated.
    pub x_new: f64,
    /// f(x_new), in terms of the original function.
    pub f_new: f64,
    /// The parabola was unusable and a golden-section-like step was taken instead.
    pub fallback: bool,
}

/// Result of [`parabolic`].
#[derive(Debug, Clone)]
pub struct ParabolicOutcome {
    pub(crate) x: f64,
    pub(crate) value: f64,
    pub(crate) first_derivative: f64,
    pub(crate) second_derivative: f64,
    pub(crate) kind: ExtremumKind,
    pub(crate) iterations: usize,
    pub(crate) width: f64,
    pub(crate) converged: bool,
    pub(crate) warnings: Vec<Warning>,
    pub(crate) trace: Trace<ParabolicStep>,
}

impl ParabolicOutcome {
    /// Location of the extremum.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// f(x)
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Numeric f'(x). Should be near zero.
    pub fn first_derivative(&self) -> f64 {
        self.first_derivative
    }

    /// Numeric f''(x), which decides [`Self::kind`].
    pub fn second_derivative(&self) -> f64 {
        self.second_derivative
    }

    /// Minimum or maximum, judged by the sign of f''.
    pub fn kind(&self) -> ExtremumKind {
        self.kind
    }

    /// How many quadratic fits were made.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Final `x3 − x1`.
    pub fn final_measure(&self) -> f64 {
        self.width
    }

    /// False if the iteration cap (or f64 resolution) stopped the search.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Anything the caller should know about.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Every fit, in order.
    pub fn trace(&self) -> &Trace<ParabolicStep> {
        &self.trace
    }
}

/// Like [`parabolic`], starting from the ends and midpoint of `interval`.
pub fn parabolic_in<F>(
    f: &F,
    interval: Interval,
    goal: Goal,
    config: ParabolicConfig,
) -> Result<ParabolicOutcome, SolverError>
where
    F: ScalarFunction + ?Sized,
{
    parabolic(
        f,
        [interval.lo(), interval.midpoint(), interval.hi()],
        goal,
        config,
    )
}

/// Find an extremum of `f` by successive quadratic interpolation,
/// starting from three points `x1 < x2 < x3` around it.
pub fn parabolic<F>(
    f: &F,
    points: [f64; 3],
    goal: Goal,
    config: ParabolicConfig,
) -> Result<ParabolicOutcome, SolverError>
where
    F: ScalarFunction + ?Sized,
{
    config.validate()?;
    let [mut x1, mut x2, mut x3] = points;
    Interval::new(x1, x2)?;
    Interval::new(x2, x3)?;
    let tol = config.tolerance;

    // Searching for a maximum is searching for the minimum of -f.
    let sign = match goal {
        Goal::Minimum => 1.0,
        Goal::Maximum => -1.0,
    };
    let g = |x: f64| eval_checked(f, x).map(|v| sign * v);
    let (mut g1, mut g2, mut g3) = (g(x1)?, g(x2)?, g(x3)?);

    let mut trace = Trace::with_capacity(16);
    let mut iterations = 0;
    let mut warnings = Vec::new();
    let mut converged = true;
    while x3 - x1 >= tol {
        if iterations == config.max_iterations {
            converged = false;
            warnings.push(Warning::from(WarningContent::IterationLimitReached {
                limit: config.max_iterations,
            }));
            break;
        }
        iterations += 1;

        let (x_new, fallback) = next_point(x1, x2, x3, g1, g2, g3, tol);
        let vertex_agrees = !fallback && (x_new - x2).abs() < tol;
        if !vertex_agrees && (x_new <= x1 || x_new >= x3 || x_new == x2) {
            // The bracket is narrower than f64 can split.
            converged = false;
            iterations -= 1;
            break;
        }
        let g_new = g(x_new)?;

        if vertex_agrees {
            if g_new < g2 {
                (x2, g2) = (x_new, g_new);
            }
        } else if x_new < x2 {
            if g_new < g2 {
                (x3, g3) = (x2, g2);
                (x2, g2) = (x_new, g_new);
            } else {
                (x1, g1) = (x_new, g_new);
            }
        } else if g_new < g2 {
            (x1, g1) = (x2, g2);
            (x2, g2) = (x_new, g_new);
        } else {
            (x3, g3) = (x_new, g_new);
        }
        trace.record(
            ParabolicStep {
                x1,
                x2,
                x3,
                x_new,
                f_new: sign * g_new,
                fallback,
            },
            x3 - x1,
        );
        if vertex_agrees {
            break;
        }
    }

    let x = x2;
    let first_derivative = derivative(f, x, FIRST_DERIVATIVE_STEP)?;
    let second_derivative = second_derivative(f, x, SECOND_DERIVATIVE_STEP)?;
    let kind = if second_derivative > CURVATURE_THRESHOLD {
        ExtremumKind::Minimum
    } else if second_derivative < -CURVATURE_THRESHOLD {
        ExtremumKind::Maximum
    } else {
        ExtremumKind::Unclassified
    };
    Ok(ParabolicOutcome {
        x,
        value: sign * g2,
        first_derivative,
        second_derivative,
        kind,
        iterations,
        width: x3 - x1,
        converged,
        warnings,
        trace,
    })
}

/// Vertex of the parabola through the three points, or a safe substitute.
/// Returns the point and whether it is a substitute.
fn next_point(x1: f64, x2: f64, x3: f64, g1: f64, g2: f64, g3: f64, tol: f64) -> (f64, bool) {
    let denominator = 2.0 * ((x2 - x1) * (g3 - g1) - (x3 - x1) * (g2 - g1));
    if denominator.abs() < DEGENERATE_DENOMINATOR {
        return (golden_step(x1, x2, x3), true);
    }
    let numerator = (x2 - x1).powi(2) * (g3 - g1) - (x3 - x1).powi(2) * (g2 - g1);
    let vertex = x1 + numerator / denominator;
    if vertex > x1 && vertex < x3 {
        return (vertex, false);
    }
    let midpoint = (x1 + x3) / 2.0;
    if (midpoint - x2).abs() < tol {
        (golden_step(x1, x2, x3), true)
    } else {
        (midpoint, true)
    }
}

/// Step from x2 into the larger of its two neighbouring gaps.
fn golden_step(x1: f64, x2: f64, x3: f64) -> f64 {
    let fraction = 1.0 - INV_PHI;
    if x3 - x2 > x2 - x1 {
        x2 + fraction * (x3 - x2)
    } else {
        x2 - fraction * (x2 - x1)
    }
}
