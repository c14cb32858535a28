use crate::{
    BivariateFunction, EvalError, ScalarFunction, SolverError, Trace, Warning, WarningContent,
    config::{check_iteration_limit, check_tolerance},
    function::eval2_checked,
    scalar::{BracketConfig, GoldenConfig, minimize},
};

/// Step for the central-difference gradient reported at the end.
const GRADIENT_STEP: f64 = 1e-6;

/// Settings for [`coordinate_descent`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub struct DescentConfig {
    /// Stop once a full round moves the point less than this.
    pub tolerance: f64,
    /// Cap on full rounds (one x search plus one y search each).
    pub max_iterations: usize,
    /// Bracketing for each line search.
    pub bracket: BracketConfig,
    /// Golden-section search for each line search.
    pub golden: GoldenConfig,
}

impl Default for DescentConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            max_iterations: 500,
            bracket: BracketConfig {
                initial_step: 0.1,
                expansion: 1.8,
                max_expansions: 80,
            },
            golden: GoldenConfig {
                tolerance: 1e-8,
                max_iterations: 200,
            },
        }
    }
}

impl DescentConfig {
    /// Change the tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Change the cap on rounds.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Check the settings are usable, including the line search settings.
    pub fn validate(&self) -> Result<(), SolverError> {
        check_tolerance(self.tolerance)?;
        check_iteration_limit(self.max_iterations)?;
        self.bracket.validate()?;
        self.golden.validate()
    }
}

/// The point after one round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescentStep {
    /// x after the round.
    pub x: f64,
    /// y after the round.
    pub y: f64,
    /// Φ(x, y)
    pub value: f64,
}

/// Result of [`coordinate_descent`].
#[derive(Debug, Clone)]
pub struct DescentOutcome {
    pub(crate) point: [f64; 2],
    pub(crate) value: f64,
    pub(crate) gradient: [f64; 2],
    pub(crate) iterations: usize,
    pub(crate) delta: f64,
    pub(crate) converged: bool,
    pub(crate) warnings: Vec<Warning>,
    pub(crate) trace: Trace<DescentStep>,
}

impl DescentOutcome {
    /// Where the search ended.
    pub fn point(&self) -> [f64; 2] {
        self.point
    }

    /// Φ at that point.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Numeric gradient of Φ at that point. Should be near zero.
    pub fn gradient(&self) -> [f64; 2] {
        self.gradient
    }

    /// How many rounds were made.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// How far the last round moved the point.
    pub fn final_measure(&self) -> f64 {
        self.delta
    }

    /// False if the cap was hit first.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Anything the caller should know about.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Every round, in order.
    pub fn trace(&self) -> &Trace<DescentStep> {
        &self.trace
    }
}

/// Φ along one axis, with the other coordinate frozen.
struct Slice<'f, F: ?Sized> {
    f: &'f F,
    axis: Axis,
    frozen: f64,
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

impl<F> ScalarFunction for Slice<'_, F>
where
    F: BivariateFunction + ?Sized,
{
    fn eval(&self, t: f64) -> Result<f64, EvalError> {
        match self.axis {
            Axis::X => self.f.eval(t, self.frozen),
            Axis::Y => self.f.eval(self.frozen, t),
        }
    }
}

/// Minimize Φ(x, y) by alternating line searches along x and y.
pub fn coordinate_descent<F>(
    f: &F,
    start: [f64; 2],
    config: DescentConfig,
) -> Result<DescentOutcome, SolverError>
where
    F: BivariateFunction + ?Sized,
{
    config.validate()?;
    let [mut x, mut y] = start;
    eval2_checked(f, x, y)?;

    let mut trace = Trace::with_capacity(64);
    let mut warnings = Vec::new();
    let mut iterations = 0;
    let mut delta = f64::INFINITY;
    let mut converged = false;
    while iterations < config.max_iterations {
        iterations += 1;
        let (x_prev, y_prev) = (x, y);

        let along_x = Slice {
            f,
            axis: Axis::X,
            frozen: y,
        };
        let line = minimize(&along_x, x, config.bracket, config.golden)?;
        x = line.x();
        note(&mut warnings, line.warnings());

        let along_y = Slice {
            f,
            axis: Axis::Y,
            frozen: x,
        };
        let line = minimize(&along_y, y, config.bracket, config.golden)?;
        y = line.x();
        note(&mut warnings, line.warnings());

        delta = (x - x_prev).hypot(y - y_prev);
        trace.record(
            DescentStep {
                x,
                y,
                value: line.value(),
            },
            delta,
        );
        if delta < config.tolerance {
            converged = true;
            break;
        }
    }
    if !converged {
        warnings.push(Warning::from(WarningContent::IterationLimitReached {
            limit: config.max_iterations,
        }));
    }

    let value = eval2_checked(f, x, y)?;
    let h = GRADIENT_STEP;
    let gradient = [
        (eval2_checked(f, x + h, y)? - eval2_checked(f, x - h, y)?) / (2.0 * h),
        (eval2_checked(f, x, y + h)? - eval2_checked(f, x, y - h)?) / (2.0 * h),
    ];
    Ok(DescentOutcome {
        point: [x, y],
        value,
        gradient,
        iterations,
        delta,
        converged,
        warnings,
        trace,
    })
}

/// Keep one copy of each kind of line-search warning, not one per round.
fn note(warnings: &mut Vec<Warning>, new: &[Warning]) {
    for w in new {
        let seen = warnings
            .iter()
            .any(|old| std::mem::discriminant(&old.content) == std::mem::discriminant(&w.content));
        if !seen {
            warnings.push(w.clone());
        }
    }
}
