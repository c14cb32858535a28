use crate::{
    Interval, ScalarFunction, SolverError, Trace, Warning, WarningContent,
    config::{check_iteration_limit, check_step, check_tolerance},
    function::eval_checked,
};

/// (√5 − 1) / 2, the fraction of the bracket each golden-section step keeps.
pub(crate) const INV_PHI: f64 = 0.618_033_988_749_894_8;

/// Settings for [`bracket`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub struct BracketConfig {
    /// First probe distance from the starting point.
    pub initial_step: f64,
    /// Each walk step is this many times longer than the last. Must exceed 1.
    pub expansion: f64,
    /// Give up walking after this many expansions.
    pub max_expansions: usize,
}

impl Default for BracketConfig {
    fn default() -> Self {
        Self {
            initial_step: 0.1,
            expansion: 2.0,
            max_expansions: 50,
        }
    }
}

impl BracketConfig {
    /// Change the first probe distance.
    pub fn with_initial_step(mut self, initial_step: f64) -> Self {
        self.initial_step = initial_step;
        self
    }

    /// Change the growth factor.
    pub fn with_expansion(mut self, expansion: f64) -> Self {
        self.expansion = expansion;
        self
    }

    /// Change how far the walk may go.
    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    /// Check the settings are usable.
    pub fn validate(&self) -> Result<(), SolverError> {
        check_step(self.initial_step)?;
        if !(self.expansion > 1.0 && self.expansion.is_finite()) {
            return Err(SolverError::InvalidExpansion {
                factor: self.expansion,
            });
        }
        Ok(())
    }
}

/// Three points `a < b < c` where the middle one is lowest.
/// If `exhausted` is set, the walk ran out of expansions while still going downhill,
/// and `b` is merely the lowest point seen so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    /// Left point.
    pub a: f64,
    /// Middle (lowest) point.
    pub b: f64,
    /// Right point.
    pub c: f64,
    /// f(a)
    pub fa: f64,
    /// f(b)
    pub fb: f64,
    /// f(c)
    pub fc: f64,
    /// How many times the walk grew its step.
    pub expansions: usize,
    /// Did the walk give up?
    pub exhausted: bool,
}

impl Bracket {
    /// The outer points as an interval for golden-section search.
    pub fn interval(&self) -> Result<Interval, SolverError> {
        Interval::new(self.a, self.c)
    }
}

/// Walk downhill from `x0` until the function rises, giving a bracket around a minimum.
pub fn bracket<F>(f: &F, x0: f64, config: BracketConfig) -> Result<Bracket, SolverError>
where
    F: ScalarFunction + ?Sized,
{
    config.validate()?;
    let mut step = config.initial_step;
    let f0 = eval_checked(f, x0)?;
    let forward = x0 + step;
    let f_forward = eval_checked(f, forward)?;
    let direction = if f_forward < f0 {
        1.0
    } else {
        let backward = x0 - step;
        let f_backward = eval_checked(f, backward)?;
        if f_backward < f0 {
            -1.0
        } else {
            // Both neighbours are at least as high, so x0 is already bracketed.
            return Ok(Bracket {
                a: backward,
                b: x0,
                c: forward,
                fa: f_backward,
                fb: f0,
                fc: f_forward,
                expansions: 0,
                exhausted: false,
            });
        }
    };

    // (prev, mid) walk downhill; `next` probes one expanded step beyond `mid`.
    let (mut prev, mut f_prev) = (x0, f0);
    let mut mid = x0 + direction * step;
    let mut f_mid = eval_checked(f, mid)?;
    let mut expansions = 0;
    let mut exhausted = false;
    let (next, f_next) = loop {
        step *= config.expansion;
        let next = mid + direction * step;
        let f_next = eval_checked(f, next)?;
        expansions += 1;
        if f_next >= f_mid {
            break (next, f_next);
        }
        if expansions >= config.max_expansions {
            exhausted = true;
            break (next, f_next);
        }
        (prev, f_prev) = (mid, f_mid);
        (mid, f_mid) = (next, f_next);
    };
    let (mut a, mut fa, mut c, mut fc) = (prev, f_prev, next, f_next);
    if a > c {
        std::mem::swap(&mut a, &mut c);
        std::mem::swap(&mut fa, &mut fc);
    }
    Ok(Bracket {
        a,
        b: mid,
        c,
        fa,
        fb: f_mid,
        fc,
        expansions,
        exhausted,
    })
}

/// Settings for [`golden_section`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub struct GoldenConfig {
    /// Stop once the bracket is at most this wide.
    pub tolerance: f64,
    /// Iteration cap.
    pub max_iterations: usize,
}

impl Default for GoldenConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 200,
        }
    }
}

impl GoldenConfig {
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

/// State of the bracket after one golden-section step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoldenStep {
    /// Left end.
    pub a: f64,
    /// Right end.
    pub b: f64,
    /// Left interior point.
    pub x1: f64,
    /// Right interior point.
    pub x2: f64,
    /// f(x1)
    pub f1: f64,
    /// f(x2)
    pub f2: f64,
}

/// Result of [`golden_section`].
#[derive(Debug, Clone)]
pub struct GoldenOutcome {
    pub(crate) x: f64,
    pub(crate) value: f64,
    pub(crate) iterations: usize,
    pub(crate) width: f64,
    pub(crate) converged: bool,
    pub(crate) warnings: Vec<Warning>,
    pub(crate) trace: Trace<GoldenStep>,
}

impl GoldenOutcome {
    /// Location of the minimum: the midpoint of the final bracket.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// f(x)
    pub fn value(&self) -> f64 {
        self.value
    }

    /// How many times the bracket shrank.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Width of the final bracket.
    pub fn final_measure(&self) -> f64 {
        self.width
    }

    /// False if the iteration cap stopped the search.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Anything the caller should know about.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Every step, in order.
    pub fn trace(&self) -> &Trace<GoldenStep> {
        &self.trace
    }
}

/// Minimize a unimodal `f` over `interval` by golden-section search.
/// Each step reuses one of the previous interior evaluations.
pub fn golden_section<F>(
    f: &F,
    interval: Interval,
    config: GoldenConfig,
) -> Result<GoldenOutcome, SolverError>
where
    F: ScalarFunction + ?Sized,
{
    config.validate()?;
    let (mut a, mut b) = (interval.lo(), interval.hi());
    let mut x1 = b - INV_PHI * (b - a);
    let mut x2 = a + INV_PHI * (b - a);
    let mut f1 = eval_checked(f, x1)?;
    let mut f2 = eval_checked(f, x2)?;

    let mut trace = Trace::with_capacity(64);
    let mut iterations = 0;
    let mut warnings = Vec::new();
    let mut converged = true;
    while b - a > config.tolerance {
        if iterations == config.max_iterations {
            converged = false;
            warnings.push(Warning::from(WarningContent::IterationLimitReached {
                limit: config.max_iterations,
            }));
            break;
        }
        iterations += 1;
        if f1 < f2 {
            b = x2;
            (x2, f2) = (x1, f1);
            x1 = b - INV_PHI * (b - a);
            f1 = eval_checked(f, x1)?;
        } else {
            a = x1;
            (x1, f1) = (x2, f2);
            x2 = a + INV_PHI * (b - a);
            f2 = eval_checked(f, x2)?;
        }
        trace.record(GoldenStep { a, b, x1, x2, f1, f2 }, b - a);
    }

    let x = (a + b) / 2.0;
    Ok(GoldenOutcome {
        x,
        value: eval_checked(f, x)?,
        iterations,
        width: b - a,
        converged,
        warnings,
        trace,
    })
}

/// Result of [`minimize`]: the bracket that was found, then the search inside it.
#[derive(Debug, Clone)]
pub struct MinimizeOutcome {
    /// Where bracketing ended up.
    pub bracket: Bracket,
    /// Golden-section search over the bracket.
    pub search: GoldenOutcome,
    pub(crate) warnings: Vec<Warning>,
}

impl MinimizeOutcome {
    /// Location of the minimum.
    pub fn x(&self) -> f64 {
        self.search.x
    }

    /// f(x)
    pub fn value(&self) -> f64 {
        self.search.value
    }

    /// Warnings from both bracketing and the search.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

/// Bracket a minimum starting from `x0`, then refine it with golden-section search.
pub fn minimize<F>(
    f: &F,
    x0: f64,
    bracket_config: BracketConfig,
    golden_config: GoldenConfig,
) -> Result<MinimizeOutcome, SolverError>
where
    F: ScalarFunction + ?Sized,
{
    let found = bracket(f, x0, bracket_config)?;
    let search = golden_section(f, found.interval()?, golden_config)?;
    let mut warnings = Vec::new();
    if found.exhausted {
        warnings.push(Warning::from(WarningContent::BracketExpansionExhausted {
            expansions: found.expansions,
        }));
    }
    warnings.extend(search.warnings.iter().cloned());
    Ok(MinimizeOutcome {
        bracket: found,
        search,
        warnings,
    })
}
