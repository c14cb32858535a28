use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use faer::Mat;
use numlab::{
    BivariateFunction, Expr, ExprSystem, Interval, NonlinearSystem, ScalarFunction, SolverError,
    SumOfSquares, Warning,
    interpolate::PiecewiseLinear,
    linalg::{SeidelConfig, gauss_seidel, lu_solve},
    multi::{DescentConfig, NewtonConfig, StepSolver, coordinate_descent, newton},
    ode::euler_cauchy,
    problems::{LabSystem, lab_integrand, lab_interval, lab_matrix, lab_ode, lab_ode_rhs, lab_rhs},
    quadrature::estimate_order,
    scalar::{
        BisectionConfig, BracketConfig, GoldenConfig, Goal, ParabolicConfig, bisect,
        golden_section, minimize, parabolic_in,
    },
};

use crate::visualize::Plot;

mod visualize;

#[derive(Parser)]
#[command(name = "numlab", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print every iteration, not just the result.
    #[arg(long = "show-trace", global = true)]
    show_trace: bool,

    /// Save a plot of the result as a PNG.
    #[arg(short = 'o', long = "plot", global = true)]
    plot_path: Option<PathBuf>,
}

// Left unset, each solver keeps its own defaults.
#[derive(clap::Args, Default)]
struct Stopping {
    /// Convergence tolerance.
    #[arg(long)]
    tol: Option<f64>,

    /// Maximum number of iterations.
    #[arg(long = "max-iter")]
    max_iter: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Find a root of f(x) by bisection.
    #[command(allow_negative_numbers = true)]
    Bisect {
        /// f(x)
        #[arg(short, long, default_value = "x^3 - x - 2")]
        formula: String,
        /// Left end of an interval over which f changes sign.
        #[arg(long, default_value_t = 1.0)]
        lo: f64,
        /// Right end of the interval.
        #[arg(long, default_value_t = 2.0)]
        hi: f64,
        #[command(flatten)]
        stopping: Stopping,
    },
    /// Minimize f(x) by golden-section search.
    /// Without an interval, a bracket is first found by walking downhill from --start.
    #[command(allow_negative_numbers = true)]
    Golden {
        /// f(x)
        #[arg(short, long, default_value = "(x - 2)^2 + 1")]
        formula: String,
        /// Where bracketing starts.
        #[arg(long, default_value_t = 0.0)]
        start: f64,
        /// Search this interval directly instead of bracketing.
        #[arg(long, requires = "hi")]
        lo: Option<f64>,
        /// Right end of the search interval.
        #[arg(long, requires = "lo")]
        hi: Option<f64>,
        #[command(flatten)]
        stopping: Stopping,
    },
    /// Find and classify an extremum of f(x) by successive parabolic interpolation.
    #[command(allow_negative_numbers = true)]
    Parabola {
        /// f(x)
        #[arg(short, long, default_value = "cosh(x - 1)")]
        formula: String,
        /// Left end of the starting interval.
        #[arg(long, default_value_t = 0.0)]
        lo: f64,
        /// Right end of the starting interval.
        #[arg(long, default_value_t = 3.0)]
        hi: f64,
        /// Look for a maximum instead of a minimum.
        #[arg(long)]
        maximum: bool,
        #[command(flatten)]
        stopping: Stopping,
    },
    /// Minimize f(x, y) by coordinate descent.
    /// Defaults to the sum of squares of the reference two-equation system.
    Descent {
        /// f(x, y)
        #[arg(short, long)]
        formula: Option<String>,
        /// Starting point, as x,y.
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_values_t = [-2.0, 2.0])]
        start: Vec<f64>,
        #[command(flatten)]
        stopping: Stopping,
    },
    /// Solve a system of equations F(x) = 0 by Newton's method.
    /// Defaults to the reference two-equation system.
    Newton {
        /// One equation, written as an expression that should equal zero. Repeat for each equation.
        #[arg(short, long = "eq")]
        equations: Vec<String>,
        /// The unknowns, in order. Repeat for each unknown.
        #[arg(long = "var", default_values_t = ["x".to_owned(), "y".to_owned()])]
        vars: Vec<String>,
        /// Starting point, comma separated.
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_values_t = [0.5, 0.5])]
        start: Vec<f64>,
        /// Solve each step with the closed-form 2×2 inverse instead of LU.
        #[arg(long = "inverse-2x2")]
        inverse_2x2: bool,
        #[command(flatten)]
        stopping: Stopping,
    },
    /// Solve A·x = b by LU decomposition.
    /// Defaults to the reference 4×4 system.
    Lu {
        /// Rows separated by ';', entries by ',' or spaces, e.g. "4 1; 1 3".
        #[arg(long, allow_hyphen_values = true, requires = "rhs")]
        matrix: Option<String>,
        /// Right-hand side, e.g. "1, 2".
        #[arg(long, allow_hyphen_values = true, requires = "matrix")]
        rhs: Option<String>,
    },
    /// Solve A·x = b by Gauss-Seidel iteration.
    /// Defaults to the reference 4×4 system.
    Seidel {
        /// Rows separated by ';', entries by ',' or spaces, e.g. "4 1; 1 3".
        #[arg(long, allow_hyphen_values = true, requires = "rhs")]
        matrix: Option<String>,
        /// Right-hand side, e.g. "1, 2".
        #[arg(long, allow_hyphen_values = true, requires = "matrix")]
        rhs: Option<String>,
        #[command(flatten)]
        stopping: Stopping,
    },
    /// Integrate f(x) with the midpoint rule and estimate the rule's order.
    /// Defaults to the reference integrand on [-4, 4].
    #[command(allow_negative_numbers = true)]
    Integrate {
        /// f(x)
        #[arg(short, long)]
        formula: Option<String>,
        /// Lower limit.
        #[arg(long, default_value_t = lab_interval().lo())]
        lo: f64,
        /// Upper limit.
        #[arg(long, default_value_t = lab_interval().hi())]
        hi: f64,
        /// Subintervals on the coarsest grid. 2N and 4N are used too.
        #[arg(short, default_value_t = 100)]
        n: usize,
    },
    /// Integrate y' = f(x, y) with the Euler-Cauchy method.
    /// Defaults to the reference ODE.
    #[command(allow_negative_numbers = true)]
    Ode {
        /// f(x, y)
        #[arg(short, long)]
        formula: Option<String>,
        /// Initial x.
        #[arg(long, default_value_t = lab_ode().x0)]
        x0: f64,
        /// y(x0)
        #[arg(long, default_value_t = lab_ode().y0)]
        y0: f64,
        /// Where to stop.
        #[arg(long = "x-end", default_value_t = lab_ode().x_end)]
        x_end: f64,
        /// Step size.
        #[arg(long, default_value_t = lab_ode().step)]
        step: f64,
        /// Compare the trajectory's slope with f at the nodes nearest these x values.
        #[arg(long, value_delimiter = ',', default_values_t = [0.2, 0.5, 0.9, 1.0])]
        check: Vec<f64>,
    },
    /// Interpolate f(x) piecewise linearly between equally spaced nodes.
    #[command(allow_negative_numbers = true)]
    Interp {
        /// f(x)
        #[arg(short, long, default_value = "(x - 1.5)*sqrt(x + 4) + sin(pi*x)")]
        formula: String,
        /// First node.
        #[arg(long, default_value_t = 0.0)]
        lo: f64,
        /// Last node.
        #[arg(long, default_value_t = 5.0)]
        hi: f64,
        /// Number of segments.
        #[arg(short, default_value_t = 10)]
        n: usize,
        /// Evaluate the interpolant here.
        #[arg(long, value_delimiter = ',', default_values_t = [2.5])]
        at: Vec<f64>,
    },
}

/// What a command found, ready to print.
struct Report {
    title: String,
    lines: Vec<String>,
    trace: Vec<String>,
    warnings: Vec<Warning>,
    plot: Option<Plot>,
}

impl Report {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
            trace: Vec::new(),
            warnings: Vec::new(),
            plot: None,
        }
    }

    fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn iterations(&mut self, count: usize, converged: bool) {
        if converged {
            self.line(format!("Iterations needed: {count}"));
        } else {
            self.line(format!("Iterations: {count} (did not converge)"));
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let report = match run(&cli) {
        Ok(report) => report,
        Err(e) => {
            print_failure_output(&e);
            std::process::exit(1);
        }
    };
    if let Err(e) = handle_output(&report, &cli) {
        eprintln!("{}: {e:#}", "Could not save plot".red());
        std::process::exit(1);
    }
}

fn handle_output(report: &Report, cli: &Cli) -> anyhow::Result<()> {
    print_output(report, cli.show_trace);
    if let Some(path) = &cli.plot_path {
        match &report.plot {
            Some(plot) => {
                visualize::save_png(&report.title, plot, path)?;
                println!("Plot saved to {}", path.display());
            }
            None => println!("{}", "This command has nothing to plot".yellow()),
        }
    }
    Ok(())
}

fn run(cli: &Cli) -> anyhow::Result<Report> {
    match &cli.command {
        Command::Bisect {
            formula,
            lo,
            hi,
            stopping,
        } => run_bisect(formula, Interval::new(*lo, *hi)?, stopping),
        Command::Golden {
            formula,
            start,
            lo,
            hi,
            stopping,
        } => {
            let interval = match (lo, hi) {
                (Some(lo), Some(hi)) => Some(Interval::new(*lo, *hi)?),
                _ => None,
            };
            run_golden(formula, *start, interval, stopping)
        }
        Command::Parabola {
            formula,
            lo,
            hi,
            maximum,
            stopping,
        } => {
            let goal = if *maximum { Goal::Maximum } else { Goal::Minimum };
            run_parabola(formula, Interval::new(*lo, *hi)?, goal, stopping)
        }
        Command::Descent {
            formula,
            start,
            stopping,
        } => run_descent(formula.as_deref(), start, stopping),
        Command::Newton {
            equations,
            vars,
            start,
            inverse_2x2,
            stopping,
        } => {
            let step_solver = if *inverse_2x2 {
                StepSolver::Inverse2x2
            } else {
                StepSolver::Lu
            };
            run_newton(equations, vars, start, step_solver, stopping)
        }
        Command::Lu { matrix, rhs } => {
            let (a, b) = linear_system(matrix.as_deref(), rhs.as_deref())?;
            run_lu(&a, &b)
        }
        Command::Seidel {
            matrix,
            rhs,
            stopping,
        } => {
            let (a, b) = linear_system(matrix.as_deref(), rhs.as_deref())?;
            run_seidel(&a, &b, stopping)
        }
        Command::Integrate { formula, lo, hi, n } => {
            run_integrate(formula.as_deref(), Interval::new(*lo, *hi)?, *n)
        }
        Command::Ode {
            formula,
            x0,
            y0,
            x_end,
            step,
            check,
        } => run_ode(formula.as_deref(), [*x0, *y0], *x_end, *step, check),
        Command::Interp {
            formula,
            lo,
            hi,
            n,
            at,
        } => run_interp(formula, Interval::new(*lo, *hi)?, *n, at),
    }
}

fn parse_formula(src: &str) -> anyhow::Result<Expr> {
    Expr::parse(src).with_context(|| format!("could not parse the formula {src:?}"))
}

fn run_bisect(formula: &str, interval: Interval, stopping: &Stopping) -> anyhow::Result<Report> {
    let expr = parse_formula(formula)?;
    let f = expr.scalar("x");
    let mut config = BisectionConfig::default();
    if let Some(tol) = stopping.tol {
        config = config.with_tolerance(tol);
    }
    if let Some(max) = stopping.max_iter {
        config = config.with_max_iterations(max);
    }
    let outcome = bisect(&f, interval, config)?;

    let mut report = Report::new(format!("Bisection of {formula} on {interval}"));
    report.line(format!("Root: x = {:.9}", outcome.root()));
    report.line(format!("f(x) = {:e}", outcome.value()));
    report.line(format!("Final interval length: {:e}", outcome.final_measure()));
    report.iterations(outcome.iterations(), outcome.converged());
    report.trace = outcome
        .trace()
        .iter()
        .map(|r| {
            let s = r.step;
            format!(
                "{:>4}  a = {:<14.9} b = {:<14.9} c = {:<14.9} f(c) = {:<12.3e} |b - a| = {:.3e}",
                r.index, s.a, s.b, s.c, s.fc, r.measure
            )
        })
        .collect();
    report.warnings = outcome.warnings().to_vec();
    report.plot = Some(
        Plot::default()
            .function(formula, &f, interval)
            .marker("root", outcome.root(), outcome.value()),
    );
    Ok(report)
}

fn run_golden(
    formula: &str,
    start: f64,
    interval: Option<Interval>,
    stopping: &Stopping,
) -> anyhow::Result<Report> {
    let expr = parse_formula(formula)?;
    let f = expr.scalar("x");
    let mut config = GoldenConfig::default();
    if let Some(tol) = stopping.tol {
        config = config.with_tolerance(tol);
    }
    if let Some(max) = stopping.max_iter {
        config = config.with_max_iterations(max);
    }

    let mut report = Report::new(format!("Golden-section search on {formula}"));
    let (search, span) = match interval {
        Some(interval) => {
            let search = golden_section(&f, interval, config)?;
            report.warnings = search.warnings().to_vec();
            (search, interval)
        }
        None => {
            let outcome = minimize(&f, start, BracketConfig::default(), config)?;
            let bracket = &outcome.bracket;
            report.line(format!(
                "Bracket from x = {start}: [{:.6}, {:.6}] after {} expansions",
                bracket.a, bracket.c, bracket.expansions
            ));
            report.warnings = outcome.warnings().to_vec();
            let span = bracket.interval()?;
            (outcome.search, span)
        }
    };
    report.line(format!("Minimum: x = {:.9}", search.x()));
    report.line(format!("f(x) = {:.9}", search.value()));
    report.iterations(search.iterations(), search.converged());
    report.trace = search
        .trace()
        .iter()
        .map(|r| {
            let s = r.step;
            format!(
                "{:>4}  [{:.9}, {:.9}]  x1 = {:.9} f1 = {:.6e}  x2 = {:.9} f2 = {:.6e}",
                r.index, s.a, s.b, s.x1, s.f1, s.x2, s.f2
            )
        })
        .collect();
    report.plot = Some(
        Plot::default()
            .function(formula, &f, span)
            .marker("minimum", search.x(), search.value()),
    );
    Ok(report)
}

fn run_parabola(
    formula: &str,
    interval: Interval,
    goal: Goal,
    stopping: &Stopping,
) -> anyhow::Result<Report> {
    let expr = parse_formula(formula)?;
    let f = expr.scalar("x");
    let mut config = ParabolicConfig::default();
    if let Some(tol) = stopping.tol {
        config = config.with_tolerance(tol);
    }
    if let Some(max) = stopping.max_iter {
        config = config.with_max_iterations(max);
    }
    let outcome = parabolic_in(&f, interval, goal, config)?;

    let mut report = Report::new(format!("Parabolic search on {formula}"));
    report.line(format!("Extremum: x = {:.9}", outcome.x()));
    report.line(format!("f(x) = {:.9}", outcome.value()));
    report.line(format!("f'(x) = {:.3e}", outcome.first_derivative()));
    report.line(format!("f''(x) = {:.6}", outcome.second_derivative()));
    report.line(format!("Kind: {}", outcome.kind()));
    report.iterations(outcome.iterations(), outcome.converged());
    report.trace = outcome
        .trace()
        .iter()
        .map(|r| {
            let s = r.step;
            let how = if s.fallback { " (golden step)" } else { "" };
            format!(
                "{:>4}  x1 = {:.9} x2 = {:.9} x3 = {:.9} -> x = {:.9} f = {:.9}{how}",
                r.index, s.x1, s.x2, s.x3, s.x_new, s.f_new
            )
        })
        .collect();
    report.warnings = outcome.warnings().to_vec();
    report.plot = Some(
        Plot::default()
            .function(formula, &f, interval)
            .marker(outcome.kind().to_string(), outcome.x(), outcome.value()),
    );
    Ok(report)
}

fn run_descent(
    formula: Option<&str>,
    start: &[f64],
    stopping: &Stopping,
) -> anyhow::Result<Report> {
    let [x0, y0] = start else {
        bail!("the starting point needs exactly two coordinates");
    };
    let expr = formula.map(parse_formula).transpose()?;
    let lab = SumOfSquares::new(&LabSystem)?;
    let bivariate;
    let (f, name): (&dyn BivariateFunction, &str) = match (&expr, formula) {
        (Some(expr), Some(src)) => {
            bivariate = expr.bivariate("x", "y");
            (&bivariate, src)
        }
        _ => (&lab, "the reference system's sum of squares"),
    };
    let mut config = DescentConfig::default();
    if let Some(tol) = stopping.tol {
        config = config.with_tolerance(tol);
    }
    if let Some(max) = stopping.max_iter {
        config = config.with_max_iterations(max);
    }
    let outcome = coordinate_descent(f, [*x0, *y0], config)?;

    let [x, y] = outcome.point();
    let [gx, gy] = outcome.gradient();
    let mut report = Report::new(format!("Coordinate descent on {name}"));
    report.line(format!("Minimum: (x, y) = ({x:.9}, {y:.9})"));
    report.line(format!("f(x, y) = {:e}", outcome.value()));
    report.line(format!("Gradient: ({gx:.3e}, {gy:.3e})"));
    report.iterations(outcome.iterations(), outcome.converged());
    report.trace = outcome
        .trace()
        .iter()
        .map(|r| {
            let s = r.step;
            format!(
                "{:>4}  x = {:.9} y = {:.9} f = {:.6e} step = {:.3e}",
                r.index, s.x, s.y, s.value, r.measure
            )
        })
        .collect();
    report.warnings = outcome.warnings().to_vec();
    let path = std::iter::once((*x0, *y0))
        .chain(outcome.trace().iter().map(|r| (r.step.x, r.step.y)))
        .collect();
    report.plot = Some(
        Plot::default()
            .curve("path", path)
            .marker("start", *x0, *y0)
            .marker("end", x, y),
    );
    Ok(report)
}

fn run_newton(
    equations: &[String],
    vars: &[String],
    start: &[f64],
    step_solver: StepSolver,
    stopping: &Stopping,
) -> anyhow::Result<Report> {
    let mut config = NewtonConfig::default().with_step_solver(step_solver);
    if let Some(tol) = stopping.tol {
        config = config.with_tolerance(tol);
    }
    if let Some(max) = stopping.max_iter {
        config = config.with_max_iterations(max);
    }

    let parsed;
    let (system, names): (&dyn NonlinearSystem, &[String]) = if equations.is_empty() {
        (&LabSystem, vars)
    } else {
        let exprs = equations
            .iter()
            .map(|src| parse_formula(src))
            .collect::<anyhow::Result<Vec<_>>>()?;
        parsed = ExprSystem::new(exprs, vars.to_vec())?;
        (&parsed, parsed.unknowns())
    };
    let outcome = newton(system, start, config)?;

    let title = if equations.is_empty() {
        "Newton's method on the reference system".to_owned()
    } else {
        format!("Newton's method on {} equations", equations.len())
    };
    let mut report = Report::new(title);
    for (name, value) in names.iter().zip(outcome.x()) {
        report.line(format!("{name} = {value:.9}"));
    }
    report.line(format!("Residual norm: {:e}", outcome.residual_norm()));
    report.iterations(outcome.iterations(), outcome.converged());
    report.trace = outcome
        .trace()
        .iter()
        .map(|r| {
            let x: Vec<_> = r.step.x.iter().map(|v| format!("{v:.9}")).collect();
            format!(
                "{:>4}  x = ({})  |F| = {:.3e}  |dx| = {:.3e}",
                r.index,
                x.join(", "),
                r.step.residual_norm,
                r.measure
            )
        })
        .collect();
    report.warnings = outcome.warnings().to_vec();
    if let [x, y] = outcome.x() {
        let path = std::iter::once((start[0], start[1]))
            .chain(outcome.trace().iter().map(|r| (r.step.x[0], r.step.x[1])))
            .collect();
        report.plot = Some(
            Plot::default()
                .curve("iterates", path)
                .marker("root", *x, *y),
        );
    }
    Ok(report)
}

/// The user's system, or the reference one if none was given.
fn linear_system(matrix: Option<&str>, rhs: Option<&str>) -> anyhow::Result<(Mat<f64>, Vec<f64>)> {
    match (matrix, rhs) {
        (Some(matrix), Some(rhs)) => Ok((parse_matrix(matrix)?, parse_vector(rhs)?)),
        _ => Ok((lab_matrix(), lab_rhs())),
    }
}

fn parse_vector(src: &str) -> anyhow::Result<Vec<f64>> {
    src.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .with_context(|| format!("{s:?} is not a number"))
        })
        .collect()
}

fn parse_matrix(src: &str) -> anyhow::Result<Mat<f64>> {
    let rows = src
        .split(';')
        .filter(|row| !row.trim().is_empty())
        .map(parse_vector)
        .collect::<anyhow::Result<Vec<_>>>()?;
    let Some(first) = rows.first() else {
        bail!("the matrix has no rows");
    };
    let cols = first.len();
    if let Some(i) = rows.iter().position(|row| row.len() != cols) {
        bail!(
            "row {} has {} entries, but row 1 has {cols}",
            i + 1,
            rows[i].len()
        );
    }
    Ok(Mat::from_fn(rows.len(), cols, |i, j| rows[i][j]))
}

fn run_lu(a: &Mat<f64>, b: &[f64]) -> anyhow::Result<Report> {
    let solution = lu_solve(a, b)?;
    let mut report = Report::new(format!("LU solve of a {0}×{0} system", a.nrows()));
    for (i, value) in solution.x().iter().enumerate() {
        report.line(format!("x{} = {value:.9}", i + 1));
    }
    report.line(format!("Residual norm: {:e}", solution.residual_norm()));
    let decomposition = solution.decomposition();
    report.trace = matrix_lines("L", &decomposition.l)
        .into_iter()
        .chain(matrix_lines("U", &decomposition.u))
        .collect();
    Ok(report)
}

fn matrix_lines(name: &str, m: &Mat<f64>) -> Vec<String> {
    let mut lines = vec![format!("{name} =")];
    for i in 0..m.nrows() {
        let row: Vec<_> = (0..m.ncols()).map(|j| format!("{:>12.6}", m[(i, j)])).collect();
        lines.push(format!("  [{} ]", row.join("")));
    }
    lines
}

fn run_seidel(a: &Mat<f64>, b: &[f64], stopping: &Stopping) -> anyhow::Result<Report> {
    let mut config = SeidelConfig::default();
    if let Some(tol) = stopping.tol {
        config = config.with_tolerance(tol);
    }
    if let Some(max) = stopping.max_iter {
        config = config.with_max_iterations(max);
    }
    let outcome = gauss_seidel(a, b, config)?;
    let mut report = Report::new(format!("Gauss-Seidel on a {0}×{0} system", a.nrows()));
    for (i, value) in outcome.x().iter().enumerate() {
        report.line(format!("x{} = {value:.9}", i + 1));
    }
    report.line(format!("Residual norm: {:e}", outcome.residual_norm()));
    report.iterations(outcome.sweeps(), outcome.converged());
    report.trace = outcome
        .trace()
        .iter()
        .map(|r| {
            let x: Vec<_> = r.step.iter().map(|v| format!("{v:.9}")).collect();
            format!("{:>4}  x = ({})  max change = {:.3e}", r.index, x.join(", "), r.measure)
        })
        .collect();
    report.warnings = outcome.warnings().to_vec();
    let convergence = outcome
        .trace()
        .iter()
        .filter(|r| r.measure > 0.0)
        .map(|r| (r.index as f64, r.measure.log10()))
        .collect();
    report.plot = Some(Plot::default().curve("log10(max change)", convergence));
    Ok(report)
}

fn run_integrate(formula: Option<&str>, interval: Interval, n: usize) -> anyhow::Result<Report> {
    let expr = formula.map(parse_formula).transpose()?;
    let scalar;
    let (f, name): (&dyn ScalarFunction, &str) = match (&expr, formula) {
        (Some(expr), Some(src)) => {
            scalar = expr.scalar("x");
            (&scalar, src)
        }
        _ => (&lab_integrand, "the reference integrand"),
    };
    let estimate = estimate_order(f, interval, n)?;

    let mut report = Report::new(format!("Midpoint rule for {name} on {interval}"));
    for (n, value) in estimate.subintervals().iter().zip(estimate.estimates()) {
        report.line(format!("I({n}) = {value:.9}"));
    }
    report.line(format!("Integral: {:.9}", estimate.integral()));
    if estimate.order().is_nan() {
        report.line("Order of accuracy: undefined");
    } else {
        report.line(format!("Order of accuracy: {:.4}", estimate.order()));
    }
    report.warnings = estimate.warnings().to_vec();
    report.plot = Some(Plot::default().function(name, f, interval));
    Ok(report)
}

fn run_ode(
    formula: Option<&str>,
    [x0, y0]: [f64; 2],
    x_end: f64,
    step: f64,
    check: &[f64],
) -> anyhow::Result<Report> {
    let expr = formula.map(parse_formula).transpose()?;
    let bivariate;
    let (f, name): (&dyn BivariateFunction, &str) = match (&expr, formula) {
        (Some(expr), Some(src)) => {
            bivariate = expr.bivariate("x", "y");
            (&bivariate, src)
        }
        _ => (&lab_ode_rhs, "the reference ODE"),
    };
    let trajectory = euler_cauchy(f, x0, y0, x_end, step)?;

    let (x_last, y_last) = trajectory.last();
    let mut report = Report::new(format!("Euler-Cauchy for y' = {name}"));
    report.line(format!("y({x_last:.6}) = {y_last:.9}"));
    report.line(format!("Steps: {} of size {}", trajectory.steps(), trajectory.step()));
    for c in trajectory.derivative_check(f, check)? {
        report.line(format!(
            "At x = {:.4}: Δy/Δx = {:.6}, f(x, y) = {:.6}, error = {:.3e}",
            c.x, c.difference_quotient, c.slope, c.error
        ));
    }
    report.trace = trajectory
        .points()
        .iter()
        .enumerate()
        .map(|(k, (x, y))| format!("{k:>4}  x = {x:.6}  y = {y:.9}"))
        .collect();
    report.plot = Some(Plot::default().curve("y(x)", trajectory.points().to_vec()));
    Ok(report)
}

fn run_interp(formula: &str, interval: Interval, n: usize, at: &[f64]) -> anyhow::Result<Report> {
    let expr = parse_formula(formula)?;
    let f = expr.scalar("x");
    let polyline = PiecewiseLinear::sample(&f, interval, n)?;

    let mut report = Report::new(format!("Piecewise linear interpolation of {formula}"));
    let mut plot = Plot::default().function(formula, &f, interval).curve(
        "interpolant",
        polyline
            .xs()
            .iter()
            .copied()
            .zip(polyline.ys().iter().copied())
            .collect(),
    );
    for &x in at {
        let value = polyline.interpolate(x)?;
        let exact = f.eval(x).map_err(SolverError::from)?;
        report.line(format!(
            "At x = {x}: interpolated {value:.9}, exact {exact:.9}, error {:.3e}",
            (value - exact).abs()
        ));
        plot = plot.marker(format!("x = {x}"), x, value);
    }
    report.trace = polyline.segments().iter().map(ToString::to_string).collect();
    report.plot = Some(plot);
    Ok(report)
}

/// Prints the output nicely to stdout.
fn print_output(report: &Report, show_trace: bool) {
    println!("{}", report.title.bold());
    print_warnings(&report.warnings);
    for line in &report.lines {
        println!("{line}");
    }
    if show_trace && !report.trace.is_empty() {
        println!("Trace:");
        for line in &report.trace {
            println!("\t{line}");
        }
    }
}

fn print_warnings(warnings: &[Warning]) {
    if !warnings.is_empty() {
        println!("Warnings:");
        for warning in warnings {
            println!("\t{}", warning.to_string().yellow());
        }
    }
}

fn print_failure_output(error: &anyhow::Error) {
    match error.downcast_ref::<SolverError>() {
        Some(e) => {
            eprintln!("{}: {e}", "Could not solve".red());
            if e.is_invalid_bracket() {
                eprintln!("Pick an interval where the function changes sign.");
            } else if e.is_singular() {
                eprintln!("Try a different starting point, or check the equations are independent.");
            }
        }
        None => eprintln!("{}: {error:#}", "Error".red()),
    }
}
