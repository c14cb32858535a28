use super::*;
use crate::{
    linalg::{SeidelConfig, gauss_seidel, lu_solve},
    multi::{DescentConfig, NewtonConfig, StepSolver, coordinate_descent, newton},
    ode::euler_cauchy,
    problems::{
        LabSystem, lab_integrand, lab_interval, lab_matrix, lab_ode, lab_ode_rhs, lab_rhs,
    },
    quadrature::estimate_order,
    scalar::{
        BisectionConfig, BracketConfig, GoldenConfig, Goal, ParabolicConfig, bisect,
        golden_section, minimize, parabolic_in,
    },
};

mod proptests;

#[track_caller]
pub(crate) fn assert_nearly_eq(actual: f64, expected: f64, tolerance: f64) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "expected {expected}, got {actual} (off by {diff}, tolerance {tolerance})"
    );
}

#[test]
fn bisection_on_the_classic_cubic() {
    let f = |x: f64| x * x * x - x - 2.0;
    let outcome = bisect(&f, Interval::new(1.0, 2.0).unwrap(), BisectionConfig::default()).unwrap();
    assert_eq!(outcome.iterations(), 19);
    assert_nearly_eq(outcome.root(), 1.521380, 1e-6);
    assert!(outcome.converged());
}

#[test]
fn newton_and_coordinate_descent_find_the_same_root() {
    let start = [-2.0, 2.0];
    let newton_outcome = newton(&LabSystem, &start, NewtonConfig::default()).unwrap();
    assert!(newton_outcome.converged());

    let objective = SumOfSquares::new(&LabSystem).unwrap();
    let descent = coordinate_descent(
        &objective,
        start,
        DescentConfig::default().with_tolerance(1e-6),
    )
    .unwrap();
    assert!(descent.converged(), "{:?}", descent.warnings());
    assert!(descent.value() < 1e-6);

    let [x, y] = descent.point();
    assert_nearly_eq(x, newton_outcome.x()[0], 1e-3);
    assert_nearly_eq(y, newton_outcome.x()[1], 1e-3);
}

#[test]
fn newton_from_the_lab_start() {
    for step_solver in [StepSolver::Lu, StepSolver::Inverse2x2] {
        let outcome = newton(
            &LabSystem,
            &[0.5, 0.5],
            NewtonConfig::default().with_step_solver(step_solver),
        )
        .unwrap();
        assert_eq!(outcome.iterations(), 6);
        assert_nearly_eq(outcome.x()[0], -1.758098, 1e-5);
        assert_nearly_eq(outcome.x()[1], 1.902875, 1e-5);
    }
}

#[test]
fn gauss_seidel_agrees_with_lu() {
    let a = lab_matrix();
    let b = lab_rhs();
    let direct = lu_solve(&a, &b).unwrap();
    let iterative = gauss_seidel(&a, &b, SeidelConfig::default()).unwrap();
    assert!(iterative.converged());
    assert!(iterative.warnings().is_empty());
    for (xi, yi) in iterative.x().iter().zip(direct.x()) {
        assert_nearly_eq(*xi, *yi, 1e-4);
    }
}

#[test]
fn lu_reconstructs_and_solves_the_lab_matrix() {
    let a = lab_matrix();
    let solution = lu_solve(&a, &lab_rhs()).unwrap();
    assert!(solution.residual_norm() < 1e-10);
    let rebuilt = solution.decomposition().reconstruct();
    for i in 0..4 {
        for j in 0..4 {
            assert_nearly_eq(rebuilt[(i, j)], a[(i, j)], 1e-12);
        }
    }
}

#[test]
fn golden_section_and_parabolic_agree() {
    let f = |x: f64| (x - 0.7) * (x - 0.7) + libm::cos(3.0 * x) * 0.1;
    let golden = minimize(&f, 0.0, BracketConfig::default(), GoldenConfig::default()).unwrap();
    let parabola = parabolic_in(
        &f,
        Interval::new(0.0, 1.5).unwrap(),
        Goal::Minimum,
        ParabolicConfig::default().with_tolerance(1e-8),
    )
    .unwrap();
    assert_nearly_eq(golden.x(), parabola.x(), 1e-5);
}

#[test]
fn reruns_are_bit_identical() {
    fn bits(xs: &[f64]) -> Vec<u64> {
        xs.iter().map(|x| x.to_bits()).collect()
    }

    let f = |x: f64| libm::exp(x) - 3.0;
    let interval = Interval::new(0.0, 2.0).unwrap();
    let first = bisect(&f, interval, BisectionConfig::default()).unwrap();
    let second = bisect(&f, interval, BisectionConfig::default()).unwrap();
    assert_eq!(first.root().to_bits(), second.root().to_bits());
    assert_eq!(first.trace(), second.trace());

    let bowl = |x: f64| (x - 0.7) * (x - 0.7) + libm::sin(3.0 * x);
    let run = || golden_section(&bowl, interval, GoldenConfig::default()).unwrap();
    let (first, second) = (run(), run());
    assert_eq!(first.x().to_bits(), second.x().to_bits());
    assert_eq!(first.trace(), second.trace());

    let run = || minimize(&bowl, 0.0, BracketConfig::default(), GoldenConfig::default()).unwrap();
    let (first, second) = (run(), run());
    assert_eq!(first.x().to_bits(), second.x().to_bits());
    assert_eq!(first.search.trace(), second.search.trace());

    let run = || parabolic_in(&bowl, interval, Goal::Minimum, ParabolicConfig::default()).unwrap();
    let (first, second) = (run(), run());
    assert_eq!(first.x().to_bits(), second.x().to_bits());
    assert_eq!(first.trace(), second.trace());

    let first = newton(&LabSystem, &[0.5, 0.5], NewtonConfig::default()).unwrap();
    let second = newton(&LabSystem, &[0.5, 0.5], NewtonConfig::default()).unwrap();
    assert_eq!(bits(first.x()), bits(second.x()));
    assert_eq!(first.trace(), second.trace());

    let objective = SumOfSquares::new(&LabSystem).unwrap();
    let run = || coordinate_descent(&objective, [-2.0, 2.0], DescentConfig::default()).unwrap();
    let (first, second) = (run(), run());
    assert_eq!(bits(&first.point()), bits(&second.point()));
    assert_eq!(first.trace(), second.trace());

    let (a, b) = (lab_matrix(), lab_rhs());
    let first = lu_solve(&a, &b).unwrap();
    let second = lu_solve(&a, &b).unwrap();
    assert_eq!(bits(first.x()), bits(second.x()));
    assert_eq!(first.residual_norm().to_bits(), second.residual_norm().to_bits());

    let first = gauss_seidel(&a, &b, SeidelConfig::default()).unwrap();
    let second = gauss_seidel(&a, &b, SeidelConfig::default()).unwrap();
    assert_eq!(bits(first.x()), bits(second.x()));
    assert_eq!(first.trace(), second.trace());

    let first = estimate_order(&lab_integrand, lab_interval(), 10).unwrap();
    let second = estimate_order(&lab_integrand, lab_interval(), 10).unwrap();
    assert_eq!(bits(&first.estimates()), bits(&second.estimates()));
    assert_eq!(first.order().to_bits(), second.order().to_bits());

    let p = lab_ode();
    let first = euler_cauchy(&lab_ode_rhs, p.x0, p.y0, p.x_end, 0.1).unwrap();
    let second = euler_cauchy(&lab_ode_rhs, p.x0, p.y0, p.x_end, 0.1).unwrap();
    let flatten = |points: &[(f64, f64)]| -> Vec<u64> {
        points
            .iter()
            .flat_map(|&(x, y)| [x.to_bits(), y.to_bits()])
            .collect()
    };
    assert_eq!(flatten(first.points()), flatten(second.points()));
}

#[test]
fn halving_the_ode_step_changes_less_and_less() {
    let p = lab_ode();
    let end = |h: f64| {
        euler_cauchy(&lab_ode_rhs, p.x0, p.y0, p.x_end, h)
            .unwrap()
            .last()
            .1
    };
    let coarse = (end(0.1) - end(0.05)).abs();
    let fine = (end(p.step) - end(p.step / 2.0)).abs();
    assert!(fine < coarse);
    assert!(fine < 1e-4);
    assert_nearly_eq(end(p.step), 1.7740578, 1e-6);
}

#[test]
fn parsed_formulas_drive_the_solvers() {
    let cubic = Expr::parse("x^3 - x - 2").unwrap();
    let outcome = bisect(
        &cubic.scalar("x"),
        Interval::new(1.0, 2.0).unwrap(),
        BisectionConfig::default(),
    )
    .unwrap();
    assert_nearly_eq(outcome.root(), 1.521380, 1e-6);

    let system = ExprSystem::new(
        vec![
            Expr::parse("cos(ln(0.5 + x^2)) - sin(ln(0.4 + (y/2)^2)) - 0.025").unwrap(),
            Expr::parse("4 / (x^2 + 2*y^2 + 4 - cos(0.01*x*y)) - 0.3").unwrap(),
        ],
        vec!["x".to_owned(), "y".to_owned()],
    )
    .unwrap();
    let parsed = newton(&system, &[0.5, 0.5], NewtonConfig::default()).unwrap();
    let native = newton(&LabSystem, &[0.5, 0.5], NewtonConfig::default()).unwrap();
    assert_nearly_eq(parsed.x()[0], native.x()[0], 1e-6);
    assert_nearly_eq(parsed.x()[1], native.x()[1], 1e-6);
}

#[test]
fn evaluation_errors_stop_the_solver() {
    let log = Expr::parse("log(x)").unwrap();
    let err = bisect(
        &log.scalar("x"),
        Interval::new(-1.0, 2.0).unwrap(),
        BisectionConfig::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        SolverError::Evaluation(EvalError::Domain {
            function: "log",
            argument: -1.0
        })
    );
}
