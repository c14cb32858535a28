//! Benchmarks for the numlab solvers, on the reference lab problems.
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use faer::Mat;
use numlab::{
    Expr, Interval, SumOfSquares,
    linalg::{SeidelConfig, gauss_seidel, lu_solve},
    multi::{DescentConfig, NewtonConfig, coordinate_descent, newton},
    ode::euler_cauchy,
    problems::{LabSystem, lab_integrand, lab_interval, lab_matrix, lab_ode, lab_ode_rhs, lab_rhs},
    quadrature::estimate_order,
    scalar::{BisectionConfig, Goal, ParabolicConfig, bisect, parabolic_in},
};

fn solve_bisection(c: &mut Criterion) {
    let interval = Interval::new(1.0, 2.0).unwrap();
    c.bench_function("bisect_cubic", |b| {
        b.iter(|| {
            let _actual = black_box(
                bisect(&|x: f64| x * x * x - x - 2.0, interval, BisectionConfig::default()).unwrap(),
            );
        });
    });
}

fn solve_bisection_parsed(c: &mut Criterion) {
    let interval = Interval::new(1.0, 2.0).unwrap();
    let expr = Expr::parse("x^3 - x - 2").unwrap();
    c.bench_function("bisect_cubic_parsed", |b| {
        b.iter(|| {
            let _actual =
                black_box(bisect(&expr.scalar("x"), interval, BisectionConfig::default()).unwrap());
        });
    });
}

fn solve_parabolic(c: &mut Criterion) {
    let interval = Interval::new(0.0, 2.0).unwrap();
    c.bench_function("parabolic_cosh", |b| {
        b.iter(|| {
            let _actual = black_box(
                parabolic_in(
                    &|x: f64| libm::cosh(x - 1.0),
                    interval,
                    Goal::Minimum,
                    ParabolicConfig::default(),
                )
                .unwrap(),
            );
        });
    });
}

fn solve_newton(c: &mut Criterion) {
    c.bench_function("newton_lab_system", |b| {
        b.iter(|| {
            let _actual = black_box(newton(&LabSystem, &[0.5, 0.5], NewtonConfig::default()).unwrap());
        });
    });
}

fn solve_descent(c: &mut Criterion) {
    let objective = SumOfSquares::new(&LabSystem).unwrap();
    c.bench_function("descent_lab_system", |b| {
        b.iter(|| {
            let _actual = black_box(
                coordinate_descent(&objective, [-2.0, 2.0], DescentConfig::default()).unwrap(),
            );
        });
    });
}

fn solve_lab_matrix(c: &mut Criterion) {
    let a = lab_matrix();
    let rhs = lab_rhs();
    c.bench_function("lu_lab_matrix", |b| {
        b.iter(|| {
            let _actual = black_box(lu_solve(&a, &rhs).unwrap());
        });
    });
    c.bench_function("seidel_lab_matrix", |b| {
        b.iter(|| {
            let _actual = black_box(gauss_seidel(&a, &rhs, SeidelConfig::default()).unwrap());
        });
    });
}

/// LU against Gauss-Seidel on growing tridiagonal systems.
fn solve_tridiagonal(c: &mut Criterion) {
    let mut group = c.benchmark_group("tridiagonal");
    for size in [8usize, 32, 128] {
        let a = Mat::from_fn(size, size, |i, j| match i.abs_diff(j) {
            0 => 4.0,
            1 => -1.0,
            _ => 0.0,
        });
        let rhs = vec![1.0; size];
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("lu", size), &size, |b, _size| {
            b.iter(|| {
                let _actual = black_box(lu_solve(&a, &rhs).unwrap());
            });
        });
        group.bench_with_input(BenchmarkId::new("seidel", size), &size, |b, _size| {
            b.iter(|| {
                let _actual = black_box(gauss_seidel(&a, &rhs, SeidelConfig::default()).unwrap());
            });
        });
    }
    group.finish();
}

fn solve_quadrature(c: &mut Criterion) {
    c.bench_function("midpoint_order_lab_integrand", |b| {
        b.iter(|| {
            let _actual = black_box(estimate_order(&lab_integrand, lab_interval(), 400).unwrap());
        });
    });
}

fn solve_ode(c: &mut Criterion) {
    let p = lab_ode();
    c.bench_function("euler_cauchy_lab_ode", |b| {
        b.iter(|| {
            let _actual = black_box(euler_cauchy(&lab_ode_rhs, p.x0, p.y0, p.x_end, p.step).unwrap());
        });
    });
}

criterion_group!(
    benches,
    solve_bisection,
    solve_bisection_parsed,
    solve_parabolic,
    solve_newton,
    solve_descent,
    solve_lab_matrix,
    solve_tridiagonal,
    solve_quadrature,
    solve_ode,
);
criterion_main!(benches);
