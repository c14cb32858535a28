use faer::Mat;
use proptest::prelude::*;

use crate::{
    Expr, Interval,
    expr::{BinaryOp, Constant, Func},
    linalg::{SeidelConfig, gauss_seidel, lu_solve},
    scalar::{BisectionConfig, bisect},
    tests::assert_nearly_eq,
};

/// An n×n matrix whose diagonal outweighs the rest of its row at least twice over.
fn dominant_matrix(n: usize) -> impl Strategy<Value = Mat<f64>> {
    (
        prop::collection::vec(-10.0..10.0f64, n * n),
        prop::collection::vec((1.0..10.0f64, any::<bool>()), n),
    )
        .prop_map(move |(entries, diagonal)| {
            let mut a = Mat::from_fn(n, n, |i, j| entries[i * n + j]);
            for (i, (margin, negative)) in diagonal.into_iter().enumerate() {
                let off: f64 = (0..n).filter(|&j| j != i).map(|j| a[(i, j)].abs()).sum();
                let d = 2.0 * off + margin;
                a[(i, i)] = if negative { -d } else { d };
            }
            a
        })
}

fn system(n: usize) -> impl Strategy<Value = (Mat<f64>, Vec<f64>)> {
    (dominant_matrix(n), prop::collection::vec(-100.0..100.0f64, n))
}

fn arb_expr() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        (0u32..4000).prop_map(|n| Expr::Number(f64::from(n) / 8.0)),
        prop::sample::select(vec!["x", "y", "t_0"]).prop_map(|v| Expr::Variable(v.to_owned())),
        prop::sample::select(vec![Constant::Pi, Constant::E]).prop_map(Expr::Constant),
    ];
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|e| Expr::Neg(Box::new(e))),
            (
                prop::sample::select(vec![
                    BinaryOp::Add,
                    BinaryOp::Sub,
                    BinaryOp::Mul,
                    BinaryOp::Div,
                    BinaryOp::Pow,
                ]),
                inner.clone(),
                inner.clone(),
            )
                .prop_map(|(op, lhs, rhs)| Expr::Binary(op, Box::new(lhs), Box::new(rhs))),
            (prop::sample::select(Func::ALL.to_vec()), inner)
                .prop_map(|(func, arg)| Expr::Call(func, Box::new(arg))),
        ]
    })
}

proptest! {
    #[test]
    fn lu_solves_dominant_systems((a, b) in (2usize..6).prop_flat_map(system)) {
        let solution = lu_solve(&a, &b).unwrap();
        let scale = b.iter().fold(1.0, |acc: f64, v| libm::fmax(acc, v.abs()));
        prop_assert!(solution.residual_norm() < 1e-9 * scale);
    }

    #[test]
    fn gauss_seidel_matches_lu_on_dominant_systems((a, b) in (2usize..6).prop_flat_map(system)) {
        let direct = lu_solve(&a, &b).unwrap();
        let iterative = gauss_seidel(&a, &b, SeidelConfig::default().with_tolerance(1e-10)).unwrap();
        prop_assert!(iterative.converged());
        prop_assert!(iterative.warnings().is_empty());
        for (xi, yi) in iterative.x().iter().zip(direct.x()) {
            assert_nearly_eq(*xi, *yi, 1e-6);
        }
    }

    #[test]
    fn bisection_finds_a_linear_root(
        root in -50.0..50.0f64,
        left in 0.01..20.0f64,
        right in 0.01..20.0f64,
        slope in prop_oneof![-5.0..-0.1f64, 0.1..5.0f64],
    ) {
        let f = |x: f64| slope * (x - root);
        let interval = Interval::new(root - left, root + right).unwrap();
        let config = BisectionConfig::default();
        let outcome = bisect(&f, interval, config).unwrap();
        // |f(c)| < tol with |slope| >= 0.1 puts c within 10·tol of the root.
        prop_assert!((outcome.root() - root).abs() <= 10.0 * config.tolerance);
        prop_assert!(outcome.converged());
        // Either the value is already tiny, or the bracket shrank below tolerance.
        prop_assert!(
            outcome.value().abs() < config.tolerance || outcome.final_measure() < config.tolerance
        );
        for record in outcome.trace() {
            let expected = interval.length() / 2f64.powi(record.index as i32);
            assert_nearly_eq(record.measure, expected, 1e-11);
        }
    }

    #[test]
    fn display_reparses(expr in arb_expr()) {
        let printed = expr.to_string();
        let reparsed = Expr::parse(&printed).unwrap();
        prop_assert_eq!(reparsed, expr);
    }
}
