#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use numlab::{
    Expr, Interval,
    scalar::{BisectionConfig, Goal, ParabolicConfig, bisect, parabolic_in},
};

fuzz_target!(|setup: Setup| {
    // Parsing must never panic, whatever the input.
    let Ok(expr) = Expr::parse(&setup.formula) else {
        return;
    };
    let Ok(interval) = Interval::new(setup.lo, setup.hi) else {
        return;
    };
    let f = expr.scalar("x");
    let mut bisection = setup.bisection;
    bisection.max_iterations = bisection.max_iterations.min(200);
    let _ = bisect(&f, interval, bisection);
    let mut parabolic = setup.parabolic;
    parabolic.max_iterations = parabolic.max_iterations.min(200);
    let _ = parabolic_in(&f, interval, setup.goal, parabolic);
});

#[derive(Debug, Arbitrary)]
struct Setup {
    formula: String,
    lo: f64,
    hi: f64,
    bisection: BisectionConfig,
    parabolic: ParabolicConfig,
    goal: Goal,
}
