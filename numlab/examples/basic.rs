//! A basic example: find a root, then a minimum, and look at how the solvers got there.
use numlab::{
    Interval,
    scalar::{BisectionConfig, BracketConfig, GoldenConfig, bisect, minimize},
};

fn main() {
    // Bisection needs an interval over which the function changes sign.
    let f = |x: f64| x * x * x - x - 2.0;
    let interval = Interval::new(1.0, 2.0).unwrap();
    match bisect(&f, interval, BisectionConfig::default().with_tolerance(1e-8)) {
        Ok(outcome) => {
            println!(
                "root {} after {} halvings (f = {:e})",
                outcome.root(),
                outcome.iterations(),
                outcome.value()
            );
            for record in outcome.trace().iter().take(3) {
                println!("  #{}: interval length {}", record.index, record.measure);
            }
        }
        Err(e) => eprintln!("bisection failed: {e}"),
    }

    // Minimization starts from a single point: a bracket is found first,
    // then narrowed by golden-section search.
    let g = |x: f64| (x - 3.0) * (x - 3.0) + 1.0;
    let outcome = minimize(&g, 0.0, BracketConfig::default(), GoldenConfig::default()).unwrap();
    println!(
        "minimum {} at x = {}, bracket {:?}",
        outcome.value(),
        outcome.x(),
        outcome.bracket.interval()
    );
    for warning in outcome.warnings() {
        println!("warning: {warning}");
    }
}
