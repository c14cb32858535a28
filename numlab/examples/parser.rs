//! Parse formulas, then hand them to the solvers.
use numlab::{
    Bindings, Expr, ExprSystem,
    multi::{NewtonConfig, newton},
};

const EPSILON: f64 = 1e-5;

fn main() {
    let circle = Expr::parse("x^2 + y^2 - 4").unwrap();
    let line = Expr::parse("y - x").unwrap();
    println!("parsed as {circle} and {line}");
    let bindings = Bindings::new().with("x", 1.0).with("y", 1.0);
    println!("at (1, 1): {}", circle.eval(&bindings).unwrap());

    let system = ExprSystem::new(vec![circle, line], vec!["x".to_owned(), "y".to_owned()]).unwrap();
    let outcome = newton(&system, &[1.0, 1.0], NewtonConfig::default()).unwrap();
    let [x, y] = [outcome.x()[0], outcome.x()[1]];
    println!("intersection at ({x}, {y}) after {} iterations", outcome.iterations());
    assert!((x - 2f64.sqrt()).abs() < EPSILON);
    assert!((y - 2f64.sqrt()).abs() < EPSILON);
}
