//! A small, closed expression language for user-supplied formulas.
//!
//! ```text
//! expr  := term (('+' | '-') term)*
//! term  := unary (('*' | '/') unary)*
//! unary := '-' unary | power
//! power := atom ('^' unary)?
//! atom  := number | func '(' expr ')' | 'pow' '(' expr ',' expr ')' | ident | '(' expr ')'
//! ```
//!
//! `^` is right-associative and binds tighter than unary minus, so `-x^2` is `-(x^2)`.
//! `pi` and `e` are constants; any other identifier is a variable.

mod parser;

use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};
use winnow::Parser;

use crate::{BivariateFunction, EvalError, ExprError, NonlinearSystem, ScalarFunction, SolverError};

/// A parsed formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal.
    Number(f64),
    /// `pi` or `e`.
    Constant(Constant),
    /// A free variable, resolved at evaluation time.
    Variable(String),
    /// `-expr`
    Neg(Box<Expr>),
    /// `lhs op rhs`
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// `func(arg)`
    Call(Func, Box<Expr>),
}

/// Named constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
    /// π
    Pi,
    /// Euler's number.
    E,
}

impl Constant {
    fn value(self) -> f64 {
        match self {
            Constant::Pi => std::f64::consts::PI,
            Constant::E => std::f64::consts::E,
        }
    }
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `^`, also written `pow(a, b)`.
    Pow,
}

impl BinaryOp {
    fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
            BinaryOp::Pow => '^',
        }
    }
}

/// The functions a formula may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    /// Natural logarithm.
    Log,
    Log10,
    Sqrt,
    Abs,
}

impl Func {
    /// Every function, for listing in error messages and help text.
    pub const ALL: [Func; 14] = [
        Func::Sin,
        Func::Cos,
        Func::Tan,
        Func::Asin,
        Func::Acos,
        Func::Atan,
        Func::Sinh,
        Func::Cosh,
        Func::Tanh,
        Func::Exp,
        Func::Log,
        Func::Log10,
        Func::Sqrt,
        Func::Abs,
    ];

    /// The name used in formulas.
    pub fn name(self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Asin => "asin",
            Func::Acos => "acos",
            Func::Atan => "atan",
            Func::Sinh => "sinh",
            Func::Cosh => "cosh",
            Func::Tanh => "tanh",
            Func::Exp => "exp",
            Func::Log => "log",
            Func::Log10 => "log10",
            Func::Sqrt => "sqrt",
            Func::Abs => "abs",
        }
    }

    /// Look up a function by name. `ln`, `arcsin`, `arccos` and `arctan` are accepted as aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        let alias = match name {
            "ln" => Some(Func::Log),
            "arcsin" => Some(Func::Asin),
            "arccos" => Some(Func::Acos),
            "arctan" => Some(Func::Atan),
            _ => None,
        };
        alias.or_else(|| Self::ALL.into_iter().find(|f| f.name() == name))
    }

    fn apply(self, x: f64) -> Result<f64, EvalError> {
        let domain = |function| EvalError::Domain {
            function,
            argument: x,
        };
        Ok(match self {
            Func::Sin => libm::sin(x),
            Func::Cos => libm::cos(x),
            Func::Tan => libm::tan(x),
            Func::Asin if !(-1.0..=1.0).contains(&x) => return Err(domain("asin")),
            Func::Asin => libm::asin(x),
            Func::Acos if !(-1.0..=1.0).contains(&x) => return Err(domain("acos")),
            Func::Acos => libm::acos(x),
            Func::Atan => libm::atan(x),
            Func::Sinh => libm::sinh(x),
            Func::Cosh => libm::cosh(x),
            Func::Tanh => libm::tanh(x),
            Func::Exp => libm::exp(x),
            Func::Log if x <= 0.0 => return Err(domain("log")),
            Func::Log => libm::log(x),
            Func::Log10 if x <= 0.0 => return Err(domain("log10")),
            Func::Log10 => libm::log10(x),
            Func::Sqrt if x < 0.0 => return Err(domain("sqrt")),
            Func::Sqrt => libm::sqrt(x),
            Func::Abs => libm::fabs(x),
        })
    }
}

/// Values for an expression's variables, kept in the order they were declared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings(IndexMap<String, f64>);

impl Bindings {
    /// No variables bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind (or rebind) a variable.
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    /// Builder form of [`Self::set`].
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set(name, value);
        self
    }

    /// The value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Bound variables in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Expr {
    /// Parse a formula.
    pub fn parse(src: &str) -> Result<Self, ExprError> {
        parser::formula.parse(src).map_err(|e| ExprError {
            offset: e.offset(),
            message: e.inner().to_string(),
        })
    }

    pub(crate) fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    /// Evaluate with the given variable values.
    pub fn eval(&self, bindings: &Bindings) -> Result<f64, EvalError> {
        self.eval_with(&|name| bindings.get(name))
    }

    fn eval_with<L>(&self, lookup: &L) -> Result<f64, EvalError>
    where
        L: Fn(&str) -> Option<f64>,
    {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Constant(c) => Ok(c.value()),
            Expr::Variable(name) => {
                lookup(name).ok_or_else(|| EvalError::UndefinedVariable { name: name.clone() })
            }
            Expr::Neg(e) => Ok(-e.eval_with(lookup)?),
            Expr::Binary(op, lhs, rhs) => {
                let l = lhs.eval_with(lookup)?;
                let r = rhs.eval_with(lookup)?;
                match op {
                    BinaryOp::Add => Ok(l + r),
                    BinaryOp::Sub => Ok(l - r),
                    BinaryOp::Mul => Ok(l * r),
                    BinaryOp::Div if r == 0.0 => Err(EvalError::DivisionByZero),
                    BinaryOp::Div => Ok(l / r),
                    BinaryOp::Pow => pow(l, r),
                }
            }
            Expr::Call(func, arg) => func.apply(arg.eval_with(lookup)?),
        }
    }

    /// Free variables, in order of first use.
    pub fn variables(&self) -> IndexSet<String> {
        let mut vars = IndexSet::new();
        self.collect_variables(&mut vars);
        vars
    }

    fn collect_variables(&self, vars: &mut IndexSet<String>) {
        match self {
            Expr::Number(_) | Expr::Constant(_) => {}
            Expr::Variable(name) => {
                vars.insert(name.clone());
            }
            Expr::Neg(e) | Expr::Call(_, e) => e.collect_variables(vars),
            Expr::Binary(_, lhs, rhs) => {
                lhs.collect_variables(vars);
                rhs.collect_variables(vars);
            }
        }
    }

    /// View this as a function of one variable. Any other variable is undefined.
    pub fn scalar<'e>(&'e self, var: &'e str) -> ScalarExpr<'e> {
        ScalarExpr { expr: self, var }
    }

    /// View this as a function of two variables. Any other variable is undefined.
    pub fn bivariate<'e>(&'e self, x: &'e str, y: &'e str) -> BivariateExpr<'e> {
        BivariateExpr { expr: self, x, y }
    }
}

fn pow(base: f64, exponent: f64) -> Result<f64, EvalError> {
    if base < 0.0 && exponent.fract() != 0.0 {
        return Err(EvalError::Domain {
            function: "pow",
            argument: base,
        });
    }
    if base == 0.0 && exponent < 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    Ok(libm::pow(base, exponent))
}

impl FromStr for Expr {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{n}"),
            Expr::Constant(Constant::Pi) => write!(f, "pi"),
            Expr::Constant(Constant::E) => write!(f, "e"),
            Expr::Variable(name) => write!(f, "{name}"),
            Expr::Neg(e) => write!(f, "(-{e})"),
            Expr::Binary(op, lhs, rhs) => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Expr::Call(func, arg) => write!(f, "{}({arg})", func.name()),
        }
    }
}

/// An [`Expr`] as a [`ScalarFunction`] of one named variable.
#[derive(Debug, Clone, Copy)]
pub struct ScalarExpr<'e> {
    expr: &'e Expr,
    var: &'e str,
}

impl ScalarFunction for ScalarExpr<'_> {
    fn eval(&self, x: f64) -> Result<f64, EvalError> {
        self.expr.eval_with(&|name| (name == self.var).then_some(x))
    }
}

/// An [`Expr`] as a [`BivariateFunction`] of two named variables.
#[derive(Debug, Clone, Copy)]
pub struct BivariateExpr<'e> {
    expr: &'e Expr,
    x: &'e str,
    y: &'e str,
}

impl BivariateFunction for BivariateExpr<'_> {
    fn eval(&self, x: f64, y: f64) -> Result<f64, EvalError> {
        self.expr.eval_with(&|name| {
            if name == self.x {
                Some(x)
            } else if name == self.y {
                Some(y)
            } else {
                None
            }
        })
    }
}

/// A system of equations `expr_i = 0` over named unknowns, with a numeric Jacobian.
#[derive(Debug, Clone)]
pub struct ExprSystem {
    equations: Vec<Expr>,
    unknowns: Vec<String>,
}

impl ExprSystem {
    /// One equation per unknown.
    pub fn new(equations: Vec<Expr>, unknowns: Vec<String>) -> Result<Self, SolverError> {
        if equations.is_empty() {
            return Err(SolverError::EmptySystem);
        }
        if equations.len() != unknowns.len() {
            return Err(SolverError::DimensionMismatch {
                expected: unknowns.len(),
                actual: equations.len(),
            });
        }
        Ok(Self {
            equations,
            unknowns,
        })
    }

    /// Names of the unknowns, in the order solvers see them.
    pub fn unknowns(&self) -> &[String] {
        &self.unknowns
    }
}

impl NonlinearSystem for ExprSystem {
    fn dim(&self) -> usize {
        self.unknowns.len()
    }

    fn residual(&self, x: &[f64], out: &mut [f64]) -> Result<(), EvalError> {
        let lookup = |name: &str| {
            self.unknowns
                .iter()
                .position(|u| u == name)
                .map(|i| x[i])
        };
        for (eq, slot) in self.equations.iter().zip(out.iter_mut()) {
            *slot = eq.eval_with(&lookup)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str, bindings: &Bindings) -> Result<f64, EvalError> {
        Expr::parse(src).unwrap().eval(bindings)
    }

    #[test]
    fn precedence_and_associativity() {
        let b = Bindings::new().with("x", 3.0);
        assert_eq!(eval("1 + 2 * 3", &b), Ok(7.0));
        assert_eq!(eval("(1 + 2) * 3", &b), Ok(9.0));
        assert_eq!(eval("2 ^ 3 ^ 2", &b), Ok(512.0));
        assert_eq!(eval("-x^2", &b), Ok(-9.0));
        assert_eq!(eval("2^-1", &b), Ok(0.5));
        assert_eq!(eval("8 / 4 / 2", &b), Ok(1.0));
        assert_eq!(eval("10 - 4 - 3", &b), Ok(3.0));
        assert_eq!(eval("pow(x, 2) + 1", &b), Ok(10.0));
    }

    #[test]
    fn numbers() {
        let b = Bindings::new();
        assert_eq!(eval("1.5e2", &b), Ok(150.0));
        assert_eq!(eval(".25", &b), Ok(0.25));
        assert_eq!(eval("3.", &b), Ok(3.0));
        assert_eq!(eval("2E-1", &b), Ok(0.2));
    }

    #[test]
    fn constants_and_functions() {
        let b = Bindings::new();
        assert!((eval("sin(pi / 2)", &b).unwrap() - 1.0).abs() < 1e-15);
        assert!((eval("log(e)", &b).unwrap() - 1.0).abs() < 1e-15);
        assert_eq!(eval("log10(1000)", &b), Ok(3.0));
        assert_eq!(eval("abs(-2)", &b), Ok(2.0));
        assert_eq!(eval("sqrt(16)", &b), Ok(4.0));
        assert!((eval("arctan(1) * 4", &b).unwrap() - std::f64::consts::PI).abs() < 1e-15);
    }

    #[test]
    fn domain_errors() {
        let b = Bindings::new();
        assert_eq!(
            eval("log(-1)", &b),
            Err(EvalError::Domain {
                function: "log",
                argument: -1.0
            })
        );
        assert!(matches!(
            eval("sqrt(0 - 4)", &b),
            Err(EvalError::Domain {
                function: "sqrt",
                ..
            })
        ));
        assert!(matches!(
            eval("asin(2)", &b),
            Err(EvalError::Domain { .. })
        ));
        assert_eq!(eval("1 / 0", &b), Err(EvalError::DivisionByZero));
        assert!(matches!(
            eval("(-8) ^ 0.5", &b),
            Err(EvalError::Domain {
                function: "pow",
                ..
            })
        ));
        assert_eq!(eval("(-2) ^ 3", &b), Ok(-8.0));
    }

    #[test]
    fn undefined_variables() {
        assert_eq!(
            eval("x + y", &Bindings::new().with("x", 1.0)),
            Err(EvalError::UndefinedVariable {
                name: "y".to_owned()
            })
        );
    }

    #[test]
    fn variables_in_first_use_order() {
        let e = Expr::parse("b * a + sin(b) - c").unwrap();
        let vars: Vec<_> = e.variables().into_iter().collect();
        assert_eq!(vars, vec!["b", "a", "c"]);
        assert!(Expr::parse("pi * e").unwrap().variables().is_empty());
    }

    #[test]
    fn display_reparses_to_the_same_tree() {
        for src in [
            "-x^2 + 3*x - 1",
            "sin(x) / (1 + cos(y))",
            "2 ^ 3 ^ x",
            "pow(x, 0.5) * log10(x)",
            "-(-x)",
        ] {
            let e = Expr::parse(src).unwrap();
            let again = Expr::parse(&e.to_string()).unwrap();
            assert_eq!(e, again, "{src} printed as {e}");
        }
    }

    #[test]
    fn parse_errors() {
        for bad in ["", "1 +", "foo(2)", "(1", "2 3", "sin 2", "1 ** 2", "x $ y"] {
            assert!(
                matches!(Expr::parse(bad), Err(ExprError { .. })),
                "{bad:?} should not parse"
            );
        }
        let err = Expr::parse("1 + )").unwrap_err();
        assert!(err.offset <= 4);
    }

    #[test]
    fn deep_nesting_is_an_error_not_a_crash() {
        let src = format!("{}x{}", "(".repeat(10_000), ")".repeat(10_000));
        let err = Expr::parse(&src).unwrap_err();
        assert!(err.message.contains("levels of nesting"), "{}", err.message);
        assert!(err.offset > parser::MAX_DEPTH && err.offset < 10_000, "{}", err.offset);
        let err = Expr::parse(&"-".repeat(10_000)).unwrap_err();
        assert!(err.message.contains("levels of nesting"), "{}", err.message);
    }

    #[test]
    fn adapters() {
        let e = Expr::parse("x^3 - x - 2").unwrap();
        let f = e.scalar("x");
        assert_eq!(f.eval(2.0), Ok(4.0));

        let g = Expr::parse("x * y").unwrap();
        assert_eq!(g.bivariate("x", "y").eval(2.0, 3.0), Ok(6.0));
        assert_eq!(
            g.scalar("x").eval(1.0),
            Err(EvalError::UndefinedVariable {
                name: "y".to_owned()
            })
        );

        let system = ExprSystem::new(
            vec![
                Expr::parse("u + v - 3").unwrap(),
                Expr::parse("u - v - 1").unwrap(),
            ],
            vec!["u".to_owned(), "v".to_owned()],
        )
        .unwrap();
        let mut out = [0.0; 2];
        system.residual(&[2.0, 1.0], &mut out).unwrap();
        assert_eq!(out, [0.0, 0.0]);
        assert!(matches!(
            ExprSystem::new(vec![], vec![]),
            Err(SolverError::EmptySystem)
        ));
    }
}
