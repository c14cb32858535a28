/// Errors from evaluating a user-supplied function.
/// Solvers surface these verbatim inside [`SolverError::Evaluation`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EvalError {
    /// The expression referred to a variable that has no value.
    #[error("Variable {name} is not defined")]
    UndefinedVariable {
        /// Name of the missing variable.
        name: String,
    },
    /// A function was called outside its real domain, e.g. `log(-1)`.
    #[error("{function}({argument}) is undefined over the reals")]
    Domain {
        /// Name of the function.
        function: &'static str,
        /// The offending argument.
        argument: f64,
    },
    /// Division by exactly zero.
    #[error("Division by zero")]
    DivisionByZero,
}

/// Errors from parsing the textual expression language.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Could not parse expression at offset {offset}: {message}")]
pub struct ExprError {
    /// Byte offset into the source where parsing stopped.
    pub offset: usize,
    /// What the parser expected.
    pub message: String,
}

/// Everything that can stop a solver.
/// Structural problems with the inputs are reported immediately,
/// naming the offending value.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SolverError {
    /// The interval is empty or reversed.
    #[error("Interval [{lo}, {hi}] is invalid: the lower bound must be below the upper bound")]
    InvalidInterval {
        /// Lower bound as given.
        lo: f64,
        /// Upper bound as given.
        hi: f64,
    },
    /// The function does not change sign over the bracket.
    #[error(
        "Function does not change sign on [{lo}, {hi}]: f({lo}) = {f_lo}, f({hi}) = {f_hi}"
    )]
    NoSignChange {
        /// Lower bound.
        lo: f64,
        /// Upper bound.
        hi: f64,
        /// Function value at the lower bound.
        f_lo: f64,
        /// Function value at the upper bound.
        f_hi: f64,
    },
    /// A pivot of the matrix was (nearly) zero.
    #[error("Matrix is singular: pivot {pivot} is {value:e}")]
    SingularMatrix {
        /// Zero-based row/column of the offending pivot.
        pivot: usize,
        /// The pivot's value.
        value: f64,
    },
    /// The Jacobian could not be inverted during Newton's method.
    #[error("Jacobian is singular at Newton iteration {iteration} (pivot or determinant {value:e})")]
    SingularJacobian {
        /// 1-based Newton iteration at which the Jacobian was singular.
        iteration: usize,
        /// The near-zero pivot or determinant.
        value: f64,
    },
    /// Linear solvers need a square matrix.
    #[error("Matrix must be square, but it has {rows} rows and {cols} columns")]
    NotSquare {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },
    /// A vector had the wrong length for the system.
    #[error("Expected a vector of length {expected}, but got {actual}")]
    DimensionMismatch {
        /// Length the system requires.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },
    /// A system with no unknowns.
    #[error("Cannot solve an empty system")]
    EmptySystem,
    /// Tolerances must be positive and finite.
    #[error("Tolerance must be positive and finite, but was {tolerance}")]
    InvalidTolerance {
        /// The tolerance given.
        tolerance: f64,
    },
    /// Step sizes must be positive and finite.
    #[error("Step size must be positive and finite, but was {step}")]
    InvalidStep {
        /// The step given.
        step: f64,
    },
    /// Bracketing must grow its step each time it walks.
    #[error("Bracket expansion factor must be greater than 1, but was {factor}")]
    InvalidExpansion {
        /// The factor given.
        factor: f64,
    },
    /// Iterative solvers need room for at least one iteration.
    #[error("Iteration limit must be at least 1")]
    InvalidIterationLimit,
    /// Quadrature needs at least one subinterval.
    #[error("Quadrature needs at least one subinterval")]
    ZeroSubintervals,
    /// The function returned NaN or an infinity.
    #[error("Function value at {at:?} is not finite ({value})")]
    NonFiniteValue {
        /// Where the function was evaluated.
        at: Vec<f64>,
        /// What it returned.
        value: f64,
    },
    /// A matrix or vector entry given to, or produced by, a linear solver is NaN or infinite.
    #[error("{operand}[{row}][{col}] is {value}, but every entry must be finite")]
    NonFiniteEntry {
        /// `A`, `b` or `x0` as given, or a computed `U` pivot or solution `x`.
        operand: &'static str,
        /// Row of the entry.
        row: usize,
        /// Column of the entry, 0 for vectors.
        col: usize,
        /// The entry itself.
        value: f64,
    },
    /// The order estimate refines the grid to 4·n subintervals, which must fit in a `usize`.
    #[error("{n} subintervals is too many: the finest grid would need 4·{n}")]
    TooManySubintervals {
        /// Subintervals on the coarsest grid.
        n: usize,
    },
    /// The user's function could not be evaluated.
    #[error("{0}")]
    Evaluation(#[from] EvalError),
    /// Interpolation was requested outside the node span.
    #[error("{x} lies outside the interpolation range [{lo}, {hi}]")]
    OutOfRange {
        /// Requested abscissa.
        x: f64,
        /// First node.
        lo: f64,
        /// Last node.
        hi: f64,
    },
    /// Interpolation needs at least two nodes.
    #[error("Interpolation needs at least 2 nodes, but got {count}")]
    TooFewNodes {
        /// How many nodes were given.
        count: usize,
    },
    /// Interpolation nodes must be strictly increasing.
    #[error("Interpolation nodes must be strictly increasing, but node {index} is not")]
    UnsortedNodes {
        /// Index of the first node that breaks the ordering.
        index: usize,
    },
}

impl SolverError {
    /// Is this one of the ways a bracket can be unusable (reversed, or no sign change)?
    pub fn is_invalid_bracket(&self) -> bool {
        matches!(
            self,
            SolverError::InvalidInterval { .. } | SolverError::NoSignChange { .. }
        )
    }

    /// Did a near-zero pivot or determinant stop the solve?
    pub fn is_singular(&self) -> bool {
        matches!(
            self,
            SolverError::SingularMatrix { .. } | SolverError::SingularJacobian { .. }
        )
    }
}
