//! Dense linear systems `A·x = b`.
//!
//! Both solvers borrow the caller's matrix and never modify it.

mod lu;
mod seidel;

use faer::Mat;

pub use lu::{LuDecomposition, LuSolution, lu_decompose, lu_solve};
pub use seidel::{SeidelConfig, SeidelOutcome, gauss_seidel, gauss_seidel_from};

use crate::{SolverError, function::norm2};

/// Pivots (and Gauss-Seidel diagonals) smaller than this in magnitude are treated as zero.
pub const PIVOT_THRESHOLD: f64 = 1e-10;

/// r = A·x − b
pub fn residual(a: &Mat<f64>, x: &[f64], b: &[f64]) -> Result<Vec<f64>, SolverError> {
    let n = check_shape(a, b)?;
    if x.len() != n {
        return Err(SolverError::DimensionMismatch {
            expected: n,
            actual: x.len(),
        });
    }
    Ok((0..n)
        .map(|i| {
            let ax: f64 = (0..n).map(|j| a[(i, j)] * x[j]).sum();
            ax - b[i]
        })
        .collect())
}

/// ‖A·x − b‖₂
pub fn residual_norm(a: &Mat<f64>, x: &[f64], b: &[f64]) -> Result<f64, SolverError> {
    residual(a, x, b).map(|r| norm2(&r))
}

/// Check that `a` is a non-empty square matrix and `b` fits it. Returns n.
fn check_shape(a: &Mat<f64>, b: &[f64]) -> Result<usize, SolverError> {
    let (rows, cols) = (a.nrows(), a.ncols());
    if rows != cols {
        return Err(SolverError::NotSquare { rows, cols });
    }
    if rows == 0 {
        return Err(SolverError::EmptySystem);
    }
    if b.len() != rows {
        return Err(SolverError::DimensionMismatch {
            expected: rows,
            actual: b.len(),
        });
    }
    Ok(rows)
}

fn check_finite_matrix(a: &Mat<f64>) -> Result<(), SolverError> {
    for col in 0..a.ncols() {
        for row in 0..a.nrows() {
            let value = a[(row, col)];
            if !value.is_finite() {
                return Err(SolverError::NonFiniteEntry {
                    operand: "A",
                    row,
                    col,
                    value,
                });
            }
        }
    }
    Ok(())
}

fn check_finite_vector(operand: &'static str, v: &[f64]) -> Result<(), SolverError> {
    match v.iter().position(|value| !value.is_finite()) {
        Some(row) => Err(SolverError::NonFiniteEntry {
            operand,
            row,
            col: 0,
            value: v[row],
        }),
        None => Ok(()),
    }
}
