use faer::Mat;

use super::{
    PIVOT_THRESHOLD, check_finite_matrix, check_finite_vector, check_shape, residual,
};
use crate::{SolverError, function::norm2};

/// A = L·U, with L unit lower triangular and U upper triangular.
#[derive(Debug, Clone)]
pub struct LuDecomposition {
    /// Unit lower triangular factor.
    pub l: Mat<f64>,
    /// Upper triangular factor.
    pub u: Mat<f64>,
}

impl LuDecomposition {
    /// Size of the factored matrix.
    pub fn dim(&self) -> usize {
        self.u.nrows()
    }

    /// Solve A·x = b by forward substitution (L·y = b) then back substitution (U·x = y).
    pub fn solve(&self, b: &[f64]) -> Result<Vec<f64>, SolverError> {
        let n = self.dim();
        if b.len() != n {
            return Err(SolverError::DimensionMismatch {
                expected: n,
                actual: b.len(),
            });
        }
        check_finite_vector("b", b)?;
        let mut y = vec![0.0; n];
        for i in 0..n {
            let sum: f64 = (0..i).map(|j| self.l[(i, j)] * y[j]).sum();
            y[i] = b[i] - sum;
        }
        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let sum: f64 = (i + 1..n).map(|j| self.u[(i, j)] * x[j]).sum();
            x[i] = (y[i] - sum) / self.u[(i, i)];
        }
        check_finite_vector("x", &x)?;
        Ok(x)
    }

    /// L·U, which should equal the original matrix up to rounding.
    pub fn reconstruct(&self) -> Mat<f64> {
        &self.l * &self.u
    }
}

/// Factor A = L·U without pivoting.
/// Fails if a pivot is smaller than [`PIVOT_THRESHOLD`]; rows are never reordered,
/// so some invertible matrices (e.g. a zero in the top-left corner) can't be factored.
/// Entries of A must be finite, and so must every pivot.
pub fn lu_decompose(a: &Mat<f64>) -> Result<LuDecomposition, SolverError> {
    let (rows, cols) = (a.nrows(), a.ncols());
    if rows != cols {
        return Err(SolverError::NotSquare { rows, cols });
    }
    if rows == 0 {
        return Err(SolverError::EmptySystem);
    }
    check_finite_matrix(a)?;
    let n = rows;
    let mut l = Mat::<f64>::identity(n, n);
    let mut u = Mat::<f64>::zeros(n, n);
    for i in 0..n {
        // Row i of U.
        for k in i..n {
            let sum: f64 = (0..i).map(|j| l[(i, j)] * u[(j, k)]).sum();
            u[(i, k)] = a[(i, k)] - sum;
        }
        let pivot = u[(i, i)];
        if !pivot.is_finite() {
            return Err(SolverError::NonFiniteEntry {
                operand: "U",
                row: i,
                col: i,
                value: pivot,
            });
        }
        if pivot.abs() < PIVOT_THRESHOLD {
            return Err(SolverError::SingularMatrix { pivot: i, value: pivot });
        }
        // Column i of L.
        for k in i + 1..n {
            let sum: f64 = (0..i).map(|j| l[(k, j)] * u[(j, i)]).sum();
            l[(k, i)] = (a[(k, i)] - sum) / pivot;
        }
    }
    Ok(LuDecomposition { l, u })
}

/// Result of [`lu_solve`].
#[derive(Debug, Clone)]
pub struct LuSolution {
    pub(crate) x: Vec<f64>,
    pub(crate) decomposition: LuDecomposition,
    pub(crate) residual: Vec<f64>,
    pub(crate) residual_norm: f64,
}

impl LuSolution {
    /// The solution vector.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// The factors that produced it.
    pub fn decomposition(&self) -> &LuDecomposition {
        &self.decomposition
    }

    /// A·x − b, elementwise.
    pub fn residual(&self) -> &[f64] {
        &self.residual
    }

    /// ‖A·x − b‖₂, which should be near machine precision.
    pub fn residual_norm(&self) -> f64 {
        self.residual_norm
    }
}

/// Solve A·x = b by LU decomposition, and check the answer.
pub fn lu_solve(a: &Mat<f64>, b: &[f64]) -> Result<LuSolution, SolverError> {
    check_shape(a, b)?;
    let decomposition = lu_decompose(a)?;
    let x = decomposition.solve(b)?;
    let residual = residual(a, &x, b)?;
    let residual_norm = norm2(&residual);
    Ok(LuSolution {
        x,
        decomposition,
        residual,
        residual_norm,
    })
}
