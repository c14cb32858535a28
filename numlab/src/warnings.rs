use faer::Mat;

/// Something a caller should know about a solve which didn't stop it.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Warning {
    /// What happened.
    pub content: WarningContent,
}

impl From<WarningContent> for Warning {
    fn from(content: WarningContent) -> Self {
        Self { content }
    }
}

/// The kinds of [`Warning`].
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(PartialEq))]
#[non_exhaustive]
pub enum WarningContent {
    /// This row of the matrix isn't strictly diagonally dominant, so Gauss-Seidel
    /// might not converge. It often still does.
    NotDiagonallyDominant {
        /// Zero-based row.
        row: usize,
        /// |A\[row\]\[row\]|
        diagonal: f64,
        /// Sum of |A\[row\]\[j\]| for j ≠ row.
        off_diagonal_sum: f64,
    },
    /// The solver stopped at its iteration cap before meeting its tolerance.
    IterationLimitReached {
        /// The cap that was hit.
        limit: usize,
    },
    /// Bracketing kept walking downhill without finding a rise,
    /// so the returned bracket might not contain a minimum.
    BracketExpansionExhausted {
        /// How many expansions were tried.
        expansions: usize,
    },
    /// The three quadrature estimates were too close together to estimate an order.
    OrderUndefined,
}

impl std::fmt::Display for WarningContent {
    #[mutants::skip]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningContent::NotDiagonallyDominant {
                row,
                diagonal,
                off_diagonal_sum,
            } => write!(
                f,
                "Row {row} is not diagonally dominant (|diagonal| = {diagonal}, sum of the rest = {off_diagonal_sum}), so Gauss-Seidel may not converge"
            ),
            WarningContent::IterationLimitReached { limit } => write!(
                f,
                "Stopped after the maximum of {limit} iterations without reaching the tolerance"
            ),
            WarningContent::BracketExpansionExhausted { expansions } => write!(
                f,
                "No rise was found after {expansions} bracket expansions; the function may be unbounded below in this direction"
            ),
            WarningContent::OrderUndefined => write!(
                f,
                "Successive estimates barely differ, so the order of accuracy can't be estimated"
            ),
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.content.fmt(f)
    }
}

/// Check strict diagonal dominance, |A\[i\]\[i\]| > Σ_{j≠i} |A\[i\]\[j\]|, row by row.
/// Returns one warning per offending row. Only rows within the matrix's
/// square part are checked.
pub fn lint_diagonal_dominance(a: &Mat<f64>) -> Vec<Warning> {
    let n = a.nrows().min(a.ncols());
    let mut warnings = Vec::default();
    for row in 0..n {
        let diagonal = a[(row, row)].abs();
        let off_diagonal_sum: f64 = (0..a.ncols())
            .filter(|&col| col != row)
            .map(|col| a[(row, col)].abs())
            .sum();
        if diagonal <= off_diagonal_sum {
            warnings.push(Warning::from(WarningContent::NotDiagonallyDominant {
                row,
                diagonal,
                off_diagonal_sum,
            }));
        }
    }
    warnings
}
