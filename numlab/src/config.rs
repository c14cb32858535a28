//! Checks shared by every solver's `Config::validate`.

use crate::SolverError;

pub(crate) fn check_tolerance(tolerance: f64) -> Result<(), SolverError> {
    if tolerance > 0.0 && tolerance.is_finite() {
        Ok(())
    } else {
        Err(SolverError::InvalidTolerance { tolerance })
    }
}

pub(crate) fn check_iteration_limit(max_iterations: usize) -> Result<(), SolverError> {
    if max_iterations == 0 {
        return Err(SolverError::InvalidIterationLimit);
    }
    Ok(())
}

pub(crate) fn check_step(step: f64) -> Result<(), SolverError> {
    if step > 0.0 && step.is_finite() {
        Ok(())
    } else {
        Err(SolverError::InvalidStep { step })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_nonsense() {
        assert_eq!(
            check_tolerance(0.0),
            Err(SolverError::InvalidTolerance { tolerance: 0.0 })
        );
        assert!(matches!(
            check_tolerance(f64::NAN),
            Err(SolverError::InvalidTolerance { .. })
        ));
        assert_eq!(
            check_iteration_limit(0),
            Err(SolverError::InvalidIterationLimit)
        );
        assert_eq!(
            check_step(-0.1),
            Err(SolverError::InvalidStep { step: -0.1 })
        );
        assert_eq!(check_step(0.1), Ok(()));
    }
}
