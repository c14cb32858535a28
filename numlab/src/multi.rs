//! Solvers for functions of several variables.

mod descent;
mod newton;

pub use descent::{DescentConfig, DescentOutcome, DescentStep, coordinate_descent};
pub use newton::{NewtonConfig, NewtonOutcome, NewtonStep, StepSolver, newton};
