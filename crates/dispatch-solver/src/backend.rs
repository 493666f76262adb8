use thiserror::Error;

use crate::problem::LpProblem;
use crate::solution::Solution;

/// Failure of the solving backend itself, as opposed to an infeasible or
/// unbounded outcome which is reported through [`SolutionStatus`](crate::SolutionStatus)
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),
    #[error("Numerical failure: {0}")]
    Numerical(String),
}

/// A linear programming backend
///
/// Implementations receive a fully assembled problem and return either a
/// [`Solution`] carrying the solve status, or a [`SolverError`] when the
/// backend could not run at all.
pub trait LpBackend {
    fn solve(&self, problem: &LpProblem) -> Result<Solution, SolverError>;
}

impl<B: LpBackend + ?Sized> LpBackend for &B {
    fn solve(&self, problem: &LpProblem) -> Result<Solution, SolverError> {
        (**self).solve(problem)
    }
}

impl<B: LpBackend + ?Sized> LpBackend for Box<B> {
    fn solve(&self, problem: &LpProblem) -> Result<Solution, SolverError> {
        (**self).solve(problem)
    }
}
