use dispatch_solver::{ConstraintId, LpBackend, Solution, SolutionStatus, Solver, SolverError, VarId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::builder::DispatchModel;

/// Per-call solve configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    /// Attach shadow prices to the result
    pub extract_duals: bool,
    /// Let the backend log its progress
    pub solver_output: bool,
}

/// Hands a built model to an LP backend
#[derive(Debug, Clone)]
pub struct SolverAdapter<B = Solver> {
    backend: B,
}

impl SolverAdapter<Solver> {
    /// Default simplex backend, verbose when `solver_output` is set
    pub fn from_options(options: &SolveOptions) -> Self {
        Self::new(Solver::new().with_verbose(options.solver_output))
    }
}

impl<B: LpBackend> SolverAdapter<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Solve the model, blocking until the backend returns
    ///
    /// Infeasible and unbounded models are reported through the outcome's
    /// status; only a backend failure is an error.
    pub fn solve(&self, model: &DispatchModel) -> Result<SolveOutcome, SolverError> {
        let solution = self.backend.solve(model.problem())?;

        match solution.status {
            SolutionStatus::Optimal => {
                info!(objective = solution.objective_value, "dispatch model solved")
            }
            status => warn!(status = status.label(), code = status.code(), "dispatch model has no solution"),
        }

        Ok(SolveOutcome { solution })
    }
}

/// Status and solution values of one solve
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    solution: Solution,
}

impl SolveOutcome {
    pub fn status(&self) -> SolutionStatus {
        self.solution.status
    }

    pub fn solution_count(&self) -> usize {
        self.solution.solution_count()
    }

    pub fn objective(&self) -> Option<f64> {
        self.has_solution().then_some(self.solution.objective_value)
    }

    /// Optimal value of a variable, `None` without a solution
    pub fn value(&self, var: VarId) -> Option<f64> {
        if !self.has_solution() {
            return None;
        }
        self.solution.values.get(var.index()).copied()
    }

    /// Dual value of a row, `None` without a solution
    pub fn dual(&self, row: ConstraintId) -> Option<f64> {
        if !self.has_solution() {
            return None;
        }
        self.solution.duals.get(row.index()).copied()
    }

    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    fn has_solution(&self) -> bool {
        self.solution_count() > 0
    }
}
