mod backend;
mod expr;
mod problem;
mod simplex;
mod solution;

pub use backend::{LpBackend, SolverError};
pub use expr::{LinearExpr, VarId};
pub use problem::{Constraint, ConstraintId, ConstraintOp, LpProblem, Objective, Variable};
pub use simplex::Solver;
pub use solution::{Analysis, ConstraintViolation, ReducedCost, ShadowPrice, Solution, SolutionStatus};
