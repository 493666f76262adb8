use dispatch_solver::SolverError;
use thiserror::Error;

/// Malformed or inconsistent input, detected before any model is built
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Length mismatch: horizon is {horizon} but got {prices} prices and {pv_ratio} PV ratios")]
    LengthMismatch {
        horizon: usize,
        prices: usize,
        pv_ratio: usize,
    },
    #[error("Empty horizon: at least one price step is required")]
    EmptyHorizon,
    #[error("Non-finite value in {0}")]
    NonFinite(String),
    #[error("{field} must be non-negative, got {value}")]
    Negative { field: String, value: f64 },
    #[error("{field} must lie in [0, 1], got {value}")]
    OutOfRange { field: String, value: f64 },
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Solver backend failure: {0}")]
    Backend(#[from] SolverError),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Format error: {0}")]
    Format(String),
}
