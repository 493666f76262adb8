//! Hourly prosumer dispatch as a linear program.
//!
//! Raw input records are normalized into [`Parameters`], turned into a
//! [`DispatchModel`], solved through a pluggable LP backend and read back into
//! a [`DispatchResult`].

pub mod adapter;
pub mod builder;
pub mod error;
pub mod input;
pub mod io;
pub mod params;
pub mod result;

#[cfg(test)]
mod testing;

pub use adapter::{SolveOptions, SolveOutcome, SolverAdapter};
pub use builder::{ConstraintFamily, DispatchModel, DispatchVariables};
pub use error::{DispatchError, ValidationError};
pub use input::{ApplianceRecord, BusRecord, DerEntry, DerProductionRecord, LoadEntry, LoadPreference, RawInput, UsageRecord};
pub use io::{DataSource, ResultSink};
pub use params::Parameters;
pub use result::{DispatchResult, Duals, ResultExtractor, Series, Totals};

use dispatch_solver::{LpBackend, Solver};

/// Runs the whole pipeline for one input record at a time
///
/// Every call builds its own model and drops it once the result is extracted.
#[derive(Debug, Clone)]
pub struct Dispatcher<B = Solver> {
    options: SolveOptions,
    adapter: SolverAdapter<B>,
}

impl Dispatcher<Solver> {
    pub fn new(options: SolveOptions) -> Self {
        Self {
            options,
            adapter: SolverAdapter::from_options(&options),
        }
    }
}

impl<B: LpBackend> Dispatcher<B> {
    pub fn with_backend(options: SolveOptions, backend: B) -> Self {
        Self {
            options,
            adapter: SolverAdapter::new(backend),
        }
    }

    pub fn options(&self) -> &SolveOptions {
        &self.options
    }

    /// Validate, build, solve and extract
    pub fn solve(&self, input: &RawInput) -> Result<DispatchResult, DispatchError> {
        let params = Parameters::from_input(input)?;
        self.solve_params(&params)
    }

    pub fn solve_params(&self, params: &Parameters) -> Result<DispatchResult, DispatchError> {
        let model = DispatchModel::build(params)?;
        let outcome = self.adapter.solve(&model)?;
        Ok(ResultExtractor::new(self.options.extract_duals).extract(&model, params, &outcome))
    }

    /// Pull one record from `source`, solve it and hand the result to `sink`
    pub fn run<S, K>(&self, source: &S, sink: &mut K) -> Result<DispatchResult, DispatchError>
    where
        S: DataSource + ?Sized,
        K: ResultSink + ?Sized,
    {
        let input = source.load()?;
        let result = self.solve(&input)?;
        sink.accept(&result)?;
        Ok(result)
    }
}

/// Solve one record with the default simplex backend
pub fn solve(input: &RawInput, options: SolveOptions) -> Result<DispatchResult, DispatchError> {
    Dispatcher::new(options).solve(input)
}
