//! Collaborator capabilities the dispatch core depends on.
//!
//! Loading input files and presenting results live outside the core; they
//! plug in through these two traits.

use crate::error::DispatchError;
use crate::input::RawInput;
use crate::result::DispatchResult;

/// Supplies one raw input record
pub trait DataSource {
    fn load(&self) -> Result<RawInput, DispatchError>;
}

/// Consumes a finished result record
pub trait ResultSink {
    fn accept(&mut self, result: &DispatchResult) -> Result<(), DispatchError>;
}

/// An in-memory record is its own source
impl DataSource for RawInput {
    fn load(&self) -> Result<RawInput, DispatchError> {
        Ok(self.clone())
    }
}

/// Collects results in memory
impl ResultSink for Vec<DispatchResult> {
    fn accept(&mut self, result: &DispatchResult) -> Result<(), DispatchError> {
        self.push(result.clone());
        Ok(())
    }
}
