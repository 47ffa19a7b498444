// Copyright © 2024 Pathway

use super::error::Result;

/// Hooks an operator hands to long-running filters.
///
/// Both hooks are optional from the engine's point of view: wherever an
/// `Option<&dyn OperatorContext>` is `None`, stopping is never requested and progress
/// goes nowhere.
pub trait OperatorContext: Send + Sync {
    /// Returns [`Error::ProcessStopped`](super::Error::ProcessStopped) once the user
    /// asked the running process to stop.
    fn check_for_stop(&self) -> Result<()>;

    fn report_progress(&self, _completed: usize, _total: usize) {}
}

pub(crate) fn check_for_stop(operator: Option<&dyn OperatorContext>) -> Result<()> {
    operator.map_or(Ok(()), |operator| operator.check_for_stop())
}

pub(crate) fn report_progress(operator: Option<&dyn OperatorContext>, completed: usize, total: usize) {
    if let Some(operator) = operator {
        operator.report_progress(completed, total);
    }
}
