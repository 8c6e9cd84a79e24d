//! Per-invocation error state and execute counter

use crate::error::{ErrorCode, PipelineError};
use serde::Serialize;

/// Outcome of the most recent execute cycle plus the running execute count
///
/// Only the latest invocation is remembered: [`ExecutionState::begin`] clears
/// the previous error before any validation runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionState {
    error: Option<PipelineError>,
    execute_count: u64,
}

impl ExecutionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new invocation: clear the error and bump the counter
    pub fn begin(&mut self) {
        self.error = None;
        self.execute_count += 1;
    }

    /// Record the error that aborted the current invocation
    pub fn fail(&mut self, error: PipelineError) {
        self.error = Some(error);
    }

    pub fn error(&self) -> Option<&PipelineError> {
        self.error.as_ref()
    }

    pub fn error_code(&self) -> ErrorCode {
        self.error
            .as_ref()
            .map_or(ErrorCode::None, PipelineError::code)
    }

    /// Renderable message; empty when the last invocation succeeded
    pub fn error_message(&self) -> String {
        self.error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    pub fn execute_count(&self) -> u64 {
        self.execute_count
    }
}
