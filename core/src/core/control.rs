// storeflow/src/core/control.rs

//! Flow-control signals returned by handlers, and the outcome of a run.

/// Returned by a handler to say whether the run goes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  Continue,
  /// Halt the run. Remaining handlers of this step and all later steps are skipped.
  Stop,
}

/// Outcome of a run that did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  /// Every step ran (optional steps without handlers are skipped).
  Completed,
  /// A handler returned [`PipelineControl::Stop`].
  Stopped,
}
