// storeflow/src/pipeline/execution.rs

//! `Pipeline::run()`.

use crate::core::context::Handler;
use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, instrument, span, Instrument, Level};

/// How one phase of a step ended.
enum PhaseOutcome<Err> {
  Continue,
  Stopped,
  Failed(Err),
}

async fn run_phase<TData, Err>(
  phase: &'static str,
  handlers: Option<&Vec<Handler<TData, Err>>>,
  ctx_data: &ContextData<TData>,
) -> PhaseOutcome<Err>
where
  TData: 'static + Send + Sync,
  Err: std::fmt::Display,
{
  let Some(handlers) = handlers else {
    return PhaseOutcome::Continue;
  };
  for (handler_idx, handler_fn) in handlers.iter().enumerate() {
    event!(Level::TRACE, phase, handler_index = handler_idx, "Running handler.");
    match handler_fn(ctx_data.clone()).await {
      Ok(PipelineControl::Continue) => {}
      Ok(PipelineControl::Stop) => {
        event!(Level::INFO, phase, "Pipeline stopped by a handler.");
        return PhaseOutcome::Stopped;
      }
      Err(e) => {
        event!(Level::ERROR, phase, error = %e, "Handler failed.");
        return PhaseOutcome::Failed(e);
      }
    }
  }
  PhaseOutcome::Continue
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx_data`.
  ///
  /// Within a step the `before`, `on` and `after` handlers run in that
  /// order. The first handler error aborts the run and is returned as is.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      context_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = span!(
        Level::INFO,
        "pipeline_step",
        step_name,
        step_index = step_idx,
        optional = step_def.optional
      );

      let before = self.before.get(step_name).filter(|v| !v.is_empty());
      let on = self.on.get(step_name).filter(|v| !v.is_empty());
      let after = self.after.get(step_name).filter(|v| !v.is_empty());

      if before.is_none() && on.is_none() && after.is_none() {
        if step_def.optional {
          event!(parent: &step_span, Level::DEBUG, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(parent: &step_span, Level::ERROR, "Non-optional step has no handlers.");
        return Err(Err::from(FlowError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }

      for (phase, handlers) in [("before", before), ("on", on), ("after", after)] {
        match run_phase(phase, handlers, &ctx_data).instrument(step_span.clone()).await {
          PhaseOutcome::Continue => {}
          PhaseOutcome::Stopped => return Ok(PipelineResult::Stopped),
          PhaseOutcome::Failed(e) => return Err(e),
        }
      }
      event!(parent: &step_span, Level::DEBUG, "Step finished.");
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }
}
