// storeflow/src/pipeline/hooks.rs

//! Registration of `before`, `on` and `after` handlers.
//!
//! Each registration accepts any closure returning a future of
//! `Result<PipelineControl, E>` where `E: Into<Err>`, and boxes it into a
//! [`Handler`]. Several handlers may share a phase; they run in
//! registration order.

use crate::core::context::Handler;
use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use std::collections::HashMap;
use std::future::Future;

fn boxed_handler<TData, Err, F, UserErr>(
  handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
) -> Handler<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: 'static,
  F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
  UserErr: Into<Err> + Send + Sync + 'static,
{
  Box::new(move |ctx_data| {
    let user_fut = handler_fn(ctx_data);
    Box::pin(async move { user_fut.await.map_err(Into::into) })
  })
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn before_root<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    push_handler(&mut self.before, step_name, boxed_handler(handler_fn));
  }

  pub fn on_root<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    push_handler(&mut self.on, step_name, boxed_handler(handler_fn));
  }

  pub fn after_root<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    push_handler(&mut self.after, step_name, boxed_handler(handler_fn));
  }

  /// Registers an already-boxed handler for the `on` phase.
  pub fn on_root_boxed(&mut self, step_name: &str, handler: Handler<TData, Err>) {
    self.ensure_step_exists(step_name);
    push_handler(&mut self.on, step_name, handler);
  }
}

fn push_handler<TData, Err>(
  phase: &mut HashMap<String, Vec<Handler<TData, Err>>>,
  step_name: &str,
  handler: Handler<TData, Err>,
) where
  TData: 'static + Send + Sync,
{
  phase.entry(step_name.to_string()).or_default().push(handler);
}
