// storeflow/src/pipeline/definition.rs

//! The `Pipeline<TData, Err>` struct and its structural edits.

use crate::core::context::Handler;
use crate::core::step::StepDef;
use crate::error::FlowError;
use std::collections::HashMap;

/// An ordered list of named steps over context data `TData`, whose handlers
/// fail with `Err`.
///
/// `Err` must be constructible from [`FlowError`] so that engine-level
/// failures (a non-optional step without handlers, for instance) surface in
/// the same error type as handler failures.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef>,
  pub(crate) before: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Creates a pipeline from `(step_name, optional)` pairs, in run order.
  pub fn new(step_defs: &[(&str, bool)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(name, optional)| StepDef::new(*name, *optional))
      .collect();

    Self {
      steps,
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  /// Step names in run order.
  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  /// Panics on an unknown step name. Registering a handler for a step that
  /// was never declared is a wiring bug, not a runtime condition.
  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!("storeflow setup error: step '{}' not found in pipeline definition.", step_name);
    }
  }

  /// Inserts a new step right after `existing_step_name`.
  pub fn insert_step_after<S: Into<String>>(
    &mut self,
    existing_step_name: &str,
    new_step_name: S,
    optional: bool,
  ) -> Result<(), FlowError> {
    let idx = self
      .steps
      .iter()
      .position(|s| s.name == existing_step_name)
      .ok_or_else(|| FlowError::StepNotFound {
        step_name: existing_step_name.to_string(),
      })?;
    let name: String = new_step_name.into();
    if self.steps.iter().any(|s| s.name == name) {
      return Err(FlowError::Internal(format!("step '{}' already exists", name)));
    }
    self.steps.insert(idx + 1, StepDef::new(name, optional));
    Ok(())
  }

  /// Removes a step and every handler registered for it.
  pub fn remove_step(&mut self, step_name: &str) -> Result<(), FlowError> {
    let idx = self
      .steps
      .iter()
      .position(|s| s.name == step_name)
      .ok_or_else(|| FlowError::StepNotFound {
        step_name: step_name.to_string(),
      })?;
    self.steps.remove(idx);
    self.before.remove(step_name);
    self.on.remove(step_name);
    self.after.remove(step_name);
    Ok(())
  }
}
