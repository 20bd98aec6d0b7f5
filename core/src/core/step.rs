// storeflow/src/core/step.rs

/// One named step of a pipeline.
///
/// An optional step with no handlers is skipped; a non-optional one fails
/// the run with `FlowError::HandlerMissing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDef {
  pub name: String,
  pub optional: bool,
}

impl StepDef {
  pub fn new(name: impl Into<String>, optional: bool) -> Self {
    Self {
      name: name.into(),
      optional,
    }
  }
}
