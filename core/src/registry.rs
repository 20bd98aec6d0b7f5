// storeflow/src/registry.rs

//! `Flows<AppErr>`: a registry of pipelines keyed by the type of their
//! context data. Callers hand over a `ContextData<TData>` and the registry
//! dispatches to the pipeline registered for `TData`.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineResult;
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, instrument, Level};

#[async_trait]
trait ErasedRunner<AppErr>: Send + Sync
where
  AppErr: std::error::Error + Send + Sync + 'static,
{
  /// `ctx_obj` must hold a `ContextData<TData>` for the wrapped pipeline's `TData`.
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<PipelineResult, AppErr>;
}

struct RegisteredPipeline<TData, HandlerErr, AppErr>
where
  TData: 'static + Send + Sync,
  HandlerErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pipeline: Arc<Pipeline<TData, HandlerErr>>,
  _app_err: PhantomData<fn() -> AppErr>,
}

#[async_trait]
impl<TData, HandlerErr, AppErr> ErasedRunner<AppErr> for RegisteredPipeline<TData, HandlerErr, AppErr>
where
  TData: 'static + Send + Sync,
  HandlerErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<HandlerErr> + From<FlowError> + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<PipelineResult, AppErr> {
    let ctx_data = ctx_obj.downcast::<ContextData<TData>>().map_err(|_| {
      let expected_type = std::any::type_name::<ContextData<TData>>().to_string();
      event!(Level::ERROR, %expected_type, "Context object type mismatch.");
      AppErr::from(FlowError::TypeMismatch { expected_type })
    })?;
    self.pipeline.run(*ctx_data).await.map_err(AppErr::from)
  }
}

/// Type-keyed pipeline registry. `AppErr` is what [`Flows::run`] returns.
pub struct Flows<AppErr = FlowError>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  registry: RwLock<HashMap<TypeId, Arc<dyn ErasedRunner<AppErr>>>>,
}

impl<AppErr> Flows<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      registry: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `pipeline` for its context type, replacing any earlier one.
  pub fn register_pipeline<TData, HandlerErr>(&self, pipeline: Pipeline<TData, HandlerErr>)
  where
    TData: 'static + Send + Sync,
    HandlerErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
    AppErr: From<HandlerErr>,
  {
    event!(
      Level::DEBUG,
      context_type = %std::any::type_name::<TData>(),
      steps = ?pipeline.step_names(),
      "Registering pipeline."
    );
    let runner = RegisteredPipeline::<TData, HandlerErr, AppErr> {
      pipeline: Arc::new(pipeline),
      _app_err: PhantomData,
    };
    self.registry.write().insert(TypeId::of::<TData>(), Arc::new(runner));
  }

  pub fn is_registered<TData: 'static + Send + Sync>(&self) -> bool {
    self.registry.read().contains_key(&TypeId::of::<TData>())
  }

  /// Runs the pipeline registered for `TData`.
  #[instrument(name = "Flows::run", skip_all, fields(context_type = %std::any::type_name::<TData>()))]
  pub async fn run<TData>(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, AppErr>
  where
    TData: 'static + Send + Sync,
  {
    let runner = self.registry.read().get(&TypeId::of::<TData>()).cloned();
    let runner = runner.ok_or_else(|| {
      let context_type = std::any::type_name::<TData>().to_string();
      event!(Level::ERROR, %context_type, "No pipeline registered.");
      AppErr::from(FlowError::PipelineNotFound { context_type })
    })?;
    runner.run_erased(Box::new(ctx_data)).await
  }
}

impl<AppErr> Default for Flows<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}
