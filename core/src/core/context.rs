// storeflow/src/core/context.rs

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

/// A boxed step handler.
///
/// Receives a clone of the run's `ContextData<TData>` and resolves to a
/// control signal or the pipeline's error type. Lock guards taken inside the
/// handler must be released before the handler awaits.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;
