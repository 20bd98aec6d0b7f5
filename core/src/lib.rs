// src/lib.rs

//! storeflow: async, type-safe step pipelines.
//!
//! A pipeline is an ordered list of named steps. Each step can carry
//! `before`, `on` and `after` handlers that run against a shared
//! [`ContextData`]. Handlers decide whether the run continues or stops, and
//! their errors abort the run. Pipelines are registered in a [`Flows`]
//! registry keyed by the type of their context data, so callers only need
//! the context to dispatch.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::Handler;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::StepDef;

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::Flows;
