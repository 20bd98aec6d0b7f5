// storefront/src/pipelines/mod.rs

//! The storeflow pipelines behind the HTTP handlers.

use crate::errors::AppError;
use storeflow::Flows;

pub mod checkout_pipeline;
pub mod contexts;

/// Registers every application pipeline. Called once while building
/// `AppState`.
pub fn register_all_pipelines(flows: &Flows<AppError>) {
  tracing::info!("Registering pipelines...");
  checkout_pipeline::register_checkout_pipeline(flows);
  tracing::info!("All application pipelines registered.");
}
