// storefront/src/state.rs

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::orders::OrderManager;
use crate::pipelines;
use crate::services::PricingPolicy;
use crate::store::OrderStore;
use std::sync::Arc;
use storeflow::Flows;

#[derive(Clone)]
pub struct AppState {
  pub order_manager: Arc<OrderManager>,
  pub pricing: PricingPolicy,
  pub flows: Arc<Flows<AppError>>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Wires the manager, pricing policy and pipelines over `store`.
  pub fn new(config: AppConfig, store: Arc<dyn OrderStore>) -> Result<Self> {
    let pricing = PricingPolicy::new(config.tax_rate_bps, config.site_discount_percent)?;
    let order_manager = Arc::new(
      OrderManager::new(store, config.checkout, config.order_tx_timeout).with_commit_timeout(config.order_commit_timeout),
    );

    let flows = Arc::new(Flows::<AppError>::new());
    pipelines::register_all_pipelines(&flows);

    Ok(Self {
      order_manager,
      pricing,
      flows,
      config: Arc::new(config),
    })
  }
}
