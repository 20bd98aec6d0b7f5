// storefront/src/pipelines/contexts.rs

//! Data structs the pipelines run over, wrapped in `storeflow::ContextData`
//! by the handlers.

use crate::models::{NewOrder, Placement};
use crate::services::Quote;
use crate::state::AppState;

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  /// Taken by the placement step; empty afterwards.
  pub request: NewOrder,
  /// Server-side quote for the requested items, when they could be priced.
  pub quote: Option<Quote>,
  pub placement: Option<Placement>,
}

impl CheckoutCtxData {
  pub fn new(app_state: AppState, request: NewOrder) -> Self {
    Self {
      app_state,
      request,
      quote: None,
      placement: None,
    }
  }
}
