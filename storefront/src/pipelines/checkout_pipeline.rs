// storefront/src/pipelines/checkout_pipeline.rs

use crate::errors::AppError;
use crate::models::Money;
use crate::pipelines::contexts::CheckoutCtxData;
use std::sync::Arc;
use storeflow::{ContextData, Flows, Pipeline, PipelineControl};
use tracing::{debug, info, warn};

pub const VALIDATE_STEP: &str = "validate_checkout_request";
pub const PLACE_ORDER_STEP: &str = "place_order_transaction";
pub const ACKNOWLEDGE_STEP: &str = "log_order_acknowledgement";

pub fn checkout_pipeline() -> Pipeline<CheckoutCtxData, AppError> {
  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(&[
    (VALIDATE_STEP, false),
    (PLACE_ORDER_STEP, false),
    (ACKNOWLEDGE_STEP, true),
  ]);

  // Step 1: reject malformed requests before anything touches storage.
  p.on_root(VALIDATE_STEP, |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let guard = ctx_data.read();
      let policy = *guard.app_state.order_manager.policy();
      guard.request.validate(&policy)?;
      let quote = guard.app_state.pricing.quote(&guard.request.items).ok();
      let claimed = (guard.request.subtotal, guard.request.tax, guard.request.total);
      drop(guard);

      if let Some(quote) = quote {
        if (quote.subtotal, quote.tax, quote.total) != claimed {
          // Advisory only. The recorded totals stay the client's.
          warn!(
            quoted_total = %quote.total,
            claimed_total = %claimed.2,
            "Claimed order totals differ from the server quote."
          );
        }
        ctx_data.write().quote = Some(quote);
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 2: the transactional write.
  p.on_root(PLACE_ORDER_STEP, |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (manager, request) = {
        let mut guard = ctx_data.write();
        let manager = Arc::clone(&guard.app_state.order_manager);
        (manager, std::mem::take(&mut guard.request))
      };
      let placement = manager.place_order(request).await?;
      ctx_data.write().placement = Some(placement);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 3 (optional): acknowledgement log line.
  p.on_root(ACKNOWLEDGE_STEP, |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let guard = ctx_data.read();
      match guard.placement {
        Some(placement) => info!(
          order_id = %placement.order_id,
          replayed = placement.replayed,
          quoted_total = %guard.quote.map_or(Money::ZERO, |q| q.total),
          "Checkout acknowledged."
        ),
        None => debug!("Checkout finished without a placement."),
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p
}

pub fn register_checkout_pipeline(flows: &Flows<AppError>) {
  flows.register_pipeline(checkout_pipeline());
}
