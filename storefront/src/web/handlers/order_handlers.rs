// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use storeflow::{ContextData, PipelineResult};
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::{CartLine, NewOrder, OrderId};
use crate::pipelines::contexts::CheckoutCtxData;
use crate::services::Quote;
use crate::state::AppState;

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
  #[serde(default)]
  pub items: Vec<CartLine>,
}

#[derive(Debug, Serialize)]
struct QuoteResponse {
  success: bool,
  #[serde(flatten)]
  quote: Quote,
}

/// Merges the `Idempotency-Key` header into the body's key. Both may be
/// given only if they agree.
fn apply_idempotency_header(req: &HttpRequest, order: &mut NewOrder) -> Result<(), AppError> {
  let Some(raw) = req.headers().get(IDEMPOTENCY_KEY_HEADER) else {
    return Ok(());
  };
  let header_key = raw
    .to_str()
    .map_err(|_| AppError::Validation(format!("{} header must be visible ASCII", IDEMPOTENCY_KEY_HEADER)))?
    .trim()
    .to_string();
  match order.idempotency_key() {
    Some(body_key) if body_key != header_key => Err(AppError::Validation(format!(
      "{} header does not match idempotencyKey in the body",
      IDEMPOTENCY_KEY_HEADER
    ))),
    _ => {
      order.idempotency_key = Some(header_key);
      Ok(())
    }
  }
}

#[instrument(name = "handler::place_order", skip_all)]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Json<NewOrder>,
) -> Result<HttpResponse, AppError> {
  let mut order = body.into_inner();
  apply_idempotency_header(&req, &mut order)?;

  let ctx_data = ContextData::new(CheckoutCtxData::new(app_state.get_ref().clone(), order));
  match app_state.flows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {}
    PipelineResult::Stopped => {
      warn!("Checkout pipeline stopped before placing the order.");
      return Err(AppError::PipelineHaltedByHandler);
    }
  }

  let placement = ctx_data
    .map_read(|ctx| &ctx.placement)
    .ok_or_else(|| AppError::Internal("Checkout completed without an order id.".to_string()))?;

  if placement.replayed {
    Ok(HttpResponse::Ok().json(json!({
      "success": true,
      "message": "Order already placed",
      "orderID": placement.order_id,
      "replayed": true,
    })))
  } else {
    info!(order_id = %placement.order_id, "Order placed.");
    Ok(HttpResponse::Created().json(json!({
      "success": true,
      "message": "Order placed successfully",
      "orderID": placement.order_id,
      "replayed": false,
    })))
  }
}

#[instrument(name = "handler::quote", skip_all, fields(items = body.items.len()))]
pub async fn quote_handler(app_state: web::Data<AppState>, body: web::Json<QuoteRequest>) -> Result<HttpResponse, AppError> {
  let quote = app_state.pricing.quote(&body.items)?;
  Ok(HttpResponse::Ok().json(QuoteResponse { success: true, quote }))
}

#[instrument(name = "handler::order_history", skip(app_state))]
pub async fn order_history_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let user_id = path.into_inner();
  let orders = app_state.order_manager.order_history(&user_id).await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::get_order", skip(app_state))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<(String, i64)>,
) -> Result<HttpResponse, AppError> {
  let (user_id, order_id) = path.into_inner();
  let order_id = OrderId(order_id);
  let not_found = || AppError::NotFound(format!("Order {} not found", order_id));

  let details = app_state.order_manager.find_order(order_id).await?.ok_or_else(not_found)?;
  if details.order.user_id.as_deref() != Some(user_id.trim()) {
    return Err(not_found());
  }
  Ok(HttpResponse::Ok().json(details))
}
