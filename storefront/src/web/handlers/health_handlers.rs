// storefront/src/web/handlers/health_handlers.rs

use crate::errors::AppError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::warn;

/// 200 when the order store answers, 503 otherwise.
pub async fn health_check_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let store = app_state.order_manager.store();
  store.ping().await.map_err(|e| {
    warn!(error = %e, backend = store.backend(), "Health check failed to reach the order store.");
    AppError::Store(e)
  })?;
  Ok(HttpResponse::Ok().json(json!({ "status": "ok", "store": store.backend() })))
}
