// storefront/src/web/routes.rs

use crate::errors::AppError;
use crate::web::handlers::{health_handlers, order_handlers};
use actix_web::{error, web, HttpRequest};

/// Malformed JSON bodies answer like any other validation failure.
fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> error::Error {
  AppError::Validation(format!("Invalid request body: {}", err)).into()
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api")
      .app_data(web::JsonConfig::default().error_handler(json_error_handler))
      .route("/health", web::get().to(health_handlers::health_check_handler))
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::place_order_handler))
          .route("/quote", web::post().to(order_handlers::quote_handler))
          .route("/{user_id}", web::get().to(order_handlers::order_history_handler))
          .route("/{user_id}/{order_id}", web::get().to(order_handlers::get_order_handler)),
      ),
  );
}
