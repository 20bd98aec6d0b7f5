// storefront/src/errors.rs

use crate::orders::{OrderError, OrderErrorKind};
use crate::services::PricingError;
use crate::store::StoreError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use storeflow::FlowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error(transparent)]
  Order(#[from] OrderError),

  /// The order store failed outside of an order operation, e.g. a ping.
  #[error("Storage Error: {0}")]
  Store(#[from] StoreError),

  #[error(transparent)]
  Pricing(#[from] PricingError),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),

  /// A pipeline stopped before producing what the handler needs.
  #[error("Pipeline execution was halted by a handler.")]
  PipelineHaltedByHandler,
}

impl AppError {
  /// Machine-readable error tag for the response body.
  pub fn kind(&self) -> &'static str {
    match self {
      AppError::Validation(_) => OrderErrorKind::InvalidInput.as_str(),
      AppError::Order(e) => e.kind().as_str(),
      AppError::Store(StoreError::Unavailable(_)) => OrderErrorKind::ConnectionUnavailable.as_str(),
      AppError::Store(StoreError::Query(_)) => "StorageError",
      AppError::Pricing(PricingError::Overflow) | AppError::Pricing(PricingError::InvalidLine { .. }) => {
        OrderErrorKind::InvalidInput.as_str()
      }
      AppError::NotFound(_) => "NotFound",
      AppError::Config(_) | AppError::Pricing(PricingError::InvalidPolicy(_)) => "ConfigError",
      AppError::Workflow { .. } | AppError::Internal(_) | AppError::PipelineHaltedByHandler => "InternalError",
    }
  }

  /// Message shown to the client. Storage and internal details stay in
  /// the logs.
  fn public_message(&self) -> String {
    match self {
      AppError::Validation(m) | AppError::NotFound(m) => m.clone(),
      AppError::Order(OrderError::InvalidInput(m)) => m.clone(),
      AppError::Order(OrderError::ConnectionUnavailable(_)) | AppError::Store(StoreError::Unavailable(_)) => {
        "The order service is temporarily unavailable. Please try again.".to_string()
      }
      AppError::Order(OrderError::ReadFailure(_)) => "Failed to load orders.".to_string(),
      AppError::Store(StoreError::Query(_)) => "The order store did not answer correctly.".to_string(),
      AppError::Order(_) => "Failed to place order. No order was created.".to_string(),
      AppError::Pricing(e @ (PricingError::Overflow | PricingError::InvalidLine { .. })) => e.to_string(),
      _ => "An internal error occurred.".to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Order(e) => match e.kind() {
        OrderErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        OrderErrorKind::ConnectionUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        OrderErrorKind::WriteFailure | OrderErrorKind::ReadFailure => StatusCode::INTERNAL_SERVER_ERROR,
      },
      AppError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
      AppError::Pricing(PricingError::Overflow) | AppError::Pricing(PricingError::InvalidLine { .. }) => {
        StatusCode::BAD_REQUEST
      }
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, kind = self.kind(), "Responding with error");
    } else {
      tracing::info!(application_error = %self, kind = self.kind(), "Responding with client error");
    }
    HttpResponse::build(status).json(json!({
      "success": false,
      "message": self.public_message(),
      "error": self.kind(),
    }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
