// storefront/src/orders/error.rs

use crate::store::StoreError;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Where in the transactional write a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
  IdempotencyLookup,
  Begin,
  Header,
  /// Zero-based position of the item in the request.
  Item { index: usize },
  Commit,
}

impl fmt::Display for WriteStage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      WriteStage::IdempotencyLookup => f.write_str("idempotency lookup"),
      WriteStage::Begin => f.write_str("begin"),
      WriteStage::Header => f.write_str("order header insert"),
      WriteStage::Item { index } => write!(f, "order item {} insert", index + 1),
      WriteStage::Commit => f.write_str("commit"),
    }
  }
}

#[derive(Debug, Error)]
pub enum OrderError {
  #[error("Invalid order: {0}")]
  InvalidInput(String),

  #[error("No storage connection available: {0}")]
  ConnectionUnavailable(#[source] sqlx::Error),

  #[error("Order write failed during {stage}: {source}")]
  WriteFailure {
    stage: WriteStage,
    #[source]
    source: sqlx::Error,
  },

  #[error("Order transaction did not finish within {0:?} and was rolled back")]
  TimedOut(Duration),

  #[error("Order commit was not confirmed within {0:?}; the order may or may not exist")]
  CommitUnconfirmed(Duration),

  #[error("Order transaction task ended abnormally: {0}")]
  Aborted(String),

  #[error("Order read failed: {0}")]
  ReadFailure(#[source] sqlx::Error),
}

/// The taxonomy callers map to transport statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderErrorKind {
  InvalidInput,
  ConnectionUnavailable,
  WriteFailure,
  ReadFailure,
}

impl OrderErrorKind {
  pub fn as_str(self) -> &'static str {
    match self {
      OrderErrorKind::InvalidInput => "InvalidInput",
      OrderErrorKind::ConnectionUnavailable => "ConnectionUnavailable",
      OrderErrorKind::WriteFailure => "WriteFailure",
      OrderErrorKind::ReadFailure => "ReadFailure",
    }
  }
}

impl OrderError {
  pub fn kind(&self) -> OrderErrorKind {
    match self {
      OrderError::InvalidInput(_) => OrderErrorKind::InvalidInput,
      OrderError::ConnectionUnavailable(_) => OrderErrorKind::ConnectionUnavailable,
      OrderError::WriteFailure { .. }
      | OrderError::TimedOut(_)
      | OrderError::CommitUnconfirmed(_)
      | OrderError::Aborted(_) => OrderErrorKind::WriteFailure,
      OrderError::ReadFailure(_) => OrderErrorKind::ReadFailure,
    }
  }

  pub(crate) fn invalid(message: impl Into<String>) -> Self {
    OrderError::InvalidInput(message.into())
  }

  /// Maps a store error raised while writing. Connection problems keep
  /// their own kind so callers can tell "nothing attempted" apart.
  pub(crate) fn from_write(stage: WriteStage, err: StoreError) -> Self {
    match err {
      StoreError::Unavailable(source) if matches!(stage, WriteStage::IdempotencyLookup | WriteStage::Begin) => {
        OrderError::ConnectionUnavailable(source)
      }
      other => OrderError::WriteFailure {
        stage,
        source: other.into_source(),
      },
    }
  }

  pub(crate) fn from_read(err: StoreError) -> Self {
    match err {
      StoreError::Unavailable(source) => OrderError::ConnectionUnavailable(source),
      StoreError::Query(source) => OrderError::ReadFailure(source),
    }
  }
}
