// storefront/src/store/mod.rs

//! Storage port for orders and its sqlx adapters.
//!
//! The manager only talks to [`OrderStore`] and [`OrderTransaction`]. The
//! MySQL adapter is the production backend; the SQLite adapter serves local
//! development and the test suite. Both run the same SQL text.

pub mod mysql;
pub mod sql;
pub mod sqlite;

use crate::config::DatabaseConfig;
use crate::models::{CartLine, NewOrder, Order, OrderDetails, OrderId, OrderItem};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;
use thiserror::Error;

pub use mysql::MySqlOrderStore;
pub use sqlite::SqliteOrderStore;

#[derive(Debug, Error)]
pub enum StoreError {
  /// No usable connection: pool exhausted or closed, or the connection broke.
  #[error("storage connection unavailable: {0}")]
  Unavailable(#[source] sqlx::Error),

  #[error("storage query failed: {0}")]
  Query(#[source] sqlx::Error),
}

impl StoreError {
  pub fn into_source(self) -> sqlx::Error {
    match self {
      StoreError::Unavailable(source) | StoreError::Query(source) => source,
    }
  }

  pub fn is_unique_violation(&self) -> bool {
    match self {
      StoreError::Query(source) => source
        .as_database_error()
        .map_or(false, |db_err| db_err.is_unique_violation()),
      StoreError::Unavailable(_) => false,
    }
  }
}

impl From<sqlx::Error> for StoreError {
  fn from(err: sqlx::Error) -> Self {
    if is_connection_error(&err) {
      StoreError::Unavailable(err)
    } else {
      StoreError::Query(err)
    }
  }
}

/// Errors meaning the pool could not hand out a working connection.
pub fn is_connection_error(err: &sqlx::Error) -> bool {
  matches!(
    err,
    sqlx::Error::PoolTimedOut
      | sqlx::Error::PoolClosed
      | sqlx::Error::Io(_)
      | sqlx::Error::Tls(_)
      | sqlx::Error::WorkerCrashed
  )
}

/// An open transaction on one pooled connection.
///
/// Owned by exactly one caller. Dropping it without `commit` rolls back
/// and returns the connection to the pool.
#[async_trait]
pub trait OrderTransaction: Send {
  /// Inserts the order header and returns the store-assigned id.
  async fn insert_order(&mut self, order: &NewOrder, created_at: DateTime<Utc>) -> Result<OrderId, StoreError>;

  async fn insert_item(&mut self, order_id: OrderId, item: &CartLine) -> Result<(), StoreError>;

  async fn commit(self: Box<Self>) -> Result<(), StoreError>;

  async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Short backend name for logs and health output.
  fn backend(&self) -> &'static str;

  /// Acquires a connection and opens a transaction on it.
  async fn begin(&self) -> Result<Box<dyn OrderTransaction>, StoreError>;

  /// The order previously placed by `user_id` (or by a guest, for `None`)
  /// under `key`, if any.
  async fn find_by_idempotency_key(&self, user_id: Option<&str>, key: &str) -> Result<Option<OrderId>, StoreError>;

  /// All orders of `user_id`, newest first, each with its items.
  async fn orders_for_user(&self, user_id: &str) -> Result<Vec<OrderDetails>, StoreError>;

  async fn find_order(&self, order_id: OrderId) -> Result<Option<OrderDetails>, StoreError>;

  /// Creates the order tables when they do not exist.
  async fn ensure_schema(&self) -> Result<(), StoreError>;

  async fn ping(&self) -> Result<(), StoreError>;
}

/// Opens the adapter matching the URL scheme of `config.url`.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn OrderStore>, StoreError> {
  let url = config.url.as_str();
  if url.starts_with("mysql:") || url.starts_with("mariadb:") {
    Ok(Arc::new(MySqlOrderStore::connect(config).await?))
  } else if url.starts_with("sqlite:") {
    Ok(Arc::new(SqliteOrderStore::connect(config).await?))
  } else {
    let scheme = url.split(':').next().unwrap_or_default();
    Err(StoreError::Unavailable(sqlx::Error::Configuration(
      format!("unsupported database url scheme '{}'", scheme).into(),
    )))
  }
}

/// One row of the order/item join.
#[derive(Debug, FromRow)]
pub(crate) struct OrderLineRow {
  #[sqlx(flatten)]
  order: Order,
  item_id: i64,
  product_name: String,
  product_image: Option<String>,
  price_cents: crate::models::Money,
  quantity: i32,
}

/// Folds join rows into orders. Rows of one order must be adjacent, which
/// the `ORDER BY` of the join queries guarantees.
pub(crate) fn group_order_lines(rows: Vec<OrderLineRow>) -> Vec<OrderDetails> {
  let mut orders: Vec<OrderDetails> = Vec::new();
  for row in rows {
    let item = OrderItem {
      id: row.item_id,
      order_id: row.order.order_id,
      product_name: row.product_name,
      product_image: row.product_image,
      price: row.price_cents,
      quantity: row.quantity,
    };
    match orders.last_mut() {
      Some(last) if last.order.order_id == row.order.order_id => last.items.push(item),
      _ => orders.push(OrderDetails {
        order: row.order,
        items: vec![item],
      }),
    }
  }
  orders
}
