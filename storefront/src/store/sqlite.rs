// storefront/src/store/sqlite.rs

use super::sql::{self, sqlx_order_store};
use super::StoreError;
use crate::config::DatabaseConfig;
use crate::models::OrderId;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

/// Order store backed by SQLite. Used for local development and tests.
#[derive(Debug, Clone)]
pub struct SqliteOrderStore {
  pool: SqlitePool,
}

impl SqliteOrderStore {
  /// Opens the database named by `config.url`, creating the file if needed.
  ///
  /// An in-memory database lives only as long as its connection, so the
  /// pool is pinned to one connection that is never recycled.
  pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
    let options = SqliteConnectOptions::from_str(&config.url)?
      .create_if_missing(true)
      .foreign_keys(true);
    let in_memory = config.url.contains(":memory:") || config.url.contains("mode=memory");
    let mut pool_options = SqlitePoolOptions::new().acquire_timeout(config.acquire_timeout);
    pool_options = if in_memory {
      pool_options.max_connections(1).idle_timeout(None).max_lifetime(None)
    } else {
      pool_options.max_connections(config.max_connections)
    };
    let pool = pool_options.connect_with(options).await?;
    info!(in_memory, "Connected SQLite order store.");
    Ok(Self::from_pool(pool))
  }

  pub fn from_pool(pool: SqlitePool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &SqlitePool {
    &self.pool
  }
}

sqlx_order_store! {
  store: SqliteOrderStore,
  transaction: SqliteOrderTransaction,
  database: Sqlite,
  backend: "sqlite",
  schema: sql::sqlite_schema::ALL,
  inserted_id: |result| Ok(OrderId(result.last_insert_rowid())),
}
