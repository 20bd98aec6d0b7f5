// storefront/src/store/mysql.rs

use super::sql::{self, sqlx_order_store};
use super::StoreError;
use crate::config::DatabaseConfig;
use crate::models::OrderId;
use sqlx::mysql::{MySql, MySqlPool, MySqlPoolOptions};
use tracing::info;

/// Order store backed by a MySQL (or MariaDB) pool.
#[derive(Debug, Clone)]
pub struct MySqlOrderStore {
  pool: MySqlPool,
}

impl MySqlOrderStore {
  pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
    let pool = MySqlPoolOptions::new()
      .max_connections(config.max_connections)
      .acquire_timeout(config.acquire_timeout)
      .connect(&config.url)
      .await?;
    info!(max_connections = config.max_connections, "Connected MySQL order store.");
    Ok(Self::from_pool(pool))
  }

  pub fn from_pool(pool: MySqlPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &MySqlPool {
    &self.pool
  }
}

sqlx_order_store! {
  store: MySqlOrderStore,
  transaction: MySqlOrderTransaction,
  database: MySql,
  backend: "mysql",
  schema: sql::mysql_schema::ALL,
  inserted_id: |result| i64::try_from(result.last_insert_id())
    .map(OrderId)
    .map_err(|e| StoreError::Query(sqlx::Error::Decode(Box::new(e)))),
}
