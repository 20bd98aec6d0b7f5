// storefront/src/orders/manager.rs

//! The order transaction manager.
//!
//! `place_order` writes one order header and all of its items inside a
//! single store transaction. Either everything commits or nothing is
//! visible: any failure rolls the transaction back before the error is
//! returned.

use super::error::{OrderError, WriteStage};
use super::validation::CheckoutPolicy;
use crate::models::{NewOrder, OrderDetails, OrderId, Placement};
use crate::store::{OrderStore, OrderTransaction, StoreError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn, Instrument};

pub const DEFAULT_TX_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_COMMIT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct OrderManager {
  store: Arc<dyn OrderStore>,
  policy: CheckoutPolicy,
  tx_timeout: Duration,
  commit_timeout: Duration,
}

#[derive(Debug, Clone, Copy)]
struct WriteDeadlines {
  rows: Duration,
  commit: Duration,
}

impl OrderManager {
  pub fn new(store: Arc<dyn OrderStore>, policy: CheckoutPolicy, tx_timeout: Duration) -> Self {
    Self {
      store,
      policy,
      tx_timeout,
      commit_timeout: DEFAULT_COMMIT_TIMEOUT,
    }
  }

  /// Bounds how long `place_order` waits for the store to confirm a commit.
  pub fn with_commit_timeout(mut self, commit_timeout: Duration) -> Self {
    self.commit_timeout = commit_timeout;
    self
  }

  pub fn policy(&self) -> &CheckoutPolicy {
    &self.policy
  }

  pub fn tx_timeout(&self) -> Duration {
    self.tx_timeout
  }

  pub fn commit_timeout(&self) -> Duration {
    self.commit_timeout
  }

  pub fn store(&self) -> &Arc<dyn OrderStore> {
    &self.store
  }

  /// Validates `order` and persists it atomically.
  ///
  /// Invalid input is rejected before a connection is acquired. With an
  /// idempotency key, an order already placed under that key is returned
  /// as a replay and nothing is written. The write itself runs on its own
  /// task so that dropping this future cannot strand an open transaction.
  #[instrument(
    name = "OrderManager::place_order",
    skip_all,
    fields(user_id = order.owner().unwrap_or("guest"), items = order.items.len())
  )]
  pub async fn place_order(&self, order: NewOrder) -> Result<Placement, OrderError> {
    if let Err(err) = order.validate(&self.policy) {
      info!(error = %err, "Rejected order request.");
      return Err(err);
    }

    if let Some(key) = order.idempotency_key() {
      let existing = self
        .store
        .find_by_idempotency_key(order.owner(), key)
        .await
        .map_err(|e| OrderError::from_write(WriteStage::IdempotencyLookup, e))?;
      if let Some(order_id) = existing {
        info!(%order_id, "Idempotency key already used; returning the existing order.");
        return Ok(Placement::replayed(order_id));
      }
    }

    let store = Arc::clone(&self.store);
    let deadlines = WriteDeadlines {
      rows: self.tx_timeout,
      commit: self.commit_timeout,
    };
    let write = tokio::spawn(write_order(store, order, deadlines).in_current_span());
    match write.await {
      Ok(result) => result,
      Err(join_err) => {
        warn!(error = %join_err, "Order write task did not complete.");
        Err(OrderError::Aborted(join_err.to_string()))
      }
    }
  }

  /// A user's orders, newest first, each with its items in insertion order.
  #[instrument(name = "OrderManager::order_history", skip(self))]
  pub async fn order_history(&self, user_id: &str) -> Result<Vec<OrderDetails>, OrderError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
      return Err(OrderError::invalid("userID is required"));
    }
    let orders = self.store.orders_for_user(user_id).await.map_err(OrderError::from_read)?;
    debug!(orders = orders.len(), "Loaded order history.");
    Ok(orders)
  }

  #[instrument(name = "OrderManager::find_order", skip(self))]
  pub async fn find_order(&self, order_id: OrderId) -> Result<Option<OrderDetails>, OrderError> {
    self.store.find_order(order_id).await.map_err(OrderError::from_read)
  }
}

async fn write_order(
  store: Arc<dyn OrderStore>,
  order: NewOrder,
  deadlines: WriteDeadlines,
) -> Result<Placement, OrderError> {
  let mut tx = store
    .begin()
    .await
    .map_err(|e| OrderError::from_write(WriteStage::Begin, e))?;

  let created_at = Utc::now();
  let inserted = tokio::time::timeout(deadlines.rows, insert_rows(tx.as_mut(), &order, created_at)).await;

  match inserted {
    Ok(Ok(order_id)) => {
      // A failed commit drops the transaction, which rolls it back.
      match tokio::time::timeout(deadlines.commit, tx.commit()).await {
        Ok(committed) => committed.map_err(|e| OrderError::from_write(WriteStage::Commit, e))?,
        Err(_elapsed) => {
          error!(
            %order_id,
            timeout = ?deadlines.commit,
            "Commit was not confirmed in time; the server decides whether the order exists."
          );
          return Err(OrderError::CommitUnconfirmed(deadlines.commit));
        }
      }
      info!(%order_id, items = order.items.len(), "Order committed.");
      Ok(Placement::created(order_id))
    }
    Ok(Err((stage, err))) => {
      warn!(%stage, error = %err, "Order write failed; rolling back.");
      rollback_quietly(tx).await;
      if stage == WriteStage::Header && err.is_unique_violation() {
        if let Some(order_id) = concurrent_duplicate(store.as_ref(), &order).await? {
          info!(%order_id, "Lost an idempotency race; returning the winning order.");
          return Ok(Placement::replayed(order_id));
        }
      }
      Err(OrderError::from_write(stage, err))
    }
    Err(_elapsed) => {
      warn!(timeout = ?deadlines.rows, "Order transaction timed out; rolling back.");
      rollback_quietly(tx).await;
      Err(OrderError::TimedOut(deadlines.rows))
    }
  }
}

async fn insert_rows(
  tx: &mut dyn OrderTransaction,
  order: &NewOrder,
  created_at: DateTime<Utc>,
) -> Result<OrderId, (WriteStage, StoreError)> {
  let order_id = tx
    .insert_order(order, created_at)
    .await
    .map_err(|e| (WriteStage::Header, e))?;
  for (index, item) in order.items.iter().enumerate() {
    tx.insert_item(order_id, item)
      .await
      .map_err(|e| (WriteStage::Item { index }, e))?;
  }
  debug!(%order_id, items = order.items.len(), "Order rows inserted.");
  Ok(order_id)
}

async fn concurrent_duplicate(store: &dyn OrderStore, order: &NewOrder) -> Result<Option<OrderId>, OrderError> {
  match order.idempotency_key() {
    Some(key) => store
      .find_by_idempotency_key(order.owner(), key)
      .await
      .map_err(|e| OrderError::from_write(WriteStage::IdempotencyLookup, e)),
    None => Ok(None),
  }
}

async fn rollback_quietly(tx: Box<dyn OrderTransaction>) {
  if let Err(err) = tx.rollback().await {
    // The connection is discarded with the transaction still open, which
    // the server rolls back.
    warn!(error = %err, "Explicit rollback failed.");
  }
}
