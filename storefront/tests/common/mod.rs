// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storefront::models::{CartLine, Money, NewOrder, OrderDetails, OrderId, ShippingDetails};
use storefront::orders::{CheckoutPolicy, OrderManager};
use storefront::store::{OrderStore, OrderTransaction, SqliteOrderStore, StoreError};
use tracing::Level;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// A fresh in-memory database with the order schema. One connection, so
/// every query sees the same database.
pub async fn sqlite_store() -> SqliteOrderStore {
  setup_tracing();
  let pool = SqlitePoolOptions::new()
    .max_connections(1)
    .idle_timeout(None)
    .max_lifetime(None)
    .connect("sqlite::memory:")
    .await
    .expect("in-memory sqlite pool");
  let store = SqliteOrderStore::from_pool(pool);
  store.ensure_schema().await.expect("order schema");
  store
}

pub fn manager_over(store: Arc<dyn OrderStore>) -> OrderManager {
  OrderManager::new(store, CheckoutPolicy::default(), Duration::from_secs(5))
}

pub async fn count_orders(pool: &SqlitePool) -> i64 {
  sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
    .fetch_one(pool)
    .await
    .expect("count orders")
}

pub async fn count_items(pool: &SqlitePool) -> i64 {
  sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM order_items")
    .fetch_one(pool)
    .await
    .expect("count order items")
}

pub fn shipping() -> ShippingDetails {
  ShippingDetails {
    country: "Philippines".into(),
    first_name: "Rimuru".into(),
    last_name: "Tempest".into(),
    address: "1 Jura Forest Road".into(),
    city: "Rimuru City".into(),
    state: "Tempest".into(),
    zip_code: "1000".into(),
    phone_number: "09171234567".into(),
    email_address: "rimuru@example.com".into(),
  }
}

pub fn cart_line(name: &str, price_cents: i64, quantity: i64) -> CartLine {
  CartLine {
    name: name.to_string(),
    image: None,
    price: Money::from_cents(price_cents),
    quantity,
  }
}

/// Two figurines: 2 x 19.99 + 1 x 9.50, 12% tax.
pub fn figurine_order(user_id: &str) -> NewOrder {
  NewOrder {
    user_id: Some(user_id.to_string()),
    items: vec![cart_line("Figurine A", 1999, 2), cart_line("Figurine B", 950, 1)],
    shipping: shipping(),
    subtotal: Money::from_cents(4948),
    tax: Money::from_cents(594),
    total: Money::from_cents(5542),
    idempotency_key: None,
  }
}

/// An order of `n` distinct one-cent items with consistent totals.
pub fn order_with_items(user_id: &str, n: usize) -> NewOrder {
  let items: Vec<CartLine> = (1..=n).map(|i| cart_line(&format!("Item {}", i), 100, 1)).collect();
  let subtotal = Money::from_cents(100 * n as i64);
  NewOrder {
    user_id: Some(user_id.to_string()),
    items,
    shipping: shipping(),
    subtotal,
    tax: Money::ZERO,
    total: subtotal,
    idempotency_key: None,
  }
}

pub fn simulated_fault() -> StoreError {
  StoreError::Query(sqlx::Error::Protocol("simulated storage fault".to_string()))
}

/// Where a [`FaultyStore`] transaction breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
  Header,
  /// Zero-based item index.
  Item(usize),
  Commit,
}

/// Delegates to a real store but makes its transactions fail at a chosen
/// point, after the preceding statements really ran.
pub struct FaultyStore {
  inner: Arc<dyn OrderStore>,
  fault: Fault,
}

impl FaultyStore {
  pub fn new(inner: Arc<dyn OrderStore>, fault: Fault) -> Self {
    Self { inner, fault }
  }
}

struct FaultyTx {
  inner: Box<dyn OrderTransaction>,
  fault: Fault,
  items_inserted: usize,
}

#[async_trait]
impl OrderTransaction for FaultyTx {
  async fn insert_order(&mut self, order: &NewOrder, created_at: DateTime<Utc>) -> Result<OrderId, StoreError> {
    if self.fault == Fault::Header {
      return Err(simulated_fault());
    }
    self.inner.insert_order(order, created_at).await
  }

  async fn insert_item(&mut self, order_id: OrderId, item: &CartLine) -> Result<(), StoreError> {
    let index = self.items_inserted;
    self.items_inserted += 1;
    if self.fault == Fault::Item(index) {
      return Err(simulated_fault());
    }
    self.inner.insert_item(order_id, item).await
  }

  async fn commit(self: Box<Self>) -> Result<(), StoreError> {
    if self.fault == Fault::Commit {
      self.inner.rollback().await?;
      return Err(simulated_fault());
    }
    self.inner.commit().await
  }

  async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
    self.inner.rollback().await
  }
}

#[async_trait]
impl OrderStore for FaultyStore {
  fn backend(&self) -> &'static str {
    "faulty"
  }

  async fn begin(&self) -> Result<Box<dyn OrderTransaction>, StoreError> {
    let inner = self.inner.begin().await?;
    Ok(Box::new(FaultyTx {
      inner,
      fault: self.fault,
      items_inserted: 0,
    }))
  }

  async fn find_by_idempotency_key(&self, user_id: Option<&str>, key: &str) -> Result<Option<OrderId>, StoreError> {
    self.inner.find_by_idempotency_key(user_id, key).await
  }

  async fn orders_for_user(&self, user_id: &str) -> Result<Vec<OrderDetails>, StoreError> {
    self.inner.orders_for_user(user_id).await
  }

  async fn find_order(&self, order_id: OrderId) -> Result<Option<OrderDetails>, StoreError> {
    self.inner.find_order(order_id).await
  }

  async fn ensure_schema(&self) -> Result<(), StoreError> {
    self.inner.ensure_schema().await
  }

  async fn ping(&self) -> Result<(), StoreError> {
    self.inner.ping().await
  }
}

/// Counts how often the manager touches storage. Optionally stalls every
/// item insert or the commit, or hides the first few idempotency lookups.
pub struct InstrumentedStore {
  inner: Arc<dyn OrderStore>,
  pub begins: AtomicUsize,
  pub lookups: AtomicUsize,
  item_delay: Option<Duration>,
  commit_delay: Option<Duration>,
  lookups_to_miss: AtomicUsize,
}

impl InstrumentedStore {
  pub fn new(inner: Arc<dyn OrderStore>) -> Self {
    Self {
      inner,
      begins: AtomicUsize::new(0),
      lookups: AtomicUsize::new(0),
      item_delay: None,
      commit_delay: None,
      lookups_to_miss: AtomicUsize::new(0),
    }
  }

  pub fn with_item_delay(mut self, delay: Duration) -> Self {
    self.item_delay = Some(delay);
    self
  }

  pub fn with_commit_delay(mut self, delay: Duration) -> Self {
    self.commit_delay = Some(delay);
    self
  }

  pub fn missing_lookups(self, count: usize) -> Self {
    self.lookups_to_miss.store(count, Ordering::SeqCst);
    self
  }

  pub fn begin_count(&self) -> usize {
    self.begins.load(Ordering::SeqCst)
  }

  pub fn lookup_count(&self) -> usize {
    self.lookups.load(Ordering::SeqCst)
  }
}

struct SlowTx {
  inner: Box<dyn OrderTransaction>,
  item_delay: Option<Duration>,
  commit_delay: Option<Duration>,
}

#[async_trait]
impl OrderTransaction for SlowTx {
  async fn insert_order(&mut self, order: &NewOrder, created_at: DateTime<Utc>) -> Result<OrderId, StoreError> {
    self.inner.insert_order(order, created_at).await
  }

  async fn insert_item(&mut self, order_id: OrderId, item: &CartLine) -> Result<(), StoreError> {
    if let Some(delay) = self.item_delay {
      tokio::time::sleep(delay).await;
    }
    self.inner.insert_item(order_id, item).await
  }

  async fn commit(self: Box<Self>) -> Result<(), StoreError> {
    if let Some(delay) = self.commit_delay {
      tokio::time::sleep(delay).await;
    }
    self.inner.commit().await
  }

  async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
    self.inner.rollback().await
  }
}

#[async_trait]
impl OrderStore for InstrumentedStore {
  fn backend(&self) -> &'static str {
    "instrumented"
  }

  async fn begin(&self) -> Result<Box<dyn OrderTransaction>, StoreError> {
    self.begins.fetch_add(1, Ordering::SeqCst);
    let inner = self.inner.begin().await?;
    Ok(Box::new(SlowTx {
      inner,
      item_delay: self.item_delay,
      commit_delay: self.commit_delay,
    }))
  }

  async fn find_by_idempotency_key(&self, user_id: Option<&str>, key: &str) -> Result<Option<OrderId>, StoreError> {
    self.lookups.fetch_add(1, Ordering::SeqCst);
    let missed = self
      .lookups_to_miss
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
      .is_ok();
    if missed {
      return Ok(None);
    }
    self.inner.find_by_idempotency_key(user_id, key).await
  }

  async fn orders_for_user(&self, user_id: &str) -> Result<Vec<OrderDetails>, StoreError> {
    self.inner.orders_for_user(user_id).await
  }

  async fn find_order(&self, order_id: OrderId) -> Result<Option<OrderDetails>, StoreError> {
    self.inner.find_order(order_id).await
  }

  async fn ensure_schema(&self) -> Result<(), StoreError> {
    self.inner.ensure_schema().await
  }

  async fn ping(&self) -> Result<(), StoreError> {
    self.inner.ping().await
  }
}
