// storefront/src/store/sql.rs

//! SQL shared by the MySQL and SQLite adapters. Both drivers take `?`
//! placeholders, so only DDL differs per backend.

pub const INSERT_ORDER: &str = "INSERT INTO orders \
  (user_id, country, first_name, last_name, address, city, state, zip_code, phone_number, email_address, \
  subtotal_cents, tax_cents, total_cents, idempotency_key, created_at) \
  VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

pub const INSERT_ORDER_ITEM: &str = "INSERT INTO order_items \
  (order_id, product_name, product_image, price_cents, quantity) \
  VALUES (?, ?, ?, ?, ?)";

pub const FIND_BY_KEY_FOR_USER: &str =
  "SELECT order_id FROM orders WHERE user_id = ? AND idempotency_key = ? ORDER BY order_id LIMIT 1";

/// Guest orders share one idempotency namespace. The schema's unique index
/// folds a NULL `user_id` to `''` so guest keys collide like user keys do.
pub const FIND_BY_KEY_FOR_GUEST: &str =
  "SELECT order_id FROM orders WHERE user_id IS NULL AND idempotency_key = ? ORDER BY order_id LIMIT 1";

pub const PING: &str = "SELECT 1";

macro_rules! order_lines_query {
  ($filter:literal) => {
    concat!(
      "SELECT o.order_id, o.user_id, o.country, o.first_name, o.last_name, o.address, o.city, o.state, ",
      "o.zip_code, o.phone_number, o.email_address, o.subtotal_cents, o.tax_cents, o.total_cents, o.created_at, ",
      "oi.id AS item_id, oi.product_name, oi.product_image, oi.price_cents, oi.quantity ",
      "FROM orders o JOIN order_items oi ON oi.order_id = o.order_id WHERE ",
      $filter,
      " ORDER BY o.created_at DESC, o.order_id DESC, oi.id ASC"
    )
  };
}

pub const ORDERS_FOR_USER: &str = order_lines_query!("o.user_id = ?");

pub const ORDER_BY_ID: &str = order_lines_query!("o.order_id = ?");

/// Binds the order header columns of [`INSERT_ORDER`] in order.
macro_rules! bind_order_header {
  ($query:expr, $order:expr, $created_at:expr) => {{
    let order: &$crate::models::NewOrder = $order;
    $query
      .bind(order.owner())
      .bind(order.shipping.country.trim())
      .bind(order.shipping.first_name.trim())
      .bind(order.shipping.last_name.trim())
      .bind(order.shipping.address.trim())
      .bind(order.shipping.city.trim())
      .bind(order.shipping.state.trim())
      .bind(order.shipping.zip_code.trim())
      .bind(order.shipping.phone_number.trim())
      .bind(order.shipping.email_address.trim())
      .bind(order.subtotal)
      .bind(order.tax)
      .bind(order.total)
      .bind(order.idempotency_key())
      .bind($created_at)
  }};
}

/// Binds the columns of [`INSERT_ORDER_ITEM`] in order.
macro_rules! bind_order_item {
  ($query:expr, $order_id:expr, $item:expr) => {{
    let item: &$crate::models::CartLine = $item;
    $query
      .bind($order_id)
      .bind(item.name.trim())
      .bind(item.image.as_deref().map(str::trim).filter(|image| !image.is_empty()))
      .bind(item.price)
      .bind(item.quantity)
  }};
}

/// Implements [`OrderStore`](crate::store::OrderStore) and its transaction
/// for an sqlx pool-backed store. Backends differ only in the pool type,
/// their DDL and how the driver reports the id of an inserted row.
macro_rules! sqlx_order_store {
  (
    store: $store:ident,
    transaction: $transaction:ident,
    database: $db:ty,
    backend: $backend:literal,
    schema: $schema:expr,
    inserted_id: |$result:ident| $inserted_id:expr $(,)?
  ) => {
    struct $transaction {
      tx: sqlx::Transaction<'static, $db>,
    }

    #[async_trait::async_trait]
    impl $crate::store::OrderTransaction for $transaction {
      async fn insert_order(
        &mut self,
        order: &$crate::models::NewOrder,
        created_at: chrono::DateTime<chrono::Utc>,
      ) -> Result<$crate::models::OrderId, $crate::store::StoreError> {
        let $result = $crate::store::sql::bind_order_header!(
          sqlx::query($crate::store::sql::INSERT_ORDER),
          order,
          created_at
        )
        .execute(&mut *self.tx)
        .await?;
        $inserted_id
      }

      async fn insert_item(
        &mut self,
        order_id: $crate::models::OrderId,
        item: &$crate::models::CartLine,
      ) -> Result<(), $crate::store::StoreError> {
        $crate::store::sql::bind_order_item!(sqlx::query($crate::store::sql::INSERT_ORDER_ITEM), order_id, item)
          .execute(&mut *self.tx)
          .await?;
        Ok(())
      }

      async fn commit(self: Box<Self>) -> Result<(), $crate::store::StoreError> {
        let $transaction { tx } = *self;
        tx.commit().await.map_err($crate::store::StoreError::from)
      }

      async fn rollback(self: Box<Self>) -> Result<(), $crate::store::StoreError> {
        let $transaction { tx } = *self;
        tx.rollback().await.map_err($crate::store::StoreError::from)
      }
    }

    #[async_trait::async_trait]
    impl $crate::store::OrderStore for $store {
      fn backend(&self) -> &'static str {
        $backend
      }

      async fn begin(&self) -> Result<Box<dyn $crate::store::OrderTransaction>, $crate::store::StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new($transaction { tx }))
      }

      async fn find_by_idempotency_key(
        &self,
        user_id: Option<&str>,
        key: &str,
      ) -> Result<Option<$crate::models::OrderId>, $crate::store::StoreError> {
        let found = match user_id {
          Some(user_id) => {
            sqlx::query_scalar::<_, $crate::models::OrderId>($crate::store::sql::FIND_BY_KEY_FOR_USER)
              .bind(user_id)
              .bind(key)
              .fetch_optional(&self.pool)
              .await?
          }
          None => {
            sqlx::query_scalar::<_, $crate::models::OrderId>($crate::store::sql::FIND_BY_KEY_FOR_GUEST)
              .bind(key)
              .fetch_optional(&self.pool)
              .await?
          }
        };
        Ok(found)
      }

      #[tracing::instrument(name = "OrderStore::orders_for_user", skip(self), fields(backend = $backend))]
      async fn orders_for_user(
        &self,
        user_id: &str,
      ) -> Result<Vec<$crate::models::OrderDetails>, $crate::store::StoreError> {
        let rows = sqlx::query_as::<_, $crate::store::OrderLineRow>($crate::store::sql::ORDERS_FOR_USER)
          .bind(user_id)
          .fetch_all(&self.pool)
          .await?;
        tracing::debug!(rows = rows.len(), "Fetched order lines.");
        Ok($crate::store::group_order_lines(rows))
      }

      async fn find_order(
        &self,
        order_id: $crate::models::OrderId,
      ) -> Result<Option<$crate::models::OrderDetails>, $crate::store::StoreError> {
        let rows = sqlx::query_as::<_, $crate::store::OrderLineRow>($crate::store::sql::ORDER_BY_ID)
          .bind(order_id)
          .fetch_all(&self.pool)
          .await?;
        Ok($crate::store::group_order_lines(rows).into_iter().next())
      }

      async fn ensure_schema(&self) -> Result<(), $crate::store::StoreError> {
        for statement in $schema {
          sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!(backend = $backend, "Order schema ensured.");
        Ok(())
      }

      async fn ping(&self) -> Result<(), $crate::store::StoreError> {
        sqlx::query($crate::store::sql::PING).execute(&self.pool).await?;
        Ok(())
      }
    }
  };
}

pub(crate) use bind_order_header;
pub(crate) use bind_order_item;
pub(crate) use sqlx_order_store;

pub mod mysql_schema {
  pub const CREATE_ORDERS: &str = "CREATE TABLE IF NOT EXISTS orders (
    order_id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
    user_id VARCHAR(64) NULL,
    country VARCHAR(255) NOT NULL,
    first_name VARCHAR(255) NOT NULL,
    last_name VARCHAR(255) NOT NULL,
    address VARCHAR(255) NOT NULL,
    city VARCHAR(255) NOT NULL,
    state VARCHAR(255) NOT NULL,
    zip_code VARCHAR(255) NOT NULL,
    phone_number VARCHAR(255) NOT NULL,
    email_address VARCHAR(255) NOT NULL,
    subtotal_cents BIGINT NOT NULL,
    tax_cents BIGINT NOT NULL,
    total_cents BIGINT NOT NULL,
    idempotency_key VARCHAR(128) NULL,
    created_at DATETIME(6) NOT NULL,
    owner_key VARCHAR(64) GENERATED ALWAYS AS (COALESCE(user_id, '')) STORED NOT NULL,
    UNIQUE KEY uq_orders_owner_idempotency (owner_key, idempotency_key),
    KEY idx_orders_user_created (user_id, created_at)
  ) ENGINE=InnoDB";

  pub const CREATE_ORDER_ITEMS: &str = "CREATE TABLE IF NOT EXISTS order_items (
    id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
    order_id BIGINT NOT NULL,
    product_name VARCHAR(255) NOT NULL,
    product_image VARCHAR(512) NULL,
    price_cents BIGINT NOT NULL,
    quantity INT NOT NULL,
    CONSTRAINT fk_order_items_order FOREIGN KEY (order_id) REFERENCES orders (order_id),
    CONSTRAINT chk_order_items_quantity CHECK (quantity >= 1),
    CONSTRAINT chk_order_items_price CHECK (price_cents >= 0)
  ) ENGINE=InnoDB";

  pub const ALL: [&str; 2] = [CREATE_ORDERS, CREATE_ORDER_ITEMS];
}

pub mod sqlite_schema {
  pub const CREATE_ORDERS: &str = "CREATE TABLE IF NOT EXISTS orders (
    order_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NULL,
    country TEXT NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    address TEXT NOT NULL,
    city TEXT NOT NULL,
    state TEXT NOT NULL,
    zip_code TEXT NOT NULL,
    phone_number TEXT NOT NULL,
    email_address TEXT NOT NULL,
    subtotal_cents INTEGER NOT NULL,
    tax_cents INTEGER NOT NULL,
    total_cents INTEGER NOT NULL,
    idempotency_key TEXT NULL,
    created_at TEXT NOT NULL
  )";

  pub const CREATE_OWNER_IDEMPOTENCY_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS uq_orders_owner_idempotency \
    ON orders (COALESCE(user_id, ''), idempotency_key)";

  pub const CREATE_ORDERS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_orders_user_created ON orders (user_id, created_at)";

  pub const CREATE_ORDER_ITEMS: &str = "CREATE TABLE IF NOT EXISTS order_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id INTEGER NOT NULL REFERENCES orders (order_id),
    product_name TEXT NOT NULL,
    product_image TEXT NULL,
    price_cents INTEGER NOT NULL CHECK (price_cents >= 0),
    quantity INTEGER NOT NULL CHECK (quantity >= 1)
  )";

  pub const ALL: [&str; 4] = [
    CREATE_ORDERS,
    CREATE_OWNER_IDEMPOTENCY_INDEX,
    CREATE_ORDERS_INDEX,
    CREATE_ORDER_ITEMS,
  ];
}
