// storefront/src/models/order.rs

use super::money::Money;
use super::order_item::{CartLine, OrderItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Store-assigned order identifier (auto-increment, never reused).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct OrderId(pub i64);

impl fmt::Display for OrderId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

/// Shipping address. Every field is required; missing fields deserialize
/// as empty strings and are rejected by validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingDetails {
  pub country: String,
  pub first_name: String,
  pub last_name: String,
  pub address: String,
  pub city: String,
  pub state: String,
  pub zip_code: String,
  pub phone_number: String,
  pub email_address: String,
}

impl ShippingDetails {
  /// `(wire name, value)` for every field, in column order.
  pub fn fields(&self) -> [(&'static str, &str); 9] {
    [
      ("country", self.country.as_str()),
      ("first_name", self.first_name.as_str()),
      ("last_name", self.last_name.as_str()),
      ("address", self.address.as_str()),
      ("city", self.city.as_str()),
      ("state", self.state.as_str()),
      ("zip_code", self.zip_code.as_str()),
      ("phone_number", self.phone_number.as_str()),
      ("email_address", self.email_address.as_str()),
    ]
  }
}

/// A proposed order: who buys, what, where it ships, and the totals the
/// caller computed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewOrder {
  #[serde(default, rename = "userID", alias = "userId", alias = "user_id")]
  pub user_id: Option<String>,
  #[serde(default)]
  pub items: Vec<CartLine>,
  #[serde(default)]
  pub shipping: ShippingDetails,
  #[serde(rename = "subTotal", alias = "subtotal")]
  pub subtotal: Money,
  pub tax: Money,
  pub total: Money,
  #[serde(default, rename = "idempotencyKey")]
  pub idempotency_key: Option<String>,
}

impl NewOrder {
  /// The owning user, or `None` for a guest (blank ids count as absent).
  pub fn owner(&self) -> Option<&str> {
    self.user_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
  }

  pub fn idempotency_key(&self) -> Option<&str> {
    self.idempotency_key.as_deref().map(str::trim).filter(|key| !key.is_empty())
  }
}

/// An order header as stored.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Order {
  #[serde(rename = "orderID")]
  pub order_id: OrderId,
  #[serde(rename = "userID")]
  pub user_id: Option<String>,
  pub country: String,
  pub first_name: String,
  pub last_name: String,
  pub address: String,
  pub city: String,
  pub state: String,
  pub zip_code: String,
  pub phone_number: String,
  pub email_address: String,
  #[serde(rename = "subTotal")]
  #[sqlx(rename = "subtotal_cents")]
  pub subtotal: Money,
  #[sqlx(rename = "tax_cents")]
  pub tax: Money,
  #[sqlx(rename = "total_cents")]
  pub total: Money,
  pub created_at: DateTime<Utc>,
}

/// An order with its line items in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetails {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<OrderItem>,
}

/// Acknowledgement of a successful `place_order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
  #[serde(rename = "orderID")]
  pub order_id: OrderId,
  /// True when an earlier order with the same idempotency key was returned
  /// and nothing new was written.
  pub replayed: bool,
}

impl Placement {
  pub fn created(order_id: OrderId) -> Self {
    Self {
      order_id,
      replayed: false,
    }
  }

  pub fn replayed(order_id: OrderId) -> Self {
    Self {
      order_id,
      replayed: true,
    }
  }
}
