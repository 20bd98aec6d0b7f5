// storefront/src/models/order_item.rs

use super::money::Money;
use super::order::OrderId;
use serde::{Deserialize, Serialize};

/// One line of the cart snapshot handed to checkout.
///
/// Field aliases accept the storefront frontend's `pic` and `qty` names.
/// `quantity` is signed so that a negative value reaches validation
/// instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
  #[serde(default)]
  pub name: String,
  #[serde(default, alias = "pic")]
  pub image: Option<String>,
  pub price: Money,
  #[serde(alias = "qty")]
  pub quantity: i64,
}

/// A persisted line item. `price` is the unit price at purchase time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItem {
  pub id: i64,
  #[serde(rename = "orderID")]
  pub order_id: OrderId,
  pub product_name: String,
  pub product_image: Option<String>,
  pub price: Money,
  pub quantity: i32,
}
