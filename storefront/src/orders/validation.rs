// storefront/src/orders/validation.rs

use super::error::OrderError;
use crate::models::{Money, NewOrder};

pub const MAX_TEXT_LEN: usize = 255;
pub const MAX_USER_ID_LEN: usize = 64;
pub const MAX_IMAGE_REF_LEN: usize = 512;
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

/// Allowed gap, in cents, between `total` and `subtotal + tax`. Each wire
/// amount is rounded to the cent on its own, so exact client totals can
/// land one cent apart.
pub const TOTAL_TOLERANCE_CENTS: i64 = 1;

/// Checkout rules that are configuration rather than code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutPolicy {
  /// Accept orders without a user id.
  pub allow_guest_checkout: bool,
  /// Require `total == subtotal + tax`, within [`TOTAL_TOLERANCE_CENTS`].
  pub enforce_total_consistency: bool,
}

impl Default for CheckoutPolicy {
  fn default() -> Self {
    Self {
      allow_guest_checkout: false,
      enforce_total_consistency: true,
    }
  }
}

impl NewOrder {
  /// Checks the request shape. Runs before any storage resource is touched.
  pub fn validate(&self, policy: &CheckoutPolicy) -> Result<(), OrderError> {
    if self.owner().is_none() && !policy.allow_guest_checkout {
      return Err(OrderError::invalid("userID is required"));
    }
    if let Some(owner) = self.owner() {
      check_len("userID", owner, MAX_USER_ID_LEN)?;
    }

    if self.items.is_empty() {
      return Err(OrderError::invalid("order must contain at least one item"));
    }
    for (index, item) in self.items.iter().enumerate() {
      let position = index + 1;
      if item.name.trim().is_empty() {
        return Err(OrderError::invalid(format!("item {} has no name", position)));
      }
      check_len("item name", &item.name, MAX_TEXT_LEN)?;
      if let Some(image) = item.image.as_deref() {
        check_len("item image", image, MAX_IMAGE_REF_LEN)?;
      }
      if item.price.is_negative() {
        return Err(OrderError::invalid(format!("item {} has a negative price", position)));
      }
      if item.quantity < 1 {
        return Err(OrderError::invalid(format!("item {} quantity must be at least 1", position)));
      }
      if item.quantity > i64::from(i32::MAX) {
        return Err(OrderError::invalid(format!("item {} quantity is too large", position)));
      }
    }

    for (field, value) in self.shipping.fields() {
      if value.trim().is_empty() {
        return Err(OrderError::invalid(format!("shipping field '{}' is required", field)));
      }
      check_len(field, value, MAX_TEXT_LEN)?;
    }

    for (field, amount) in [("subTotal", self.subtotal), ("tax", self.tax), ("total", self.total)] {
      if amount.is_negative() {
        return Err(OrderError::invalid(format!("{} must not be negative", field)));
      }
    }
    if policy.enforce_total_consistency {
      let consistent = self
        .subtotal
        .checked_add(self.tax)
        .and_then(|expected| self.total.cents().checked_sub(expected.cents()))
        .map_or(false, |gap| gap.abs() <= TOTAL_TOLERANCE_CENTS);
      if !consistent {
        return Err(OrderError::invalid(format!(
          "total {} does not equal subTotal {} plus tax {}",
          self.total, self.subtotal, self.tax
        )));
      }
    }

    if self.idempotency_key.is_some() {
      match self.idempotency_key() {
        None => return Err(OrderError::invalid("idempotency key must not be blank")),
        Some(key) if key.chars().count() > MAX_IDEMPOTENCY_KEY_LEN => {
          return Err(OrderError::invalid(format!(
            "idempotency key exceeds {} characters",
            MAX_IDEMPOTENCY_KEY_LEN
          )));
        }
        Some(_) => {}
      }
    }
    Ok(())
  }

  /// Sum of `price * quantity` over the items, `None` on overflow.
  pub fn items_subtotal(&self) -> Option<Money> {
    self.items.iter().try_fold(Money::ZERO, |acc, item| {
      item.price.checked_mul(item.quantity).and_then(|line| acc.checked_add(line))
    })
  }
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), OrderError> {
  if value.trim().chars().count() > max {
    return Err(OrderError::invalid(format!("{} exceeds {} characters", field, max)));
  }
  Ok(())
}
