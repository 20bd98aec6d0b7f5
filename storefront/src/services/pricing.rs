// storefront/src/services/pricing.rs

//! Cart pricing: a site-wide percentage discount applied to unit prices,
//! then tax on the discounted subtotal. Both rates are configuration.

use crate::models::{CartLine, Money};
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_TAX_RATE_BPS: u32 = 1200;
pub const MAX_TAX_RATE_BPS: u32 = 10_000;
pub const MAX_DISCOUNT_PERCENT: u8 = 90;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
  #[error("Invalid pricing policy: {0}")]
  InvalidPolicy(String),

  #[error("Cart line {position} cannot be priced: {reason}")]
  InvalidLine { position: usize, reason: String },

  #[error("Cart total overflows the supported money range")]
  Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
  tax_rate_bps: u32,
  discount_percent: u8,
}

/// Totals for a cart under a given policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
  #[serde(rename = "subTotal")]
  pub subtotal: Money,
  pub tax: Money,
  pub total: Money,
  #[serde(rename = "discountPercent")]
  pub discount_percent: u8,
}

impl Default for PricingPolicy {
  fn default() -> Self {
    Self {
      tax_rate_bps: DEFAULT_TAX_RATE_BPS,
      discount_percent: 0,
    }
  }
}

impl PricingPolicy {
  /// `tax_rate_bps` is in basis points (1200 = 12 %).
  pub fn new(tax_rate_bps: u32, discount_percent: u8) -> Result<Self, PricingError> {
    if tax_rate_bps > MAX_TAX_RATE_BPS {
      return Err(PricingError::InvalidPolicy(format!(
        "tax rate {} bps exceeds {} bps",
        tax_rate_bps, MAX_TAX_RATE_BPS
      )));
    }
    if discount_percent > MAX_DISCOUNT_PERCENT {
      return Err(PricingError::InvalidPolicy(format!(
        "discount {}% exceeds {}%",
        discount_percent, MAX_DISCOUNT_PERCENT
      )));
    }
    Ok(Self {
      tax_rate_bps,
      discount_percent,
    })
  }

  pub fn tax_rate_bps(&self) -> u32 {
    self.tax_rate_bps
  }

  pub fn discount_percent(&self) -> u8 {
    self.discount_percent
  }

  /// Unit price after the site discount, rounded half up to the cent.
  pub fn discounted(&self, price: Money) -> Money {
    let keep = i128::from(100 - self.discount_percent);
    Money::from_cents(scale_half_up(price.cents(), keep, 100))
  }

  pub fn quote(&self, lines: &[CartLine]) -> Result<Quote, PricingError> {
    let mut subtotal = Money::ZERO;
    for (index, line) in lines.iter().enumerate() {
      let position = index + 1;
      if line.price.is_negative() {
        return Err(PricingError::InvalidLine {
          position,
          reason: "negative price".to_string(),
        });
      }
      if line.quantity < 1 {
        return Err(PricingError::InvalidLine {
          position,
          reason: "quantity must be at least 1".to_string(),
        });
      }
      let line_total = self
        .discounted(line.price)
        .checked_mul(line.quantity)
        .ok_or(PricingError::Overflow)?;
      subtotal = subtotal.checked_add(line_total).ok_or(PricingError::Overflow)?;
    }
    let tax = Money::from_cents(scale_half_up(subtotal.cents(), i128::from(self.tax_rate_bps), 10_000));
    let total = subtotal.checked_add(tax).ok_or(PricingError::Overflow)?;
    Ok(Quote {
      subtotal,
      tax,
      total,
      discount_percent: self.discount_percent,
    })
  }
}

/// `cents * numerator / denominator` rounded half up. Inputs are
/// non-negative and `numerator <= denominator`, so the result fits.
fn scale_half_up(cents: i64, numerator: i128, denominator: i128) -> i64 {
  let scaled = (i128::from(cents) * numerator * 2 + denominator) / (denominator * 2);
  scaled as i64
}

#[cfg(test)]
mod tests {
  use super::*;

  fn line(price_cents: i64, quantity: i64) -> CartLine {
    CartLine {
      name: "Figurine".to_string(),
      image: None,
      price: Money::from_cents(price_cents),
      quantity,
    }
  }

  #[test]
  fn default_policy_reproduces_checkout_totals() {
    let quote = PricingPolicy::default()
      .quote(&[line(1999, 2), line(950, 1)])
      .unwrap();
    assert_eq!(quote.subtotal, Money::from_cents(4948));
    assert_eq!(quote.tax, Money::from_cents(594));
    assert_eq!(quote.total, Money::from_cents(5542));
  }

  #[test]
  fn discount_applies_to_unit_price_before_quantity() {
    let policy = PricingPolicy::new(1200, 15).unwrap();
    // 19.99 * 0.85 = 16.9915 -> 16.99
    assert_eq!(policy.discounted(Money::from_cents(1999)), Money::from_cents(1699));
    let quote = policy.quote(&[line(1999, 3)]).unwrap();
    assert_eq!(quote.subtotal, Money::from_cents(5097));
    assert_eq!(quote.tax, Money::from_cents(612));
    assert_eq!(quote.total, Money::from_cents(5709));
    assert_eq!(quote.discount_percent, 15);
  }

  #[test]
  fn half_cents_round_up() {
    let policy = PricingPolicy::new(1000, 50).unwrap();
    assert_eq!(policy.discounted(Money::from_cents(5)), Money::from_cents(3));
    let quote = policy.quote(&[line(10, 1)]).unwrap();
    assert_eq!(quote.tax, Money::from_cents(1));
  }

  #[test]
  fn rejects_out_of_range_policies() {
    assert!(matches!(PricingPolicy::new(10_001, 0), Err(PricingError::InvalidPolicy(_))));
    assert!(matches!(PricingPolicy::new(1200, 91), Err(PricingError::InvalidPolicy(_))));
  }

  #[test]
  fn rejects_unpriceable_lines_and_overflow() {
    let policy = PricingPolicy::default();
    assert_eq!(
      policy.quote(&[line(100, 1), line(100, 0)]),
      Err(PricingError::InvalidLine {
        position: 2,
        reason: "quantity must be at least 1".to_string()
      })
    );
    assert_eq!(policy.quote(&[line(i64::MAX / 2, 3)]), Err(PricingError::Overflow));
  }

  #[test]
  fn empty_cart_quotes_zero() {
    let quote = PricingPolicy::default().quote(&[]).unwrap();
    assert_eq!(quote.total, Money::ZERO);
  }
}
