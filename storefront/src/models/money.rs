// storefront/src/models/money.rs

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Largest decimal amount accepted from the wire. Keeps the cent value
/// exactly representable in an `f64` mantissa.
const MAX_DECIMAL: f64 = 90_000_000_000_000.0;

/// An amount of money in minor units (cents).
///
/// On the JSON wire it is a decimal number such as `19.99`; parsing rounds
/// to the nearest cent. Storage and arithmetic always use the integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, sqlx::Type)]
#[sqlx(transparent)]
pub struct Money(i64);

impl Money {
  pub const ZERO: Money = Money(0);

  pub const fn from_cents(cents: i64) -> Self {
    Money(cents)
  }

  pub const fn cents(self) -> i64 {
    self.0
  }

  /// Converts a decimal amount, rounding to the nearest cent. `None` for
  /// NaN, infinities and values outside the supported range.
  pub fn from_decimal(amount: f64) -> Option<Self> {
    if !amount.is_finite() || amount.abs() > MAX_DECIMAL {
      return None;
    }
    Some(Money((amount * 100.0).round() as i64))
  }

  pub fn as_decimal(self) -> f64 {
    self.0 as f64 / 100.0
  }

  pub const fn is_negative(self) -> bool {
    self.0 < 0
  }

  pub fn checked_add(self, other: Money) -> Option<Money> {
    self.0.checked_add(other.0).map(Money)
  }

  pub fn checked_mul(self, factor: i64) -> Option<Money> {
    self.0.checked_mul(factor).map(Money)
  }
}

impl fmt::Display for Money {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let sign = if self.0 < 0 { "-" } else { "" };
    let abs = self.0.unsigned_abs();
    write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
  }
}

impl Serialize for Money {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(self.as_decimal())
  }
}

impl<'de> Deserialize<'de> for Money {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let amount = f64::deserialize(deserializer)?;
    Money::from_decimal(amount)
      .ok_or_else(|| de::Error::custom(format!("amount {} is not a representable money value", amount)))
  }
}
