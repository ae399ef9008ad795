//! # Money and Quantity
//!
//! Fixed-point numeric types for prices and weights.
//!
//! ## Why Integers?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    1.15 kg × $8.90 = 10.234999999999999  ❌                             │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Minor Units                                      │
//! │    Money    = cents        (i64)   $8.90   → 890                        │
//! │    Quantity = thousandths  (i64)   1.15 kg → 1150                       │
//! │    890 × 1150 = 1_023_500 → /1000 → 1023.5 → 1024 cents (half-up)       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! The shop frontend sends and expects plain JSON numbers (`10.5`, `1.25`).
//! Both types serialize as numbers and deserialize from numbers or numeric
//! strings. Incoming values go through their decimal text form, never through
//! float multiplication, so `5.5` becomes exactly 550 cents.
//!
//! ```rust
//! use carniceria_core::money::{Money, Quantity};
//!
//! let price = Money::from_cents(1000);          // $10.00 per kg
//! let weight = Quantity::from_thousandths(2000); // 2.000 kg
//! assert_eq!(price.checked_times(weight).map(|m| m.cents()), Some(2000));
//! ```

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Cents per currency unit.
const MONEY_SCALE: u32 = 2;

/// Thousandths per quantity unit (grams per kilogram).
const QUANTITY_SCALE: u32 = 3;

// =============================================================================
// Money
// =============================================================================

/// A monetary value in cents.
///
/// Signed so that differences can go negative; prices themselves are
/// validated non-negative before they reach storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity, rounding half-up to the cent.
    ///
    /// Returns `None` when the product does not fit in an `i64` of cents.
    ///
    /// ## Example
    /// ```rust
    /// use carniceria_core::money::{Money, Quantity};
    ///
    /// let per_kg = Money::from_cents(890);            // $8.90 / kg
    /// let weight = Quantity::from_thousandths(1150);  // 1.150 kg
    /// assert_eq!(per_kg.checked_times(weight), Some(Money::from_cents(1024)));
    ///
    /// let huge = Money::from_cents(i64::MAX);
    /// assert_eq!(huge.checked_times(Quantity::from_units(2)), None);
    /// ```
    pub fn checked_times(&self, qty: Quantity) -> Option<Money> {
        let raw = i128::from(self.0) * i128::from(qty.0);
        let divisor = 10_i128.pow(QUANTITY_SCALE);
        let half = divisor / 2;
        let rounded = if raw >= 0 {
            (raw + half) / divisor
        } else {
            (raw - half) / divisor
        };
        i64::try_from(rounded).ok().map(Money)
    }

    /// Sum of two amounts, `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Average of `self` over `count` items, rounded half-up to the cent.
    ///
    /// Returns `None` when `count` is zero, so empty reports carry a null
    /// average instead of dividing by zero.
    ///
    /// ```rust
    /// use carniceria_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(15000).average_over(2), Some(Money::from_cents(7500)));
    /// assert_eq!(Money::from_cents(100).average_over(3), Some(Money::from_cents(33)));
    /// assert_eq!(Money::zero().average_over(0), None);
    /// ```
    pub fn average_over(&self, count: i64) -> Option<Money> {
        if count <= 0 {
            return None;
        }
        let total = self.0 as i128;
        let count = count as i128;
        let rounded = if total >= 0 {
            (total * 2 + count) / (count * 2)
        } else {
            (total * 2 - count) / (count * 2)
        };
        Some(Money(rounded as i64))
    }

    /// Value in currency units, for serialization only.
    fn as_major(&self) -> f64 {
        self.0 as f64 / 10_f64.powi(MONEY_SCALE as i32)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_major())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer
            .deserialize_any(FixedPointVisitor {
                scale: MONEY_SCALE,
                what: "amount",
            })
            .map(Money)
    }
}

// =============================================================================
// Quantity
// =============================================================================

/// A sold quantity in thousandths of its unit (grams when sold by the kg).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Quantity(i64);

impl Quantity {
    #[inline]
    pub const fn from_thousandths(thousandths: i64) -> Self {
        Quantity(thousandths)
    }

    /// Whole units (1 kg, 1 piece).
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * 1000)
    }

    #[inline]
    pub const fn thousandths(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    fn as_units(&self) -> f64 {
        self.0 as f64 / 10_f64.powi(QUANTITY_SCALE as i32)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:03}", sign, abs / 1000, abs % 1000)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_units())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer
            .deserialize_any(FixedPointVisitor {
                scale: QUANTITY_SCALE,
                what: "quantity",
            })
            .map(Quantity)
    }
}

// =============================================================================
// Decimal Parsing
// =============================================================================

/// Accepts JSON numbers and numeric strings, producing a scaled integer.
struct FixedPointVisitor {
    scale: u32,
    what: &'static str,
}

impl<'de> Visitor<'de> for FixedPointVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a decimal {}", self.what)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        v.checked_mul(10_i64.pow(self.scale))
            .ok_or_else(|| E::custom(format!("{} out of range", self.what)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        let v = i64::try_from(v).map_err(|_| E::custom(format!("{} out of range", self.what)))?;
        self.visit_i64(v)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
        if !v.is_finite() {
            return Err(E::custom(format!("{} must be a finite number", self.what)));
        }
        // f64's Display is the shortest round-trip decimal and never uses
        // exponent notation
        parse_fixed(&v.to_string(), self.scale)
            .ok_or_else(|| E::custom(format!("{} out of range", self.what)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
        parse_fixed(v.trim(), self.scale)
            .ok_or_else(|| E::custom(format!("invalid {}: '{}'", self.what, v)))
    }
}

/// Parses a plain decimal string (`-12.345`) into an integer scaled by
/// `10^scale`, rounding half-up on the first dropped digit.
pub(crate) fn parse_fixed(input: &str, scale: u32) -> Option<i64> {
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };

    let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole_value: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };

    let mut frac_digits = frac.bytes().map(|b| i64::from(b - b'0'));
    let mut frac_value: i64 = 0;
    for _ in 0..scale {
        frac_value = frac_value * 10 + frac_digits.next().unwrap_or(0);
    }
    let round_up = frac_digits.next().is_some_and(|d| d >= 5);

    let mut value = whole_value
        .checked_mul(10_i64.checked_pow(scale)?)?
        .checked_add(frac_value)?;
    if round_up {
        value = value.checked_add(1)?;
    }

    Some(if negative { -value } else { value })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "$10.99");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Quantity::from_thousandths(1250).to_string(), "1.250");
    }

    #[test]
    fn test_times_exact() {
        let line = Money::from_cents(1000).checked_times(Quantity::from_units(2));
        assert_eq!(line, Some(Money::from_cents(2000)));

        let line = Money::from_cents(550).checked_times(Quantity::from_units(1));
        assert_eq!(line, Some(Money::from_cents(550)));
    }

    #[test]
    fn test_times_rounds_half_up() {
        // 0.333 kg × $1.50 = $0.4995 → $0.50
        let line = Money::from_cents(150).checked_times(Quantity::from_thousandths(333));
        assert_eq!(line, Some(Money::from_cents(50)));

        // 0.001 kg × $4.99 = $0.00499 → $0.00
        let line = Money::from_cents(499).checked_times(Quantity::from_thousandths(1));
        assert_eq!(line, Some(Money::zero()));
    }

    #[test]
    fn test_average_over() {
        assert_eq!(Money::from_cents(15000).average_over(2).map(|m| m.cents()), Some(7500));
        assert_eq!(Money::from_cents(200).average_over(3).map(|m| m.cents()), Some(67));
        assert_eq!(Money::from_cents(500).average_over(0), None);
    }

    #[test]
    fn test_times_overflow() {
        // 10^13 kg at $100,000.00 does not fit in i64 cents
        let price = Money::from_cents(10_000_000);
        let qty = Quantity::from_thousandths(10_000_000_000_000_000);
        assert_eq!(price.checked_times(qty), None);
    }

    #[test]
    fn test_checked_add() {
        let total = Money::from_cents(2000).checked_add(Money::from_cents(550));
        assert_eq!(total, Some(Money::from_cents(2550)));
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    }

    #[test]
    fn test_parse_fixed() {
        assert_eq!(parse_fixed("10", 2), Some(1000));
        assert_eq!(parse_fixed("5.5", 2), Some(550));
        assert_eq!(parse_fixed(".75", 2), Some(75));
        assert_eq!(parse_fixed("1.005", 2), Some(101));
        assert_eq!(parse_fixed("1.004", 2), Some(100));
        assert_eq!(parse_fixed("-2.5", 3), Some(-2500));
        assert_eq!(parse_fixed("", 2), None);
        assert_eq!(parse_fixed(".", 2), None);
        assert_eq!(parse_fixed("1e5", 2), None);
        assert_eq!(parse_fixed("12a", 2), None);
    }

    #[test]
    fn test_money_json() {
        let price: Money = serde_json::from_str("10.5").unwrap();
        assert_eq!(price.cents(), 1050);

        let price: Money = serde_json::from_str("12").unwrap();
        assert_eq!(price.cents(), 1200);

        let price: Money = serde_json::from_str("\"7.25\"").unwrap();
        assert_eq!(price.cents(), 725);

        assert_eq!(serde_json::to_string(&Money::from_cents(2550)).unwrap(), "25.5");
        assert!(serde_json::from_str::<Money>("\"abc\"").is_err());
    }

    #[test]
    fn test_float_noise_does_not_leak_into_cents() {
        // 0.1 + 0.2 as sent by a JS client
        let price: Money = serde_json::from_str("0.30000000000000004").unwrap();
        assert_eq!(price.cents(), 30);
    }

    #[test]
    fn test_quantity_json() {
        let qty: Quantity = serde_json::from_str("1.25").unwrap();
        assert_eq!(qty.thousandths(), 1250);

        let qty: Quantity = serde_json::from_str("2").unwrap();
        assert_eq!(qty.thousandths(), 2000);

        assert_eq!(serde_json::to_string(&Quantity::from_thousandths(500)).unwrap(), "0.5");
    }
}
