//! # Validation Module
//!
//! Field-level input checks shared by the request drafts in [`crate::types`].
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                       │
//! │  ├── Closed enums: unknown estado / metodo_pago rejected                │
//! │  └── Money / Quantity must parse as decimals                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Presence of required fields                                        │
//! │  └── Ranges (price, quantity ≥ 0 and capped, month 1..=12), formats    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── UNIQUE (customer email, closing date)                              │
//! │  └── CHECK constraints on enum columns                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Datelike, NaiveDate};

use crate::error::ValidationError;
use crate::money::{Money, Quantity};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Largest unit price accepted: $10,000,000.00.
pub const MAX_PRICE: Money = Money::from_cents(1_000_000_000);

/// Largest line quantity accepted: 100,000 units.
pub const MAX_QUANTITY: Quantity = Quantity::from_thousandths(100_000_000);

/// Wire format of every date the API accepts.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// String Validators
// =============================================================================

/// Returns the trimmed value of a required text field.
///
/// ## Example
/// ```rust
/// use carniceria_core::validation::require_text;
///
/// assert_eq!(require_text("nombre", Some(" Vacío ".into()), 100).unwrap(), "Vacío");
/// assert!(require_text("nombre", Some("  ".into()), 100).is_err());
/// assert!(require_text("nombre", None, 100).is_err());
/// ```
pub fn require_text(field: &str, value: Option<String>, max: usize) -> ValidationResult<String> {
    let value = value.as_deref().map(str::trim).unwrap_or_default();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Trims an optional text field, mapping blank to `None`.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Minimal email shape check: something on both sides of a single `@`.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "expected name@domain".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Prices may be zero but never negative, and at most [`MAX_PRICE`].
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if price > MAX_PRICE {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            max: MAX_PRICE.to_string(),
        });
    }
    Ok(())
}

/// Quantities may be zero but never negative, and at most [`MAX_QUANTITY`].
pub fn validate_quantity(field: &str, qty: Quantity) -> ValidationResult<()> {
    if qty.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if qty > MAX_QUANTITY {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            max: MAX_QUANTITY.to_string(),
        });
    }
    Ok(())
}

/// Months are 1-based.
pub fn validate_month(month: u32) -> ValidationResult<()> {
    if !(1..=12).contains(&month) {
        return Err(ValidationError::OutOfRange {
            field: "mes".to_string(),
            min: 1,
            max: 12,
        });
    }
    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Parses a `YYYY-MM-DD` date.
///
/// ```rust
/// use carniceria_core::validation::parse_date;
///
/// assert!(parse_date("fecha", "2025-02-28").is_ok());
/// assert!(parse_date("fecha", "2025-02-30").is_err());
/// assert!(parse_date("fecha", "28/02/2025").is_err());
/// ```
pub fn parse_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("'{}' is not a YYYY-MM-DD date", value),
        }
    })
}

/// First and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> ValidationResult<(NaiveDate, NaiveDate)> {
    validate_month(month)?;

    let out_of_range = || ValidationError::OutOfRange {
        field: "anio".to_string(),
        min: 1,
        max: 9999,
    };
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(out_of_range)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let last = next.and_then(|d| d.pred_opt()).ok_or_else(out_of_range)?;

    debug_assert_eq!(last.month(), month);
    Ok((first, last))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        assert_eq!(require_text("corte", Some("Cerdo".into()), 20).unwrap(), "Cerdo");
        assert!(matches!(
            require_text("corte", Some("x".repeat(21)), 20),
            Err(ValidationError::TooLong { max: 20, .. })
        ));
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(Some("  ".into())), None);
        assert_eq!(optional_text(Some(" 555-1234 ".into())), Some("555-1234".to_string()));
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("ana").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ana@").is_err());
        assert!(validate_email("a@b@c").is_err());
    }

    #[test]
    fn test_validate_price_and_quantity() {
        assert!(validate_price("precio", Money::zero()).is_ok());
        assert!(validate_price("precio", MAX_PRICE).is_ok());
        assert!(validate_price("precio", Money::from_cents(-1)).is_err());
        assert!(matches!(
            validate_price("precio", Money::from_cents(90_000_000_000_000_000)),
            Err(ValidationError::TooLarge { .. })
        ));

        assert!(validate_quantity("cantidad", Quantity::from_thousandths(0)).is_ok());
        assert!(validate_quantity("cantidad", MAX_QUANTITY).is_ok());
        assert!(matches!(
            validate_quantity("cantidad", Quantity::from_thousandths(-1)),
            Err(ValidationError::Negative { .. })
        ));
        assert!(matches!(
            validate_quantity("cantidad", Quantity::from_thousandths(10_000_000_000_000_000)),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_month_bounds() {
        let (first, last) = month_bounds(2024, 2).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let (_, last) = month_bounds(2025, 12).unwrap();
        assert_eq!(last, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());

        assert!(month_bounds(2025, 0).is_err());
        assert!(month_bounds(2025, 13).is_err());
    }
}
