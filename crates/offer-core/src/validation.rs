//! # Validation Module
//!
//! Input validation for the offer form.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Front end                                                    │
//! │  └── sanitize_price_input: only digits, dots and commas                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── is_valid_pricing_input: rate ranges before accepting terms        │
//! │  └── field validators: ids, prices, comments                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Pricing engine                                               │
//! │  └── accepts anything, never clamps                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use offer_core::pricing::DiscountKind;
//! use offer_core::validation::{is_valid_pricing_input, PartialPricingInput};
//! use rust_decimal::Decimal;
//!
//! let input = PartialPricingInput {
//!     discount_kind: Some(DiscountKind::Percentage),
//!     discount_value: Some(Decimal::from(150)),
//!     ..Default::default()
//! };
//! assert!(!is_valid_pricing_input(&input));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::pricing::DiscountKind;
use crate::{MAX_AMOUNT, MAX_COMMENT_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// A pricing input as typed so far. Absent fields validate as `0` and
/// [`DiscountKind::Percentage`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialPricingInput {
    pub net_total: Option<Decimal>,
    pub discount_value: Option<Decimal>,
    pub discount_kind: Option<DiscountKind>,
    pub vat_rate_percent: Option<Decimal>,
    pub cash_discount_rate_percent: Option<Decimal>,
    pub cash_discount_days: Option<u32>,
}

// =============================================================================
// Pricing Input
// =============================================================================

/// Checks the rate ranges of a pricing input.
///
/// ## Rules
/// - Percentage discount: 0 ≤ value ≤ 100
/// - Fixed discount and net total: magnitude ≤ [`MAX_AMOUNT`]
/// - VAT rate: 0 ≤ rate ≤ 100
/// - Cash discount rate: 0 ≤ rate ≤ 100
///
/// `cash_discount_days`, the sign of the net total and cross-field
/// relations (a fixed discount above the net total) are not checked.
pub fn is_valid_pricing_input(input: &PartialPricingInput) -> bool {
    validate_pricing_input(input).is_ok()
}

/// Same rules as [`is_valid_pricing_input`], reporting the first violation.
pub fn validate_pricing_input(input: &PartialPricingInput) -> ValidationResult<()> {
    let discount_kind = input.discount_kind.unwrap_or_default();
    let discount_value = input.discount_value.unwrap_or(Decimal::ZERO);

    match discount_kind {
        DiscountKind::Percentage => validate_percent("discount_value", discount_value)?,
        DiscountKind::Fixed => validate_amount("discount_value", discount_value)?,
    }

    if let Some(net_total) = input.net_total {
        validate_amount("net_total", net_total)?;
    }

    validate_percent(
        "vat_rate_percent",
        input.vat_rate_percent.unwrap_or(Decimal::ZERO),
    )?;
    validate_percent(
        "cash_discount_rate_percent",
        input.cash_discount_rate_percent.unwrap_or(Decimal::ZERO),
    )?;

    Ok(())
}

/// Validates a plain percentage (0 to 100, both inclusive).
///
/// ## Example
/// ```rust
/// use offer_core::validation::validate_percent;
/// use rust_decimal::Decimal;
///
/// assert!(validate_percent("vat", Decimal::from(100)).is_ok());
/// assert!(validate_percent("vat", Decimal::new(10001, 2)).is_err());
/// ```
pub fn validate_percent(field: &str, value: Decimal) -> ValidationResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::PercentOutOfRange {
            field: field.to_string(),
            value,
        });
    }

    Ok(())
}

// =============================================================================
// Field Validators
// =============================================================================

/// Checks that an amount's magnitude stays within [`MAX_AMOUNT`].
pub fn validate_amount(field: &str, value: Decimal) -> ValidationResult<()> {
    let max = Decimal::from(MAX_AMOUNT);
    if value.abs() > max {
        return Err(ValidationError::AmountTooLarge {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a unit price. Zero is allowed (free positions).
pub fn validate_unit_price(price: Decimal) -> ValidationResult<()> {
    if price < Decimal::ZERO {
        return Err(ValidationError::MustBeNonNegative {
            field: "unit_price_net".to_string(),
        });
    }

    validate_amount("unit_price_net", price)
}

/// Validates an imported position quantity.
pub fn validate_quantity(quantity: Decimal) -> ValidationResult<()> {
    validate_amount("quantity", quantity)
}

/// Validates a fixed discount amount.
///
/// A discount above the net total is allowed and surfaces as a pricing
/// warning instead.
pub fn validate_fixed_discount(amount: Decimal) -> ValidationResult<()> {
    if amount < Decimal::ZERO {
        return Err(ValidationError::MustBeNonNegative {
            field: "discount_value".to_string(),
        });
    }

    validate_amount("discount_value", amount)
}

/// Validates a position or general comment.
pub fn validate_comment(comment: &str) -> ValidationResult<()> {
    if comment.chars().count() > MAX_COMMENT_LENGTH {
        return Err(ValidationError::TooLong {
            field: "comment".to_string(),
            max: MAX_COMMENT_LENGTH,
        });
    }

    Ok(())
}

/// Validates a form id from the supplier link.
///
/// ## Example
/// ```rust
/// use offer_core::validation::validate_form_id;
///
/// assert!(validate_form_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_form_id("not-a-uuid").is_err());
/// ```
pub fn validate_form_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn vat(value: &str) -> PartialPricingInput {
        PartialPricingInput {
            vat_rate_percent: Some(d(value)),
            ..Default::default()
        }
    }

    fn cash(value: &str) -> PartialPricingInput {
        PartialPricingInput {
            cash_discount_rate_percent: Some(d(value)),
            ..Default::default()
        }
    }

    fn discount(kind: DiscountKind, value: &str) -> PartialPricingInput {
        PartialPricingInput {
            discount_kind: Some(kind),
            discount_value: Some(d(value)),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_input_is_valid() {
        assert!(is_valid_pricing_input(&PartialPricingInput::default()));
    }

    #[test]
    fn test_vat_boundaries() {
        assert!(is_valid_pricing_input(&vat("0")));
        assert!(is_valid_pricing_input(&vat("19")));
        assert!(is_valid_pricing_input(&vat("100")));
        assert!(!is_valid_pricing_input(&vat("100.01")));
        assert!(!is_valid_pricing_input(&vat("-0.01")));
    }

    #[test]
    fn test_cash_discount_boundaries() {
        assert!(is_valid_pricing_input(&cash("0")));
        assert!(is_valid_pricing_input(&cash("100")));
        assert!(!is_valid_pricing_input(&cash("100.01")));
        assert!(!is_valid_pricing_input(&cash("-0.01")));
    }

    #[test]
    fn test_percentage_discount_boundaries() {
        assert!(is_valid_pricing_input(&discount(DiscountKind::Percentage, "0")));
        assert!(is_valid_pricing_input(&discount(DiscountKind::Percentage, "100")));
        assert!(!is_valid_pricing_input(&discount(DiscountKind::Percentage, "100.01")));
        assert!(!is_valid_pricing_input(&discount(DiscountKind::Percentage, "-0.01")));
    }

    #[test]
    fn test_missing_kind_defaults_to_percentage() {
        let input = PartialPricingInput {
            discount_value: Some(d("150")),
            ..Default::default()
        };
        assert!(!is_valid_pricing_input(&input));
    }

    #[test]
    fn test_fixed_discount_is_not_a_percentage() {
        assert!(is_valid_pricing_input(&discount(DiscountKind::Fixed, "100.01")));
        assert!(is_valid_pricing_input(&discount(DiscountKind::Fixed, "500000")));
        assert!(is_valid_pricing_input(&discount(DiscountKind::Fixed, "1000000000000")));
        assert!(!is_valid_pricing_input(&discount(DiscountKind::Fixed, "1000000000000.01")));
    }

    #[test]
    fn test_days_and_net_total_sign_are_not_checked() {
        let input = PartialPricingInput {
            net_total: Some(d("-5")),
            cash_discount_days: Some(10_000),
            ..Default::default()
        };
        assert!(is_valid_pricing_input(&input));
    }

    #[test]
    fn test_net_total_bound() {
        let at_max = PartialPricingInput {
            net_total: Some(Decimal::from(MAX_AMOUNT)),
            ..Default::default()
        };
        assert!(is_valid_pricing_input(&at_max));

        let huge = PartialPricingInput {
            net_total: Some(d("70000000000000000000000000000")),
            ..Default::default()
        };
        assert!(matches!(
            validate_pricing_input(&huge),
            Err(ValidationError::AmountTooLarge { ref field, .. }) if field == "net_total"
        ));
    }

    #[test]
    fn test_validate_reports_field() {
        let err = validate_pricing_input(&cash("101")).unwrap_err();
        assert_eq!(
            err,
            ValidationError::PercentOutOfRange {
                field: "cash_discount_rate_percent".to_string(),
                value: d("101"),
            }
        );
    }

    #[test]
    fn test_validate_unit_price() {
        assert!(validate_unit_price(Decimal::ZERO).is_ok());
        assert!(validate_unit_price(d("12.5")).is_ok());
        assert!(validate_unit_price(d("-0.01")).is_err());
        assert!(validate_unit_price(Decimal::from(MAX_AMOUNT)).is_ok());
        assert!(matches!(
            validate_unit_price(d("1000000000000000000000000000")),
            Err(ValidationError::AmountTooLarge { .. })
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(d("184.5")).is_ok());
        assert!(validate_quantity(d("-3")).is_ok());
        assert!(validate_quantity(d("1000000000000.5")).is_err());
    }

    #[test]
    fn test_validate_fixed_discount() {
        assert!(validate_fixed_discount(d("999999")).is_ok());
        assert!(validate_fixed_discount(d("-1")).is_err());
        assert!(validate_fixed_discount(d("2000000000000")).is_err());
    }

    #[test]
    fn test_validate_comment() {
        assert!(validate_comment("Lieferzeit 3 Wochen").is_ok());
        assert!(validate_comment(&"ä".repeat(MAX_COMMENT_LENGTH)).is_ok());
        assert!(validate_comment(&"a".repeat(MAX_COMMENT_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_form_id() {
        assert!(validate_form_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_form_id("").is_err());
        assert!(validate_form_id("not-a-uuid").is_err());
    }
}
