//! # Pricing Module
//!
//! The pricing pipeline that turns the offer's net total and its terms
//! (discount, VAT, cash discount) into the full breakdown shown under the
//! line items.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Pricing Pipeline                                  │
//! │                                                                         │
//! │  net_total (Σ quantity × unit price)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. discount_amount    = net_total × discount%   (or fixed amount)     │
//! │  2. net_after_discount = net_total − discount_amount                    │
//! │  3. vat_amount         = net_after_discount × vat%                      │
//! │  4. gross_total        = net_after_discount + vat_amount                │
//! │  5. cash_discount      = gross_total × cash_discount%                   │
//! │  6. final_gross_total  = gross_total − cash_discount                    │
//! │  7. final_net_total    = final_gross_total / (1 + vat%)                 │
//! │                                                                         │
//! │  Each stage consumes the previous one. Nothing is clamped.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use offer_core::pricing::{compute_pricing, DiscountKind, PricingInput};
//! use rust_decimal::Decimal;
//!
//! let input = PricingInput {
//!     net_total: Decimal::from(1000),
//!     discount_value: Decimal::from(10),
//!     discount_kind: DiscountKind::Percentage,
//!     vat_rate_percent: Decimal::from(19),
//!     cash_discount_rate_percent: Decimal::ZERO,
//!     cash_discount_days: 0,
//! };
//!
//! let result = compute_pricing(&input);
//! assert_eq!(result.gross_total, Decimal::from(1071));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Number of fractional digits shown for currency values.
pub const CURRENCY_DECIMALS: u32 = 2;

// =============================================================================
// Discount Kind
// =============================================================================

/// How `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `discount_value` is a percentage of the net total (0-100).
    Percentage,
    /// `discount_value` is an absolute currency amount.
    Fixed,
}

impl Default for DiscountKind {
    fn default() -> Self {
        DiscountKind::Percentage
    }
}

// =============================================================================
// Input / Result
// =============================================================================

/// A complete snapshot of the six pricing inputs.
///
/// Built fresh for every recompute. Callers never mutate one while a
/// computation is running; they build a new one from the latest values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingInput {
    /// Net amount before discount (sum of line totals).
    #[ts(type = "string")]
    pub net_total: Decimal,

    /// Percentage or currency amount, see `discount_kind`.
    #[ts(type = "string")]
    pub discount_value: Decimal,

    pub discount_kind: DiscountKind,

    /// VAT rate as a plain percentage (19 = 19%).
    #[ts(type = "string")]
    pub vat_rate_percent: Decimal,

    /// Cash discount (Skonto) rate as a plain percentage.
    #[ts(type = "string")]
    pub cash_discount_rate_percent: Decimal,

    /// Payment term for the cash discount. Informational only.
    pub cash_discount_days: u32,
}

impl PricingInput {
    /// Returns the same input with the discount expressed as `kind`.
    ///
    /// The monetary effect of the discount is kept: switching a 10%
    /// discount on 1000 to [`DiscountKind::Fixed`] yields a value of 100.
    /// Only one representation is ever stored; the other one is derived
    /// through [`DiscountView`].
    ///
    /// ## Example
    /// ```rust
    /// use offer_core::pricing::{DiscountKind, PricingInput};
    /// use rust_decimal::Decimal;
    ///
    /// let input = PricingInput {
    ///     net_total: Decimal::from(1000),
    ///     discount_value: Decimal::from(10),
    ///     ..Default::default()
    /// };
    /// let fixed = input.with_discount_kind(DiscountKind::Fixed);
    /// assert_eq!(fixed.discount_value, Decimal::from(100));
    /// ```
    pub fn with_discount_kind(self, kind: DiscountKind) -> Self {
        if kind == self.discount_kind {
            return self;
        }

        let view = DiscountView::derive(&self);
        let discount_value = match kind {
            DiscountKind::Percentage => view.percentage,
            DiscountKind::Fixed => view.amount,
        };

        PricingInput {
            discount_value,
            discount_kind: kind,
            ..self
        }
    }
}

/// The full derived breakdown. Has no identity and is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingResult {
    #[ts(type = "string")]
    pub net_total: Decimal,
    #[ts(type = "string")]
    pub discount_amount: Decimal,
    #[ts(type = "string")]
    pub net_after_discount: Decimal,
    #[ts(type = "string")]
    pub vat_amount: Decimal,
    #[ts(type = "string")]
    pub gross_total: Decimal,
    #[ts(type = "string")]
    pub cash_discount_amount: Decimal,
    #[ts(type = "string")]
    pub final_gross_total: Decimal,
    #[ts(type = "string")]
    pub final_net_total: Decimal,
}

impl PricingResult {
    /// Returns a copy with every figure rounded to cents, for display.
    pub fn rounded(&self) -> Self {
        PricingResult {
            net_total: round_currency(self.net_total),
            discount_amount: round_currency(self.discount_amount),
            net_after_discount: round_currency(self.net_after_discount),
            vat_amount: round_currency(self.vat_amount),
            gross_total: round_currency(self.gross_total),
            cash_discount_amount: round_currency(self.cash_discount_amount),
            final_gross_total: round_currency(self.final_gross_total),
            final_net_total: round_currency(self.final_net_total),
        }
    }
}

// =============================================================================
// Pricing Engine
// =============================================================================

/// Computes the pricing breakdown for one input snapshot.
///
/// Pure and infallible: out-of-range inputs (negative rates, a fixed
/// discount above the net total) flow through the arithmetic and can yield
/// negative totals. Products and sums saturate at `Decimal::MAX` /
/// `Decimal::MIN` rather than overflow. Run
/// [`crate::validation::is_valid_pricing_input`] before trusting a result
/// for submission.
///
/// ## Final Net Total
/// The last stage removes VAT from the post-cash-discount gross using the
/// same `vat_rate_percent` as stage 3. It is NOT
/// `net_after_discount − cash_discount_amount`; the two differ whenever the
/// cash discount is non-zero.
///
/// ```text
/// net 1000, VAT 19%, cash discount 2%
///   gross_total       = 1190
///   cash_discount     = 23.80
///   final_gross_total = 1166.20
///   final_net_total   = 1166.20 / 1.19 = 980     (not 1000 − 23.80)
/// ```
pub fn compute_pricing(input: &PricingInput) -> PricingResult {
    let hundred = Decimal::ONE_HUNDRED;

    let discount_amount = match input.discount_kind {
        DiscountKind::Percentage => input
            .net_total
            .saturating_mul(input.discount_value / hundred),
        DiscountKind::Fixed => input.discount_value,
    };

    let net_after_discount = input.net_total.saturating_sub(discount_amount);

    let vat_amount = net_after_discount.saturating_mul(input.vat_rate_percent / hundred);
    let gross_total = net_after_discount.saturating_add(vat_amount);

    let cash_discount_amount =
        gross_total.saturating_mul(input.cash_discount_rate_percent / hundred);
    let final_gross_total = gross_total.saturating_sub(cash_discount_amount);

    // Divisor is above 1 here, so the quotient cannot overflow.
    let final_net_total = if input.vat_rate_percent > Decimal::ZERO {
        final_gross_total
            .checked_div(Decimal::ONE + input.vat_rate_percent / hundred)
            .unwrap_or(final_gross_total)
    } else {
        final_gross_total
    };

    PricingResult {
        net_total: input.net_total,
        discount_amount,
        net_after_discount,
        vat_amount,
        gross_total,
        cash_discount_amount,
        final_gross_total,
        final_net_total,
    }
}

/// Rounds a currency value to cents, half away from zero.
#[inline]
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CURRENCY_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

// =============================================================================
// Discount View
// =============================================================================

/// Both representations of the discount, derived on demand for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountView {
    /// Discount as a percentage of the net total.
    #[ts(type = "string")]
    pub percentage: Decimal,
    /// Discount as a currency amount.
    #[ts(type = "string")]
    pub amount: Decimal,
}

impl DiscountView {
    /// Derives the view from the canonical `discount_kind` + `discount_value`.
    ///
    /// A fixed discount on a zero net total has no meaningful percentage
    /// and is shown as 0%, as is a share too large to represent.
    pub fn derive(input: &PricingInput) -> Self {
        match input.discount_kind {
            DiscountKind::Percentage => DiscountView {
                percentage: input.discount_value,
                amount: input
                    .net_total
                    .saturating_mul(input.discount_value / Decimal::ONE_HUNDRED),
            },
            DiscountKind::Fixed => {
                let percentage = input
                    .discount_value
                    .checked_div(input.net_total)
                    .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
                    .unwrap_or(Decimal::ZERO);
                DiscountView {
                    percentage,
                    amount: input.discount_value,
                }
            }
        }
    }
}

// =============================================================================
// Warnings
// =============================================================================

/// Conditions worth showing next to the totals.
///
/// Warnings never change the result; an over-discount stays negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricingWarning {
    /// The discount is larger than the net total it applies to.
    DiscountExceedsNetTotal {
        #[ts(type = "string")]
        discount_amount: Decimal,
        #[ts(type = "string")]
        net_total: Decimal,
    },
    /// The final gross total came out below zero.
    NegativeGrossTotal {
        #[ts(type = "string")]
        final_gross_total: Decimal,
    },
}

/// Lists the warnings for a computed breakdown.
pub fn pricing_warnings(input: &PricingInput, result: &PricingResult) -> Vec<PricingWarning> {
    let mut warnings = Vec::new();

    if result.discount_amount > input.net_total {
        warnings.push(PricingWarning::DiscountExceedsNetTotal {
            discount_amount: result.discount_amount,
            net_total: input.net_total,
        });
    }

    if result.final_gross_total < Decimal::ZERO {
        warnings.push(PricingWarning::NegativeGrossTotal {
            final_gross_total: result.final_gross_total,
        });
    }

    warnings
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

    fn input(net: &str, kind: DiscountKind, discount: &str, vat: &str, cash: &str) -> PricingInput {
        PricingInput {
            net_total: d(net),
            discount_value: d(discount),
            discount_kind: kind,
            vat_rate_percent: d(vat),
            cash_discount_rate_percent: d(cash),
            cash_discount_days: 14,
        }
    }

    #[test]
    fn test_zero_rates_return_net_total_everywhere() {
        let net = d("1234.56");
        let result = compute_pricing(&input("1234.56", DiscountKind::Percentage, "0", "0", "0"));

        assert_eq!(result.net_total, net);
        assert_eq!(result.discount_amount, Decimal::ZERO);
        assert_eq!(result.net_after_discount, net);
        assert_eq!(result.vat_amount, Decimal::ZERO);
        assert_eq!(result.gross_total, net);
        assert_eq!(result.cash_discount_amount, Decimal::ZERO);
        assert_eq!(result.final_gross_total, net);
        assert_eq!(result.final_net_total, net);
    }

    #[test]
    fn test_percentage_discount() {
        let result = compute_pricing(&input("1000", DiscountKind::Percentage, "10", "19", "0"));

        assert_eq!(result.discount_amount, d("100"));
        assert_eq!(result.net_after_discount, d("900"));
        assert_eq!(result.vat_amount, d("171"));
        assert_eq!(result.gross_total, d("1071"));
        assert_eq!(result.cash_discount_amount, Decimal::ZERO);
        assert_eq!(result.final_gross_total, d("1071"));
        // Without cash discount the back-calculation lands on the discounted net
        assert_eq!(result.final_net_total, d("900"));
        assert_eq!(result.final_net_total, result.net_after_discount);
    }

    #[test]
    fn test_fixed_discount() {
        let result = compute_pricing(&input("1000", DiscountKind::Fixed, "50", "19", "0"));

        assert_eq!(result.discount_amount, d("50"));
        assert_eq!(result.net_after_discount, d("950"));
        assert_eq!(result.vat_amount, d("180.5"));
        assert_eq!(result.gross_total, d("1130.5"));
    }

    #[test]
    fn test_cash_discount_back_calculates_net() {
        let result = compute_pricing(&input("1000", DiscountKind::Percentage, "0", "19", "2"));

        assert_eq!(result.gross_total, d("1190"));
        assert_eq!(result.cash_discount_amount, d("23.8"));
        assert_eq!(result.final_gross_total, d("1166.2"));
        assert_eq!(result.final_net_total, d("1166.2") / d("1.19"));
        assert_eq!(result.final_net_total, d("980"));

        // The reverse-derived net is not the running net minus the cash discount
        let running = result.net_after_discount - result.cash_discount_amount;
        assert_eq!(running, d("976.2"));
        assert_ne!(result.final_net_total, running);
    }

    #[test]
    fn test_cash_discount_with_non_terminating_division() {
        let result = compute_pricing(&input("999.99", DiscountKind::Percentage, "3", "7", "2.5"));

        // 999.99 × 0.97 = 969.9903; × 1.07 = 1037.889621; × 0.975 = 1011.942380475
        assert_eq!(result.final_gross_total, d("1011.942380475"));
        assert_eq!(round_currency(result.final_net_total), d("945.74"));
        assert_eq!(result.rounded().final_net_total, d("945.74"));
    }

    #[test]
    fn test_zero_vat_skips_division() {
        let result = compute_pricing(&input("333.33", DiscountKind::Percentage, "0", "0", "3"));

        assert_eq!(result.final_net_total, result.final_gross_total);
        assert_eq!(result.final_gross_total, d("323.3301"));
    }

    #[test]
    fn test_negative_vat_is_not_divided() {
        let result = compute_pricing(&input("100", DiscountKind::Percentage, "0", "-100", "0"));

        assert_eq!(result.gross_total, Decimal::ZERO);
        assert_eq!(result.final_net_total, result.final_gross_total);
    }

    #[test]
    fn test_over_discount_passes_through() {
        let result = compute_pricing(&input("100", DiscountKind::Fixed, "500", "19", "0"));

        assert_eq!(result.net_after_discount, d("-400"));
        assert_eq!(result.vat_amount, d("-76"));
        assert_eq!(result.gross_total, d("-476"));
        assert_eq!(result.final_gross_total, d("-476"));
        assert!(result.final_net_total < Decimal::ZERO);
    }

    #[test]
    fn test_out_of_range_net_total_saturates() {
        let huge = input(
            "70000000000000000000000000000",
            DiscountKind::Percentage,
            "0",
            "19",
            "2",
        );
        let result = compute_pricing(&huge);

        assert_eq!(result.gross_total, Decimal::MAX);
        assert!(result.final_gross_total > Decimal::ZERO);
        assert!(result.final_net_total < result.final_gross_total);

        let mut negative = input("1", DiscountKind::Fixed, "0", "0", "0");
        negative.discount_value = Decimal::MIN;
        assert_eq!(compute_pricing(&negative).net_after_discount, Decimal::MAX);
    }

    #[test]
    fn test_discount_view_with_tiny_net_total() {
        let tiny = input(
            "0.0000000000000000000000000001",
            DiscountKind::Fixed,
            "1000000",
            "19",
            "0",
        );
        assert_eq!(DiscountView::derive(&tiny).percentage, Decimal::ZERO);
    }

    #[test]
    fn test_days_do_not_affect_arithmetic() {
        let mut a = input("1000", DiscountKind::Percentage, "5", "19", "2");
        let b = compute_pricing(&a);
        a.cash_discount_days = 90;
        assert_eq!(compute_pricing(&a), b);
    }

    #[test]
    fn test_rounded_result() {
        let result = PricingResult {
            net_total: d("10.005"),
            final_net_total: d("-10.005"),
            ..Default::default()
        };
        let rounded = result.rounded();
        assert_eq!(rounded.net_total, d("10.01"));
        assert_eq!(rounded.final_net_total, d("-10.01"));
    }

    #[test]
    fn test_discount_view() {
        let pct = input("1000", DiscountKind::Percentage, "10", "19", "0");
        let view = DiscountView::derive(&pct);
        assert_eq!(view.percentage, d("10"));
        assert_eq!(view.amount, d("100"));

        let fixed = input("800", DiscountKind::Fixed, "200", "19", "0");
        let view = DiscountView::derive(&fixed);
        assert_eq!(view.percentage, d("25"));
        assert_eq!(view.amount, d("200"));

        let empty = input("0", DiscountKind::Fixed, "50", "19", "0");
        assert_eq!(DiscountView::derive(&empty).percentage, Decimal::ZERO);
    }

    #[test]
    fn test_with_discount_kind_keeps_monetary_effect() {
        let pct = input("1000", DiscountKind::Percentage, "10", "19", "2");
        let fixed = pct.with_discount_kind(DiscountKind::Fixed);

        assert_eq!(fixed.discount_kind, DiscountKind::Fixed);
        assert_eq!(fixed.discount_value, d("100"));
        assert_eq!(compute_pricing(&fixed), compute_pricing(&pct));

        let back = fixed.with_discount_kind(DiscountKind::Percentage);
        assert_eq!(back.discount_value, d("10"));

        // Same kind is a no-op
        assert_eq!(pct.with_discount_kind(DiscountKind::Percentage), pct);
    }

    #[test]
    fn test_warnings() {
        let ok = input("1000", DiscountKind::Fixed, "50", "19", "0");
        assert!(pricing_warnings(&ok, &compute_pricing(&ok)).is_empty());

        let over = input("100", DiscountKind::Fixed, "500", "19", "0");
        let warnings = pricing_warnings(&over, &compute_pricing(&over));
        assert_eq!(warnings.len(), 2);
        assert!(matches!(
            warnings[0],
            PricingWarning::DiscountExceedsNetTotal { .. }
        ));
        assert!(matches!(
            warnings[1],
            PricingWarning::NegativeGrossTotal { .. }
        ));
    }

    #[test]
    fn test_discount_kind_default() {
        assert_eq!(DiscountKind::default(), DiscountKind::Percentage);
    }

    #[test]
    fn test_result_serializes_amounts_as_strings() {
        let result = compute_pricing(&input("1000", DiscountKind::Fixed, "50", "19", "0"));
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["gross_total"], "1130.50");
    }
}
