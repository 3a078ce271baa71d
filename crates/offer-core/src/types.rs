//! # Domain Types
//!
//! Records of the offer form as stored by the persistence layer.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    FormMeta     │   │  FormPosition   │   │   OfferTerms    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  form_id (FK)   │   │  discount       │       │
//! │  │  supplier_name  │   │  ordinal (OZ)   │   │  vat_rate       │       │
//! │  │  status         │   │  quantity       │   │  cash_discount  │       │
//! │  │  general_comment│   │  unit_price_net │   │  days           │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────────┐                         │
//! │  │   FormStatus    │   │ DocumentOutboxEntry  │                         │
//! │  │  Draft          │   │  webhook hand-off    │                         │
//! │  │  Submitted      │   └──────────────────────┘                         │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::pricing::{DiscountKind, PricingInput};
use crate::validation::PartialPricingInput;
use crate::DEFAULT_VAT_RATE_PERCENT;

// =============================================================================
// Form Status
// =============================================================================

/// Lifecycle of a form. Stored with the German labels the data store uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum FormStatus {
    /// Supplier is still filling in prices.
    #[serde(rename = "entwurf")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "entwurf"))]
    Draft,
    /// Offer was handed in; the form is locked.
    #[serde(rename = "abgegeben")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "abgegeben"))]
    Submitted,
}

impl FormStatus {
    /// Returns the stored label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            FormStatus::Draft => "entwurf",
            FormStatus::Submitted => "abgegeben",
        }
    }

    /// Reads a stored label. Missing or unknown labels count as a draft.
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some("abgegeben") => FormStatus::Submitted,
            _ => FormStatus::Draft,
        }
    }
}

impl Default for FormStatus {
    fn default() -> Self {
        FormStatus::Draft
    }
}

// =============================================================================
// Form Meta
// =============================================================================

/// Header of an offer form. One per supplier link.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FormMeta {
    /// Unique identifier (UUID v4), the `id` in the supplier link.
    pub id: String,

    /// Supplier the form was sent to.
    pub supplier_name: String,

    pub status: FormStatus,

    /// Calculation this request for quotation belongs to.
    pub calculation_id: Option<String>,

    /// Free text the supplier adds to the whole offer.
    pub general_comment: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl FormMeta {
    /// Checks if the offer was already handed in.
    #[inline]
    pub fn is_submitted(&self) -> bool {
        self.status == FormStatus::Submitted
    }
}

// =============================================================================
// Form Position
// =============================================================================

/// A line item the supplier prices.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FormPosition {
    pub id: String,

    /// Form this position belongs to.
    pub form_id: String,

    /// Ordinal number (OZ) from the bill of quantities, e.g. "01.02.0010".
    pub ordinal: Option<String>,

    /// Short description.
    pub description: String,

    #[ts(type = "string | null")]
    pub quantity: Option<Decimal>,

    /// Unit of measure ("m²", "Stk", ...).
    pub unit: Option<String>,

    /// Net unit price entered by the supplier.
    #[ts(type = "string | null")]
    pub unit_price_net: Option<Decimal>,

    /// Article number in the purchasing system.
    pub item_number: Option<String>,

    /// Long text of the bill of quantities.
    pub long_text: Option<String>,

    /// Supplier comment on this position.
    pub comment: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl FormPosition {
    /// Line total before discount: quantity × unit price.
    ///
    /// A position without quantity is a lump sum and counts once. A
    /// position without price contributes nothing. Values beyond
    /// [`crate::MAX_AMOUNT`] saturate instead of overflowing.
    pub fn line_total(&self) -> Decimal {
        let quantity = self.quantity.unwrap_or(Decimal::ONE);
        let price = self.unit_price_net.unwrap_or(Decimal::ZERO);
        quantity.saturating_mul(price)
    }

    /// Checks if a price greater than zero was entered.
    #[inline]
    pub fn has_price(&self) -> bool {
        self.unit_price_net.is_some_and(|p| p > Decimal::ZERO)
    }
}

// =============================================================================
// Offer Terms
// =============================================================================

/// The pricing parameters the supplier chooses for the whole offer.
///
/// Only the chosen discount representation is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OfferTerms {
    pub discount_kind: DiscountKind,

    #[ts(type = "string")]
    pub discount_value: Decimal,

    #[ts(type = "string")]
    pub vat_rate_percent: Decimal,

    #[ts(type = "string")]
    pub cash_discount_rate_percent: Decimal,

    pub cash_discount_days: u32,
}

impl OfferTerms {
    /// Builds the engine input for a given net total.
    pub fn pricing_input(&self, net_total: Decimal) -> PricingInput {
        PricingInput {
            net_total,
            discount_value: self.discount_value,
            discount_kind: self.discount_kind,
            vat_rate_percent: self.vat_rate_percent,
            cash_discount_rate_percent: self.cash_discount_rate_percent,
            cash_discount_days: self.cash_discount_days,
        }
    }

    /// Returns the terms as a fully populated partial input for validation.
    pub fn as_partial(&self) -> PartialPricingInput {
        PartialPricingInput {
            net_total: None,
            discount_value: Some(self.discount_value),
            discount_kind: Some(self.discount_kind),
            vat_rate_percent: Some(self.vat_rate_percent),
            cash_discount_rate_percent: Some(self.cash_discount_rate_percent),
            cash_discount_days: Some(self.cash_discount_days),
        }
    }
}

impl Default for OfferTerms {
    fn default() -> Self {
        OfferTerms {
            discount_kind: DiscountKind::Percentage,
            discount_value: Decimal::ZERO,
            vat_rate_percent: Decimal::from(DEFAULT_VAT_RATE_PERCENT),
            cash_discount_rate_percent: Decimal::ZERO,
            cash_discount_days: 0,
        }
    }
}

// =============================================================================
// Document Generation
// =============================================================================

/// Body posted to the document-generation webhook after submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentRequest {
    /// Id of the submitted form.
    pub uuid: String,
}

impl DocumentRequest {
    pub fn new(form_id: impl Into<String>) -> Self {
        DocumentRequest {
            uuid: form_id.into(),
        }
    }

    /// Serializes the webhook body.
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A queued webhook call. Written in the same transaction as the
/// submission; an external dispatcher delivers it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentOutboxEntry {
    pub id: String,
    pub form_id: String,
    /// Endpoint the payload is posted to.
    pub webhook_url: String,
    /// JSON body, see [`DocumentRequest`].
    pub payload: String,
    pub attempts: i64,
    pub last_error: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub attempted_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub delivered_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn position(quantity: Option<i64>, price: Option<Decimal>) -> FormPosition {
        FormPosition {
            id: "p1".to_string(),
            form_id: "f1".to_string(),
            ordinal: Some("01.0010".to_string()),
            description: "Drywall".to_string(),
            quantity: quantity.map(Decimal::from),
            unit: Some("m²".to_string()),
            unit_price_net: price,
            item_number: None,
            long_text: None,
            comment: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_form_status_labels() {
        assert_eq!(FormStatus::Submitted.as_str(), "abgegeben");
        assert_eq!(FormStatus::from_label(Some("abgegeben")), FormStatus::Submitted);
        assert_eq!(FormStatus::from_label(Some("entwurf")), FormStatus::Draft);
        assert_eq!(FormStatus::from_label(None), FormStatus::Draft);
        assert_eq!(FormStatus::default(), FormStatus::Draft);

        let json = serde_json::to_string(&FormStatus::Submitted).unwrap();
        assert_eq!(json, "\"abgegeben\"");
    }

    #[test]
    fn test_line_total() {
        assert_eq!(
            position(Some(3), Some(Decimal::new(1250, 2))).line_total(),
            Decimal::new(3750, 2)
        );
        // Lump sum
        assert_eq!(
            position(None, Some(Decimal::from(80))).line_total(),
            Decimal::from(80)
        );
        assert_eq!(position(Some(5), None).line_total(), Decimal::ZERO);
    }

    #[test]
    fn test_line_total_saturates() {
        let huge = position(Some(100), Some(Decimal::MAX));
        assert_eq!(huge.line_total(), Decimal::MAX);
    }

    #[test]
    fn test_has_price() {
        assert!(position(Some(1), Some(Decimal::ONE)).has_price());
        assert!(!position(Some(1), Some(Decimal::ZERO)).has_price());
        assert!(!position(Some(1), None).has_price());
    }

    #[test]
    fn test_offer_terms_default() {
        let terms = OfferTerms::default();
        assert_eq!(terms.vat_rate_percent, Decimal::from(19));
        assert_eq!(terms.discount_kind, DiscountKind::Percentage);

        let input = terms.pricing_input(Decimal::from(100));
        assert_eq!(input.net_total, Decimal::from(100));
        assert_eq!(input.vat_rate_percent, Decimal::from(19));
    }

    #[test]
    fn test_document_request_payload() {
        let body = DocumentRequest::new("abc").to_json().unwrap();
        assert_eq!(body, r#"{"uuid":"abc"}"#);
    }
}
