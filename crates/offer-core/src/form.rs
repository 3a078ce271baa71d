//! # Offer Form Module
//!
//! The in-memory offer a supplier edits: positions, comments and terms,
//! plus the rules that lock the form once it is handed in.
//!
//! ## Supplier Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  open link ?id=<uuid>                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  OfferForm (meta + positions + terms)                                  │
//! │       │                                                                 │
//! │       ├── set_unit_price("1.234,50")   ──► net_total() ──► pricing()   │
//! │       ├── set_comment(...)                                             │
//! │       ├── set_terms(discount, VAT, cash discount)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  prepare_submission(confirm_incomplete)                                │
//! │       │                                                                 │
//! │       ├── already submitted?      → FormLocked                         │
//! │       ├── nothing priced?         → NoPricesEntered                    │
//! │       ├── gaps, not confirmed?    → IncompleteOffer                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Submission ──► persisted + document webhook queued (offer-db)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::locale::{parse_number_input, sanitize_price_input, ParsedNumber};
use crate::pricing::{
    compute_pricing, pricing_warnings, DiscountKind, PricingInput, PricingResult, PricingWarning,
};
use crate::types::{DocumentRequest, FormMeta, FormPosition, OfferTerms};
use crate::validation::{
    validate_comment, validate_fixed_discount, validate_pricing_input, validate_unit_price,
    PartialPricingInput,
};

/// The editable fields of one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub id: String,
    pub unit_price_net: Option<Decimal>,
    pub comment: Option<String>,
}

/// Everything persisted when an offer is handed in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub form_id: String,
    pub positions: Vec<PositionUpdate>,
    pub general_comment: Option<String>,
    pub terms: OfferTerms,
    /// Totals at the moment of submission.
    pub pricing: PricingResult,
    /// Webhook body for document generation.
    pub document_request: DocumentRequest,
}

/// A loaded offer form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferForm {
    pub meta: FormMeta,
    /// Ordered by ordinal.
    pub positions: Vec<FormPosition>,
    pub terms: OfferTerms,
}

impl OfferForm {
    pub fn new(meta: FormMeta, positions: Vec<FormPosition>, terms: OfferTerms) -> Self {
        OfferForm {
            meta,
            positions,
            terms,
        }
    }

    // =========================================================================
    // Totals
    // =========================================================================

    /// Sum of all line totals (quantity × unit price), saturating.
    pub fn net_total(&self) -> Decimal {
        self.positions
            .iter()
            .map(FormPosition::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Snapshot of the current net total and terms.
    pub fn pricing_input(&self) -> PricingInput {
        self.terms.pricing_input(self.net_total())
    }

    /// Full breakdown for the current state.
    pub fn pricing(&self) -> PricingResult {
        compute_pricing(&self.pricing_input())
    }

    /// Warnings to show next to the totals.
    pub fn warnings(&self) -> Vec<PricingWarning> {
        let input = self.pricing_input();
        pricing_warnings(&input, &compute_pricing(&input))
    }

    // =========================================================================
    // State Checks
    // =========================================================================

    #[inline]
    pub fn is_submitted(&self) -> bool {
        self.meta.is_submitted()
    }

    /// Fails with [`CoreError::FormLocked`] once the offer was handed in.
    pub fn ensure_editable(&self) -> CoreResult<()> {
        if self.is_submitted() {
            return Err(CoreError::FormLocked {
                form_id: self.meta.id.clone(),
            });
        }
        Ok(())
    }

    /// Checks if at least one position carries a price above zero.
    pub fn has_valid_prices(&self) -> bool {
        self.positions.iter().any(FormPosition::has_price)
    }

    /// Positions the supplier left without a price.
    pub fn unpriced_positions(&self) -> Vec<&FormPosition> {
        self.positions
            .iter()
            .filter(|p| p.unit_price_net.is_none())
            .collect()
    }

    // =========================================================================
    // Edits
    // =========================================================================

    fn position_mut(&mut self, position_id: &str) -> CoreResult<&mut FormPosition> {
        self.positions
            .iter_mut()
            .find(|p| p.id == position_id)
            .ok_or_else(|| CoreError::PositionNotFound(position_id.to_string()))
    }

    /// Sets a unit price from typed German text.
    ///
    /// Characters other than digits, dots and commas are dropped first.
    /// Empty text clears the price.
    ///
    /// ## Example
    /// ```text
    /// "1.234,50 €"  →  Some(1234.50)
    /// ""            →  None
    /// "1,2,3"       →  InvalidFormat
    /// ```
    pub fn set_unit_price(&mut self, position_id: &str, text: &str) -> CoreResult<Option<Decimal>> {
        self.ensure_editable()?;

        let price = match parse_number_input(&sanitize_price_input(text)) {
            ParsedNumber::Empty => None,
            ParsedNumber::Invalid => {
                return Err(ValidationError::InvalidFormat {
                    field: "unit_price_net".to_string(),
                    reason: format!("'{}' is not a number", text.trim()),
                }
                .into())
            }
            ParsedNumber::Value(value) => {
                validate_unit_price(value)?;
                Some(value)
            }
        };

        self.position_mut(position_id)?.unit_price_net = price;
        Ok(price)
    }

    /// Sets or clears a position comment. Blank text clears it.
    pub fn set_comment(&mut self, position_id: &str, comment: Option<&str>) -> CoreResult<()> {
        self.ensure_editable()?;

        let comment = normalize_comment(comment);
        if let Some(ref text) = comment {
            validate_comment(text)?;
        }

        self.position_mut(position_id)?.comment = comment;
        Ok(())
    }

    /// Sets or clears the comment for the whole offer.
    pub fn set_general_comment(&mut self, comment: Option<&str>) -> CoreResult<()> {
        self.ensure_editable()?;

        let comment = normalize_comment(comment);
        if let Some(ref text) = comment {
            validate_comment(text)?;
        }

        self.meta.general_comment = comment;
        Ok(())
    }

    /// Replaces the offer terms after range validation.
    pub fn set_terms(&mut self, terms: OfferTerms) -> CoreResult<()> {
        self.ensure_editable()?;

        validate_pricing_input(&terms.as_partial())?;
        if terms.discount_kind == DiscountKind::Fixed {
            validate_fixed_discount(terms.discount_value)?;
        }

        self.terms = terms;
        Ok(())
    }

    /// Current price and comment of every position, for saving a draft.
    pub fn position_updates(&self) -> Vec<PositionUpdate> {
        self.positions
            .iter()
            .map(|p| PositionUpdate {
                id: p.id.clone(),
                unit_price_net: p.unit_price_net,
                comment: p.comment.clone(),
            })
            .collect()
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Checks the submission rules and captures what must be persisted.
    ///
    /// Positions without a price block the submission unless the supplier
    /// confirmed handing in an incomplete offer.
    pub fn prepare_submission(&self, confirm_incomplete: bool) -> CoreResult<Submission> {
        self.ensure_editable()?;

        if !self.has_valid_prices() {
            return Err(CoreError::NoPricesEntered);
        }

        let missing = self.unpriced_positions().len();
        if missing > 0 && !confirm_incomplete {
            return Err(CoreError::IncompleteOffer { missing });
        }

        validate_pricing_input(&PartialPricingInput {
            net_total: Some(self.net_total()),
            ..self.terms.as_partial()
        })?;

        Ok(Submission {
            form_id: self.meta.id.clone(),
            positions: self.position_updates(),
            general_comment: self.meta.general_comment.clone(),
            terms: self.terms,
            pricing: self.pricing(),
            document_request: DocumentRequest::new(self.meta.id.clone()),
        })
    }
}

fn normalize_comment(comment: Option<&str>) -> Option<String> {
    comment
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

// =============================================================================
// Unit Tests
// =============================================================================
