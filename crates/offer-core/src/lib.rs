//! # offer-core: Pure Business Logic for the Supplier Offer Form
//!
//! This crate is the **heart** of the offer form. It contains the pricing
//! pipeline and the form rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Offer Form Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Front end (web form / offer CLI)                │   │
//! │  │    Positions ──► Prices ──► Terms ──► Totals ──► Submit        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ offer-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  pricing  │  │  locale   │  │   form    │  │validation │  │   │
//! │  │   │ discount  │  │ 1.234,56  │  │ OfferForm │  │  ranges   │  │   │
//! │  │   │ VAT/Skonto│  │ tri-state │  │ submit    │  │  ids      │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    offer-db (SQLite)                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`pricing`] - Discount → VAT → gross → cash discount → net pipeline
//! - [`validation`] - Rate ranges and field checks
//! - [`locale`] - German number formatting and parsing
//! - [`types`] - Form records (meta, positions, terms, outbox)
//! - [`form`] - Editing and submission rules
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output, no logging, no I/O
//! 2. **Decimal Money**: every amount and rate is a `rust_decimal::Decimal`
//! 3. **No Clamping**: the engine passes odd inputs through; validation is a
//!    separate gate
//!
//! ## Example Usage
//!
//! ```rust
//! use offer_core::pricing::{compute_pricing, DiscountKind, PricingInput};
//! use offer_core::locale::format_number;
//! use rust_decimal::Decimal;
//!
//! let result = compute_pricing(&PricingInput {
//!     net_total: Decimal::from(1000),
//!     discount_value: Decimal::from(50),
//!     discount_kind: DiscountKind::Fixed,
//!     vat_rate_percent: Decimal::from(19),
//!     cash_discount_rate_percent: Decimal::ZERO,
//!     cash_discount_days: 0,
//! });
//!
//! assert_eq!(format_number(result.gross_total), "1.130,50");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod form;
pub mod locale;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use form::{OfferForm, PositionUpdate, Submission};
pub use locale::{format_number, parse_number, parse_number_input, ParsedNumber};
pub use pricing::{
    compute_pricing, DiscountKind, DiscountView, PricingInput, PricingResult, PricingWarning,
};
pub use types::*;
pub use validation::{is_valid_pricing_input, PartialPricingInput};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// VAT rate preset for new offers (German standard rate).
pub const DEFAULT_VAT_RATE_PERCENT: u32 = 19;

/// Maximum length of a position or general comment, in characters.
pub const MAX_COMMENT_LENGTH: usize = 2000;

/// Largest magnitude accepted for a unit price, quantity, fixed discount or
/// net total (one trillion). Products of two such values stay far below
/// `Decimal::MAX`.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;
