//! # Error Types
//!
//! Domain-specific error types for offer-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  offer-core errors (this file)                                         │
//! │  ├── CoreError        - Form rule violations                           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  offer-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── AppError         - What the user sees                             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → AppError → terminal               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pricing engine itself never fails; these errors come from the form
//! rules around it.

use rust_decimal::Decimal;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Offer form rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The form was already handed in and can no longer be edited.
    ///
    /// ## When This Occurs
    /// - Editing a price or comment after submission
    /// - Submitting the same form twice
    #[error("Form {form_id} has already been submitted")]
    FormLocked { form_id: String },

    /// Position id does not belong to the form.
    #[error("Position not found: {0}")]
    PositionNotFound(String),

    /// Submission attempted without a single priced position.
    #[error("At least one position must have a price")]
    NoPricesEntered,

    /// Some positions have no price and the supplier did not confirm.
    ///
    /// ## User Workflow
    /// ```text
    /// Submit
    ///   │
    ///   ▼
    /// 3 positions without price
    ///   │
    ///   ▼
    /// IncompleteOffer { missing: 3 }
    ///   │
    ///   ▼
    /// UI asks: "Submit without completing all entries?"
    ///   │
    ///   ▼
    /// Submit again with confirmation
    /// ```
    #[error("{missing} position(s) have no price; confirm to submit anyway")]
    IncompleteOffer { missing: usize },

    /// Webhook payload could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// A percentage outside 0-100.
    #[error("{field} must be between 0 and 100, got {value}")]
    PercentOutOfRange { field: String, value: Decimal },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Amount beyond [`crate::MAX_AMOUNT`].
    #[error("{field} must not exceed {max}")]
    AmountTooLarge { field: String, max: Decimal },

    /// Invalid format (e.g., invalid UUID, unreadable number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::FormLocked {
            form_id: "f-1".to_string(),
        };
        assert_eq!(err.to_string(), "Form f-1 has already been submitted");

        let err = CoreError::IncompleteOffer { missing: 2 };
        assert_eq!(
            err.to_string(),
            "2 position(s) have no price; confirm to submit anyway"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::PercentOutOfRange {
            field: "vat_rate_percent".to_string(),
            value: Decimal::new(10001, 2),
        };
        assert_eq!(
            err.to_string(),
            "vat_rate_percent must be between 0 and 100, got 100.01"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
