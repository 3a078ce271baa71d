//! # Offer Service
//!
//! Orchestrates offer-core and offer-db for the CLI commands.
//!
//! ## Command Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  offer price <form> <position> "1.234,50"                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. load_form (offer-db)                                               │
//! │  2. OfferForm::set_unit_price (offer-core) ← refuses submitted forms   │
//! │  3. update_positions (offer-db)             ← refuses submitted rows   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  updated OfferForm → printed with its pricing breakdown                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every edit is checked twice: once by the in-memory form and once by the
//! guarded SQL, so a form submitted from another session stays locked.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use offer_core::validation::{validate_form_id, validate_quantity};
use offer_core::{
    DiscountKind, DiscountView, DocumentOutboxEntry, FormMeta, FormPosition, FormStatus,
    OfferForm, OfferTerms, PricingInput, PricingResult, PricingWarning,
};
use offer_db::{Database, DbConfig};

// =============================================================================
// Request / Response Types
// =============================================================================

/// Partial change of the offer terms. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermsChange {
    pub discount_kind: Option<DiscountKind>,
    pub discount_value: Option<Decimal>,
    pub vat_rate_percent: Option<Decimal>,
    pub cash_discount_rate_percent: Option<Decimal>,
    pub cash_discount_days: Option<u32>,
}

impl TermsChange {
    /// Applies the change on top of the current pricing input.
    ///
    /// Switching the discount kind without a new value converts the stored
    /// value, so a 10 % discount on 1000 becomes a fixed 100.
    pub fn apply(&self, current: PricingInput) -> OfferTerms {
        let current = match (self.discount_kind, self.discount_value) {
            (Some(kind), None) => current.with_discount_kind(kind),
            _ => current,
        };

        OfferTerms {
            discount_kind: self.discount_kind.unwrap_or(current.discount_kind),
            discount_value: self.discount_value.unwrap_or(current.discount_value),
            vat_rate_percent: self.vat_rate_percent.unwrap_or(current.vat_rate_percent),
            cash_discount_rate_percent: self
                .cash_discount_rate_percent
                .unwrap_or(current.cash_discount_rate_percent),
            cash_discount_days: self.cash_discount_days.unwrap_or(current.cash_discount_days),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == TermsChange::default()
    }
}

/// A position of a bill of quantities to import into a new form.
///
/// ## JSON Format
/// ```json
/// [{ "ordinal": "01.0010", "description": "GK-Wand", "quantity": "184.5", "unit": "m²" }]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct NewPosition {
    #[serde(default)]
    pub ordinal: Option<String>,
    pub description: String,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub item_number: Option<String>,
    #[serde(default)]
    pub long_text: Option<String>,
}

/// Everything `offer show` prints.
#[derive(Debug, Clone)]
pub struct FormOverview {
    pub form: OfferForm,
    /// Breakdown rounded to cents.
    pub pricing: PricingResult,
    pub discount: DiscountView,
    pub warnings: Vec<PricingWarning>,
    /// Positions still without a price.
    pub missing_prices: usize,
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    pub form_id: String,
    /// Totals at submission, rounded to cents.
    pub pricing: PricingResult,
    /// Positions handed in without a price.
    pub missing_prices: usize,
    /// Queued document request.
    pub document: DocumentOutboxEntry,
}

// =============================================================================
// Service
// =============================================================================

/// Use cases behind the `offer` commands.
#[derive(Debug, Clone)]
pub struct OfferService {
    db: Database,
    config: AppConfig,
}

impl OfferService {
    pub fn new(db: Database, config: AppConfig) -> Self {
        OfferService { db, config }
    }

    /// Opens the configured database and runs migrations.
    pub async fn connect(config: AppConfig) -> AppResult<Self> {
        let db_config = DbConfig::new(config.database.path.clone())
            .max_connections(config.database.max_connections);
        let db = Database::new(db_config).await?;
        Ok(OfferService::new(db, config))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Closes the database pool.
    pub async fn close(&self) {
        self.db.close().await;
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// Loads a form by the id from the supplier link.
    pub async fn load(&self, form_id: &str) -> AppResult<OfferForm> {
        validate_form_id(form_id)?;
        Ok(self.db.forms().load_form(form_id).await?)
    }

    /// Loads a form with its pricing breakdown and warnings.
    pub async fn overview(&self, form_id: &str) -> AppResult<FormOverview> {
        let form = self.load(form_id).await?;
        Ok(overview_of(form))
    }

    /// Document requests not yet delivered.
    pub async fn pending_documents(&self, limit: u32) -> AppResult<Vec<DocumentOutboxEntry>> {
        Ok(self.db.document_outbox().get_pending(limit).await?)
    }

    // =========================================================================
    // Creating
    // =========================================================================

    /// Creates a draft form for a supplier with the configured default VAT.
    pub async fn create_form(
        &self,
        supplier_name: &str,
        calculation_id: Option<&str>,
        positions: Vec<NewPosition>,
    ) -> AppResult<OfferForm> {
        let supplier_name = supplier_name.trim();
        if supplier_name.is_empty() {
            return Err(offer_core::ValidationError::Required {
                field: "supplier_name".to_string(),
            }
            .into());
        }

        if positions.iter().any(|p| p.description.trim().is_empty()) {
            return Err(offer_core::ValidationError::Required {
                field: "description".to_string(),
            }
            .into());
        }
        for quantity in positions.iter().filter_map(|p| p.quantity) {
            validate_quantity(quantity)?;
        }

        let now = Utc::now();
        let form_id = Uuid::new_v4().to_string();

        let meta = FormMeta {
            id: form_id.clone(),
            supplier_name: supplier_name.to_string(),
            status: FormStatus::Draft,
            calculation_id: calculation_id.map(str::to_string),
            general_comment: None,
            created_at: now,
            updated_at: now,
        };
        let terms = OfferTerms {
            vat_rate_percent: self.config.defaults.vat_rate_percent,
            ..OfferTerms::default()
        };

        let forms = self.db.forms();
        forms.insert_meta(&meta, &terms).await?;

        for new in positions {
            let position = FormPosition {
                id: Uuid::new_v4().to_string(),
                form_id: form_id.clone(),
                ordinal: new.ordinal,
                description: new.description,
                quantity: new.quantity,
                unit: new.unit,
                unit_price_net: None,
                item_number: new.item_number,
                long_text: new.long_text,
                comment: None,
                created_at: now,
                updated_at: now,
            };
            forms.insert_position(&position).await?;
        }

        info!(form_id = %form_id, supplier = %supplier_name, "Form created");
        self.load(&form_id).await
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Sets a unit price from typed German text ("1.234,50").
    pub async fn set_price(
        &self,
        form_id: &str,
        position_id: &str,
        text: &str,
    ) -> AppResult<OfferForm> {
        let mut form = self.load(form_id).await?;
        let price = form.set_unit_price(position_id, text)?;

        self.save_position(&form, position_id).await?;

        debug!(form_id = %form_id, position_id = %position_id, ?price, "Price saved");
        Ok(form)
    }

    /// Sets or clears a position comment.
    pub async fn set_comment(
        &self,
        form_id: &str,
        position_id: &str,
        comment: Option<&str>,
    ) -> AppResult<OfferForm> {
        let mut form = self.load(form_id).await?;
        form.set_comment(position_id, comment)?;

        self.save_position(&form, position_id).await?;
        Ok(form)
    }

    /// Sets or clears the comment for the whole offer.
    pub async fn set_general_comment(
        &self,
        form_id: &str,
        comment: Option<&str>,
    ) -> AppResult<OfferForm> {
        let mut form = self.load(form_id).await?;
        form.set_general_comment(comment)?;

        self.db
            .forms()
            .update_general_comment(form_id, form.meta.general_comment.as_deref())
            .await?;
        Ok(form)
    }

    /// Changes discount, VAT and cash discount.
    pub async fn update_terms(&self, form_id: &str, change: &TermsChange) -> AppResult<OfferForm> {
        let mut form = self.load(form_id).await?;
        form.set_terms(change.apply(form.pricing_input()))?;

        self.db.forms().update_terms(form_id, &form.terms).await?;
        Ok(form)
    }

    async fn save_position(&self, form: &OfferForm, position_id: &str) -> AppResult<()> {
        let updates: Vec<_> = form
            .position_updates()
            .into_iter()
            .filter(|u| u.id == position_id)
            .collect();

        self.db
            .forms()
            .update_positions(&form.meta.id, &updates)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Hands in the offer and queues the document request.
    ///
    /// ## Errors
    /// - `CoreError::FormLocked` / `DbError::AlreadySubmitted` when already handed in
    /// - `CoreError::NoPricesEntered` when nothing is priced
    /// - `CoreError::IncompleteOffer` when prices are missing and not confirmed
    /// - `AppError::Config` when no webhook URL is configured
    pub async fn submit(&self, form_id: &str, confirm_incomplete: bool) -> AppResult<SubmitReceipt> {
        let webhook_url = self
            .config
            .webhook_url()
            .ok_or_else(|| AppError::config("webhook.url is not configured"))?;

        let form = self.load(form_id).await?;
        let submission = form.prepare_submission(confirm_incomplete)?;
        let missing_prices = form.unpriced_positions().len();

        let document = self.db.forms().submit(&submission, webhook_url).await?;

        Ok(SubmitReceipt {
            form_id: submission.form_id,
            pricing: submission.pricing.rounded(),
            missing_prices,
            document,
        })
    }
}

fn overview_of(form: OfferForm) -> FormOverview {
    let input = form.pricing_input();
    FormOverview {
        pricing: form.pricing().rounded(),
        discount: DiscountView::derive(&input),
        warnings: form.warnings(),
        missing_prices: form.unpriced_positions().len(),
        form,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
