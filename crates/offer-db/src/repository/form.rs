//! # Form Repository
//!
//! Reads and writes offer forms: the `form_meta` header (with the offer
//! terms) and its `form_positions`.
//!
//! ## Submission
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   SINGLE TRANSACTION (submit)                           │
//! │                                                                         │
//! │  1. UPDATE form_meta SET status = 'abgegeben', terms, comment          │
//! │     WHERE id = ? AND status = 'entwurf'                                │
//! │       └── 0 rows? → AlreadySubmitted / NotFound, rollback              │
//! │                                                                         │
//! │  2. UPDATE form_positions SET unit_price_net, comment   (per position) │
//! │                                                                         │
//! │  3. INSERT INTO document_outbox (form_id, webhook_url, {"uuid": id})   │
//! │                                                                         │
//! │  COMMIT ← the document request exists iff the offer was handed in      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Decimal Columns
//! Amounts are TEXT. Reading a value that does not parse as a decimal
//! fails with [`DbError::Decode`] instead of silently becoming zero.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::outbox::DocumentOutboxRepository;
use offer_core::{
    DiscountKind, DocumentOutboxEntry, FormMeta, FormPosition, FormStatus, OfferForm, OfferTerms,
    PositionUpdate, Submission,
};

const META_COLUMNS: &str = r#"
    id, supplier_name, status, calculation_id, general_comment,
    discount_kind, discount_value, vat_rate_percent,
    cash_discount_rate_percent, cash_discount_days,
    created_at, updated_at
"#;

const POSITION_COLUMNS: &str = r#"
    id, form_id, ordinal, description, quantity, unit, unit_price_net,
    item_number, long_text, comment, created_at, updated_at
"#;

/// Repository for offer forms and their positions.
#[derive(Debug, Clone)]
pub struct FormRepository {
    pool: SqlitePool,
}

impl FormRepository {
    /// Creates a new FormRepository.
    pub fn new(pool: SqlitePool) -> Self {
        FormRepository { pool }
    }

    // =========================================================================
    // Inserts
    // =========================================================================

    /// Inserts a form header together with its terms.
    pub async fn insert_meta(&self, meta: &FormMeta, terms: &OfferTerms) -> DbResult<()> {
        debug!(form_id = %meta.id, supplier = %meta.supplier_name, "Inserting form");

        sqlx::query(
            r#"
            INSERT INTO form_meta (
                id, supplier_name, status, calculation_id, general_comment,
                discount_kind, discount_value, vat_rate_percent,
                cash_discount_rate_percent, cash_discount_days,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&meta.id)
        .bind(&meta.supplier_name)
        .bind(meta.status.as_str())
        .bind(&meta.calculation_id)
        .bind(&meta.general_comment)
        .bind(terms.discount_kind)
        .bind(terms.discount_value.to_string())
        .bind(terms.vat_rate_percent.to_string())
        .bind(terms.cash_discount_rate_percent.to_string())
        .bind(i64::from(terms.cash_discount_days))
        .bind(meta.created_at)
        .bind(meta.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a position. The form must exist.
    pub async fn insert_position(&self, position: &FormPosition) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO form_positions (
                id, form_id, ordinal, description, quantity, unit,
                unit_price_net, item_number, long_text, comment,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&position.id)
        .bind(&position.form_id)
        .bind(&position.ordinal)
        .bind(&position.description)
        .bind(position.quantity.map(|q| q.to_string()))
        .bind(&position.unit)
        .bind(position.unit_price_net.map(|p| p.to_string()))
        .bind(&position.item_number)
        .bind(&position.long_text)
        .bind(&position.comment)
        .bind(position.created_at)
        .bind(position.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Gets a form header by id.
    pub async fn get_meta(&self, form_id: &str) -> DbResult<Option<FormMeta>> {
        Ok(self.fetch_meta_row(form_id).await?.map(|(meta, _)| meta))
    }

    /// Gets the stored offer terms of a form.
    pub async fn get_terms(&self, form_id: &str) -> DbResult<Option<OfferTerms>> {
        Ok(self.fetch_meta_row(form_id).await?.map(|(_, terms)| terms))
    }

    /// Gets all positions of a form, ordered by ordinal number.
    ///
    /// Positions without an ordinal come last.
    pub async fn get_positions(&self, form_id: &str) -> DbResult<Vec<FormPosition>> {
        let sql = format!(
            "SELECT {POSITION_COLUMNS} FROM form_positions \
             WHERE form_id = ?1 \
             ORDER BY ordinal IS NULL, ordinal, created_at"
        );

        let rows = sqlx::query(&sql)
            .bind(form_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(position_from_row).collect()
    }

    /// Loads a complete form for editing.
    ///
    /// ## Errors
    /// [`DbError::NotFound`] if no form has this id.
    pub async fn load_form(&self, form_id: &str) -> DbResult<OfferForm> {
        let (meta, terms) = self
            .fetch_meta_row(form_id)
            .await?
            .ok_or_else(|| DbError::not_found("Form", form_id))?;

        let positions = self.get_positions(form_id).await?;

        debug!(
            form_id = %form_id,
            positions = positions.len(),
            status = meta.status.as_str(),
            "Form loaded"
        );

        Ok(OfferForm::new(meta, positions, terms))
    }

    /// Counts all forms.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM form_meta")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn fetch_meta_row(&self, form_id: &str) -> DbResult<Option<(FormMeta, OfferTerms)>> {
        let sql = format!("SELECT {META_COLUMNS} FROM form_meta WHERE id = ?1");

        let row = sqlx::query(&sql)
            .bind(form_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(meta_from_row).transpose()
    }

    // =========================================================================
    // Draft Updates
    // =========================================================================

    /// Saves price and comment of each given position.
    ///
    /// Runs in one transaction and is refused once the form was submitted.
    pub async fn update_positions(&self, form_id: &str, updates: &[PositionUpdate]) -> DbResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        ensure_draft(&mut tx, form_id).await?;
        for update in updates {
            write_position(&mut tx, form_id, update, now).await?;
        }

        tx.commit().await?;

        debug!(form_id = %form_id, count = updates.len(), "Positions saved");
        Ok(())
    }

    /// Saves the comment for the whole offer.
    pub async fn update_general_comment(&self, form_id: &str, comment: Option<&str>) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE form_meta SET general_comment = ?2, updated_at = ?3
            WHERE id = ?1 AND status = 'entwurf'
            "#,
        )
        .bind(form_id)
        .bind(comment)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.explain_missing_draft(form_id).await);
        }
        Ok(())
    }

    /// Saves the offer terms.
    pub async fn update_terms(&self, form_id: &str, terms: &OfferTerms) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        ensure_draft(&mut tx, form_id).await?;
        write_terms(&mut tx, form_id, terms, Utc::now()).await?;

        tx.commit().await?;

        debug!(
            form_id = %form_id,
            discount_kind = ?terms.discount_kind,
            discount_value = %terms.discount_value,
            vat = %terms.vat_rate_percent,
            "Terms saved"
        );
        Ok(())
    }

    /// Sets the status unconditionally.
    ///
    /// Meant for administration (reopening a form); suppliers go through
    /// [`FormRepository::submit`].
    pub async fn update_status(&self, form_id: &str, status: FormStatus) -> DbResult<()> {
        let result = sqlx::query("UPDATE form_meta SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(form_id)
            .bind(status.as_str())
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Form", form_id));
        }

        info!(form_id = %form_id, status = status.as_str(), "Form status changed");
        Ok(())
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Hands in the offer and queues the document request.
    ///
    /// Positions, general comment, terms, the status change and the outbox
    /// row are written in one transaction.
    ///
    /// ## Errors
    /// - [`DbError::AlreadySubmitted`] if the form is no longer a draft
    /// - [`DbError::NotFound`] for an unknown form or position
    pub async fn submit(
        &self,
        submission: &Submission,
        webhook_url: &str,
    ) -> DbResult<DocumentOutboxEntry> {
        let form_id = submission.form_id.as_str();
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Guarded status flip; a concurrent submit loses here.
        let result = sqlx::query(
            r#"
            UPDATE form_meta SET status = 'abgegeben', general_comment = ?2, updated_at = ?3
            WHERE id = ?1 AND status = 'entwurf'
            "#,
        )
        .bind(form_id)
        .bind(&submission.general_comment)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let err = match draft_status(&mut tx, form_id).await? {
                Some(_) => DbError::AlreadySubmitted(form_id.to_string()),
                None => DbError::not_found("Form", form_id),
            };
            warn!(form_id = %form_id, error = %err, "Submission rejected");
            return Err(err);
        }

        write_terms(&mut tx, form_id, &submission.terms, now).await?;
        for update in &submission.positions {
            write_position(&mut tx, form_id, update, now).await?;
        }

        let entry = DocumentOutboxEntry {
            id: Uuid::new_v4().to_string(),
            form_id: form_id.to_string(),
            webhook_url: webhook_url.to_string(),
            payload: submission.document_request.to_json()?,
            attempts: 0,
            last_error: None,
            created_at: now,
            attempted_at: None,
            delivered_at: None,
        };
        DocumentOutboxRepository::insert_entry(&mut tx, &entry).await?;

        tx.commit().await?;

        info!(
            form_id = %form_id,
            positions = submission.positions.len(),
            final_gross_total = %submission.pricing.final_gross_total,
            "Offer submitted"
        );

        Ok(entry)
    }

    async fn explain_missing_draft(&self, form_id: &str) -> DbError {
        let status = sqlx::query_scalar::<_, String>("SELECT status FROM form_meta WHERE id = ?1")
            .bind(form_id)
            .fetch_optional(&self.pool)
            .await;

        match status {
            Ok(Some(_)) => DbError::AlreadySubmitted(form_id.to_string()),
            Ok(None) => DbError::not_found("Form", form_id),
            Err(e) => e.into(),
        }
    }
}

// =============================================================================
// Connection-level Helpers
// =============================================================================

/// Returns the stored status of a form, `None` if it doesn't exist.
async fn draft_status(conn: &mut SqliteConnection, form_id: &str) -> DbResult<Option<FormStatus>> {
    let label: Option<Option<String>> =
        sqlx::query_scalar("SELECT status FROM form_meta WHERE id = ?1")
            .bind(form_id)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(label.map(|l| FormStatus::from_label(l.as_deref())))
}

async fn ensure_draft(conn: &mut SqliteConnection, form_id: &str) -> DbResult<()> {
    match draft_status(conn, form_id).await? {
        Some(FormStatus::Draft) => Ok(()),
        Some(FormStatus::Submitted) => Err(DbError::AlreadySubmitted(form_id.to_string())),
        None => Err(DbError::not_found("Form", form_id)),
    }
}

async fn write_position(
    conn: &mut SqliteConnection,
    form_id: &str,
    update: &PositionUpdate,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE form_positions SET unit_price_net = ?3, comment = ?4, updated_at = ?5
        WHERE id = ?1 AND form_id = ?2
        "#,
    )
    .bind(&update.id)
    .bind(form_id)
    .bind(update.unit_price_net.map(|p| p.to_string()))
    .bind(&update.comment)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Position", update.id.as_str()));
    }
    Ok(())
}

async fn write_terms(
    conn: &mut SqliteConnection,
    form_id: &str,
    terms: &OfferTerms,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE form_meta SET
            discount_kind = ?2,
            discount_value = ?3,
            vat_rate_percent = ?4,
            cash_discount_rate_percent = ?5,
            cash_discount_days = ?6,
            updated_at = ?7
        WHERE id = ?1
        "#,
    )
    .bind(form_id)
    .bind(terms.discount_kind)
    .bind(terms.discount_value.to_string())
    .bind(terms.vat_rate_percent.to_string())
    .bind(terms.cash_discount_rate_percent.to_string())
    .bind(i64::from(terms.cash_discount_days))
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Row Mapping
// =============================================================================

fn decimal_column(row: &SqliteRow, column: &str) -> DbResult<Decimal> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(raw.trim()).map_err(|e| DbError::decode(column, e))
}

fn optional_decimal_column(row: &SqliteRow, column: &str) -> DbResult<Option<Decimal>> {
    let raw: Option<String> = row.try_get(column)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => Decimal::from_str(text)
            .map(Some)
            .map_err(|e| DbError::decode(column, e)),
    }
}

fn meta_from_row(row: &SqliteRow) -> DbResult<(FormMeta, OfferTerms)> {
    let status: Option<String> = row.try_get("status")?;
    let days: i64 = row.try_get("cash_discount_days")?;
    let discount_kind: DiscountKind = row.try_get("discount_kind")?;

    let meta = FormMeta {
        id: row.try_get("id")?,
        supplier_name: row.try_get("supplier_name")?,
        status: FormStatus::from_label(status.as_deref()),
        calculation_id: row.try_get("calculation_id")?,
        general_comment: row.try_get("general_comment")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    };

    let terms = OfferTerms {
        discount_kind,
        discount_value: decimal_column(row, "discount_value")?,
        vat_rate_percent: decimal_column(row, "vat_rate_percent")?,
        cash_discount_rate_percent: decimal_column(row, "cash_discount_rate_percent")?,
        cash_discount_days: u32::try_from(days)
            .map_err(|e| DbError::decode("cash_discount_days", e))?,
    };

    Ok((meta, terms))
}

fn position_from_row(row: &SqliteRow) -> DbResult<FormPosition> {
    Ok(FormPosition {
        id: row.try_get("id")?,
        form_id: row.try_get("form_id")?,
        ordinal: row.try_get("ordinal")?,
        description: row.try_get("description")?,
        quantity: optional_decimal_column(row, "quantity")?,
        unit: row.try_get("unit")?,
        unit_price_net: optional_decimal_column(row, "unit_price_net")?,
        item_number: row.try_get("item_number")?,
        long_text: row.try_get("long_text")?,
        comment: row.try_get("comment")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn d(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn meta(id: &str) -> FormMeta {
        FormMeta {
            id: id.to_string(),
            supplier_name: "Trockenbau Schmidt GmbH".to_string(),
            status: FormStatus::Draft,
            calculation_id: Some("calc-7".to_string()),
            general_comment: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn position(form_id: &str, id: &str, ordinal: &str, qty: &str) -> FormPosition {
        FormPosition {
            id: id.to_string(),
            form_id: form_id.to_string(),
            ordinal: Some(ordinal.to_string()),
            description: format!("Position {ordinal}"),
            quantity: Some(d(qty)),
            unit: Some("m²".to_string()),
            unit_price_net: None,
            item_number: None,
            long_text: None,
            comment: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn seeded() -> (Database, FormRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.forms();

        repo.insert_meta(&meta("form-1"), &OfferTerms::default())
            .await
            .unwrap();
        // Inserted out of order on purpose
        repo.insert_position(&position("form-1", "p2", "01.0020", "2"))
            .await
            .unwrap();
        repo.insert_position(&position("form-1", "p1", "01.0010", "10"))
            .await
            .unwrap();

        (db, repo)
    }

    #[tokio::test]
    async fn test_load_form_orders_positions() {
        let (_db, repo) = seeded().await;

        let form = repo.load_form("form-1").await.unwrap();
        assert_eq!(form.meta.supplier_name, "Trockenbau Schmidt GmbH");
        assert_eq!(form.meta.status, FormStatus::Draft);
        assert_eq!(form.terms, OfferTerms::default());

        let ids: Vec<&str> = form.positions.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
        assert_eq!(form.positions[0].quantity, Some(d("10")));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_load_unknown_form() {
        let (_db, repo) = seeded().await;
        assert!(matches!(
            repo.load_form("nope").await,
            Err(DbError::NotFound { .. })
        ));
        assert!(repo.get_meta("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_position_needs_existing_form() {
        let (_db, repo) = seeded().await;
        let err = repo
            .insert_position(&position("missing", "px", "01", "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_positions_keeps_decimal_scale() {
        let (_db, repo) = seeded().await;

        repo.update_positions(
            "form-1",
            &[PositionUpdate {
                id: "p1".to_string(),
                unit_price_net: Some(d("1234.50")),
                comment: Some("inkl. Spachtelung".to_string()),
            }],
        )
        .await
        .unwrap();

        let positions = repo.get_positions("form-1").await.unwrap();
        assert_eq!(positions[0].unit_price_net, Some(d("1234.50")));
        assert_eq!(positions[0].comment.as_deref(), Some("inkl. Spachtelung"));
        assert_eq!(positions[1].unit_price_net, None);
    }

    #[tokio::test]
    async fn test_update_unknown_position_rolls_back() {
        let (_db, repo) = seeded().await;

        let result = repo
            .update_positions(
                "form-1",
                &[
                    PositionUpdate {
                        id: "p1".to_string(),
                        unit_price_net: Some(d("5")),
                        comment: None,
                    },
                    PositionUpdate {
                        id: "ghost".to_string(),
                        unit_price_net: Some(d("5")),
                        comment: None,
                    },
                ],
            )
            .await;

        assert!(matches!(result, Err(DbError::NotFound { .. })));
        let positions = repo.get_positions("form-1").await.unwrap();
        assert_eq!(positions[0].unit_price_net, None);
    }

    #[tokio::test]
    async fn test_update_terms_round_trip() {
        let (_db, repo) = seeded().await;
        let terms = OfferTerms {
            discount_kind: DiscountKind::Fixed,
            discount_value: d("50.00"),
            vat_rate_percent: d("7"),
            cash_discount_rate_percent: d("2.5"),
            cash_discount_days: 14,
        };

        repo.update_terms("form-1", &terms).await.unwrap();
        assert_eq!(repo.get_terms("form-1").await.unwrap(), Some(terms));
    }

    #[tokio::test]
    async fn test_general_comment() {
        let (_db, repo) = seeded().await;

        repo.update_general_comment("form-1", Some("Preise netto ab Werk"))
            .await
            .unwrap();
        let meta = repo.get_meta("form-1").await.unwrap().unwrap();
        assert_eq!(meta.general_comment.as_deref(), Some("Preise netto ab Werk"));

        assert!(matches!(
            repo.update_general_comment("nope", None).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_decimal_is_reported() {
        let (db, repo) = seeded().await;

        sqlx::query("UPDATE form_positions SET unit_price_net = 'zwölf' WHERE id = 'p1'")
            .execute(db.pool())
            .await
            .unwrap();

        let err = repo.get_positions("form-1").await.unwrap_err();
        assert!(matches!(err, DbError::Decode { ref column, .. } if column == "unit_price_net"));
    }

    #[tokio::test]
    async fn test_submit_writes_everything_once() {
        let (db, repo) = seeded().await;

        let mut form = repo.load_form("form-1").await.unwrap();
        form.set_unit_price("p1", "12,50").unwrap();
        form.set_unit_price("p2", "100").unwrap();
        form.set_general_comment(Some("Lieferzeit 2 Wochen")).unwrap();
        let submission = form.prepare_submission(false).unwrap();

        let entry = repo
            .submit(&submission, "https://hooks.example.test/offer")
            .await
            .unwrap();
        assert_eq!(entry.form_id, "form-1");
        assert_eq!(entry.payload, r#"{"uuid":"form-1"}"#);

        let stored = repo.load_form("form-1").await.unwrap();
        assert!(stored.is_submitted());
        assert_eq!(stored.net_total(), d("325"));
        assert_eq!(
            stored.meta.general_comment.as_deref(),
            Some("Lieferzeit 2 Wochen")
        );
        assert_eq!(db.document_outbox().count_pending().await.unwrap(), 1);

        // Second submission of the same draft snapshot
        let again = repo.submit(&submission, "https://hooks.example.test/offer").await;
        assert!(matches!(again, Err(DbError::AlreadySubmitted(_))));
        assert_eq!(db.document_outbox().count_pending().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_submitted_form_refuses_draft_writes() {
        let (_db, repo) = seeded().await;
        repo.update_status("form-1", FormStatus::Submitted)
            .await
            .unwrap();

        assert!(matches!(
            repo.update_terms("form-1", &OfferTerms::default()).await,
            Err(DbError::AlreadySubmitted(_))
        ));
        assert!(matches!(
            repo.update_general_comment("form-1", Some("x")).await,
            Err(DbError::AlreadySubmitted(_))
        ));
        assert!(matches!(
            repo.update_positions("form-1", &[]).await,
            Err(DbError::AlreadySubmitted(_))
        ));
    }
}
