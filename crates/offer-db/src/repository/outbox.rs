//! # Document Outbox Repository
//!
//! Queue of document-generation requests, one per submitted offer.
//!
//! ## The Outbox Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Outbox Pattern Implementation                        │
//! │                                                                         │
//! │  FormRepository::submit                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   SINGLE TRANSACTION                            │   │
//! │  │  1. UPDATE form_meta SET status = 'abgegeben' ...               │   │
//! │  │  2. INSERT INTO document_outbox (webhook_url, {"uuid": id})     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            DISPATCHER (outside this crate)                      │   │
//! │  │                                                                 │   │
//! │  │  1. get_pending(limit)                                         │   │
//! │  │  2. POST payload to webhook_url                                │   │
//! │  │     a. On success: mark_delivered(id)                          │   │
//! │  │     b. On failure: mark_failed(id, error)                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  A submitted offer never loses its document request, and a draft       │
//! │  never gets one.                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use offer_core::{DocumentOutboxEntry, DocumentRequest};

/// Repository for document outbox operations.
#[derive(Debug, Clone)]
pub struct DocumentOutboxRepository {
    pool: SqlitePool,
}

impl DocumentOutboxRepository {
    /// Creates a new DocumentOutboxRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DocumentOutboxRepository { pool }
    }

    /// Queues a document request outside of a submission, e.g. to
    /// regenerate the document of an already submitted form.
    ///
    /// ## Example
    /// ```rust,ignore
    /// repo.queue(&form_id, &config.webhook.url).await?;
    /// ```
    pub async fn queue(&self, form_id: &str, webhook_url: &str) -> DbResult<DocumentOutboxEntry> {
        let entry = DocumentOutboxEntry {
            id: Uuid::new_v4().to_string(),
            form_id: form_id.to_string(),
            webhook_url: webhook_url.to_string(),
            payload: DocumentRequest::new(form_id).to_json()?,
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            attempted_at: None,
            delivered_at: None,
        };

        let mut conn = self.pool.acquire().await?;
        Self::insert_entry(&mut conn, &entry).await?;

        Ok(entry)
    }

    /// Inserts an entry on an existing connection or transaction.
    pub(crate) async fn insert_entry(
        conn: &mut SqliteConnection,
        entry: &DocumentOutboxEntry,
    ) -> DbResult<()> {
        debug!(form_id = %entry.form_id, url = %entry.webhook_url, "Queuing document request");

        sqlx::query(
            r#"
            INSERT INTO document_outbox (
                id, form_id, webhook_url, payload,
                attempts, last_error, created_at, attempted_at, delivered_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.form_id)
        .bind(&entry.webhook_url)
        .bind(&entry.payload)
        .bind(entry.attempts)
        .bind(&entry.last_error)
        .bind(entry.created_at)
        .bind(entry.attempted_at)
        .bind(entry.delivered_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets entries not yet delivered, oldest first.
    pub async fn get_pending(&self, limit: u32) -> DbResult<Vec<DocumentOutboxEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, form_id, webhook_url, payload, attempts, last_error,
                   created_at, attempted_at, delivered_at
            FROM document_outbox
            WHERE delivered_at IS NULL
            ORDER BY created_at ASC
            LIMIT ?1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }

    /// Marks an entry as delivered to the webhook.
    pub async fn mark_delivered(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE document_outbox SET
                delivered_at = ?2,
                attempted_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Outbox entry", id));
        }
        Ok(())
    }

    /// Records a failed delivery attempt.
    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<()> {
        warn!(outbox_id = %id, error = %error, "Document request delivery failed");

        let result = sqlx::query(
            r#"
            UPDATE document_outbox SET
                attempts = attempts + 1,
                last_error = ?2,
                attempted_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Outbox entry", id));
        }
        Ok(())
    }

    /// Counts entries not yet delivered.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM document_outbox WHERE delivered_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

fn entry_from_row(row: &SqliteRow) -> DbResult<DocumentOutboxEntry> {
    Ok(DocumentOutboxEntry {
        id: row.try_get("id")?,
        form_id: row.try_get("form_id")?,
        webhook_url: row.try_get("webhook_url")?,
        payload: row.try_get("payload")?,
        attempts: row.try_get("attempts")?,
        last_error: row.try_get("last_error")?,
        created_at: row.try_get("created_at")?,
        attempted_at: row.try_get("attempted_at")?,
        delivered_at: row.try_get("delivered_at")?,
    })
}
