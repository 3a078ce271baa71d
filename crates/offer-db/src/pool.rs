//! # Database Pool
//!
//! Opens the SQLite store that holds forms and the document outbox.
//!
//! ```text
//! DbConfig::new(path)          DbConfig::in_memory()
//!        │                              │
//!        ▼                              ▼
//!  create parent directory      shared-cache memory DB
//!  WAL, synchronous NORMAL      single connection, never recycled
//!        │                              │
//!        └──────────────┬───────────────┘
//!                       ▼
//!        Database::new ── migrations ── forms() / document_outbox()
//! ```
//!
//! WAL keeps `offer show` readable while another process submits.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::form::FormRepository;
use crate::repository::outbox::DocumentOutboxRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Where the offer database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    /// A database file. Missing parent directories are created on connect.
    File(PathBuf),
    /// A private in-memory database, gone once the pool closes.
    InMemory,
}

/// Settings for [`Database::new`].
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/offer/offer.db").max_connections(5);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub location: DbLocation,

    /// Default: 5. Always 1 for in-memory databases.
    pub max_connections: u32,

    /// How long a command waits for a free connection. Default: 30 seconds.
    pub acquire_timeout: Duration,

    /// Apply pending migrations on connect. Default: true.
    pub run_migrations: bool,
}

impl DbConfig {
    /// File-backed database at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: DbLocation::File(path.into()),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            run_migrations: true,
        }
    }

    /// In-memory database, used by tests.
    pub fn in_memory() -> Self {
        DbConfig {
            location: DbLocation::InMemory,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.location {
            DbLocation::File(path) => {
                ensure_parent_dir(path)?;
                SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .synchronous(SqliteSynchronous::Normal)
            }
            DbLocation::InMemory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
        };

        Ok(options.foreign_keys(true))
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let pool = SqlitePoolOptions::new().acquire_timeout(self.acquire_timeout);

        match self.location {
            DbLocation::File(_) => pool
                .max_connections(self.max_connections.max(1))
                .min_connections(1)
                .idle_timeout(Some(Duration::from_secs(600))),
            // Dropping the only connection would drop the data with it
            DbLocation::InMemory => pool
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
        }
    }
}

/// Creates the directory a database file goes into.
fn ensure_parent_dir(path: &Path) -> DbResult<()> {
    let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) else {
        return Ok(());
    };

    if !dir.exists() {
        debug!(dir = %dir.display(), "Creating database directory");
        std::fs::create_dir_all(dir).map_err(|e| {
            DbError::ConnectionFailed(format!("cannot create {}: {}", dir.display(), e))
        })?;
    }

    Ok(())
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the offer database. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects and, unless disabled, brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        match &config.location {
            DbLocation::File(path) => info!(path = %path.display(), "Opening offer database"),
            DbLocation::InMemory => debug!("Opening in-memory offer database"),
        }

        let pool = config
            .pool_options()
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Forms, positions and terms.
    ///
    /// ```rust,ignore
    /// let form = db.forms().load_form(&form_id).await?;
    /// ```
    pub fn forms(&self) -> FormRepository {
        FormRepository::new(self.pool.clone())
    }

    /// Document requests waiting for delivery.
    pub fn document_outbox(&self) -> DocumentOutboxRepository {
        DocumentOutboxRepository::new(self.pool.clone())
    }

    pub async fn close(&self) {
        debug!("Closing offer database");
        self.pool.close().await;
    }

    /// True if the database answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);

        let status = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(status.total, 1);
        assert_eq!(status.applied, 1);
        assert!(status.is_current());
    }

    #[tokio::test]
    async fn test_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh").join("install").join("offer.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert!(db.health_check().await);
        assert_eq!(db.forms().count().await.unwrap(), 0);
        db.close().await;

        assert!(path.exists());

        // Reopening finds the schema in place
        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        let status = migrations::migration_status(db.pool()).await.unwrap();
        assert!(status.is_current());
        db.close().await;
    }

    #[tokio::test]
    async fn test_without_migrations_schema_is_missing() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();
        assert!(migrations::migration_status(db.pool()).await.is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/offers.db")
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(1))
            .run_migrations(false);

        assert_eq!(
            config.location,
            DbLocation::File(PathBuf::from("/tmp/offers.db"))
        );
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout, Duration::from_secs(1));
        assert!(!config.run_migrations);

        assert_eq!(DbConfig::in_memory().location, DbLocation::InMemory);
    }
}
