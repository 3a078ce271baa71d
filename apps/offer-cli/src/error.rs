//! # Application Error Type
//!
//! Unified error type for CLI commands.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CoreError (locked form, bad price text) ──┐                           │
//! │  DbError (not found, already submitted)  ──┼──► AppError ──► main      │
//! │  Config problems (TOML, env, paths)      ──┘        │                  │
//! │                                                      ▼                  │
//! │                                   message on stderr + exit code        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use offer_core::CoreError;
use offer_db::DbError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the `offer` commands.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A file named on the command line could not be read.
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Business rule violated (locked form, missing prices, bad input).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failure or missing record.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl AppError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        AppError::Config(message.into())
    }

    /// Process exit code for this error.
    ///
    /// ```text
    /// 2  rejected input or business rule
    /// 3  form / position not found
    /// 4  configuration
    /// 1  everything else
    /// ```
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Core(CoreError::PositionNotFound(_)) => 3,
            AppError::Core(_) => 2,
            AppError::Db(DbError::NotFound { .. }) => 3,
            AppError::Db(DbError::AlreadySubmitted(_)) => 2,
            AppError::Db(err) => {
                tracing::error!(error = %err, "Database operation failed");
                1
            }
            AppError::Config(_) => 4,
            AppError::Io { .. } => 1,
        }
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<offer_core::ValidationError> for AppError {
    fn from(err: offer_core::ValidationError) -> Self {
        AppError::Core(CoreError::Validation(err))
    }
}

/// Result type for CLI operations.
pub type AppResult<T> = Result<T, AppError>;
