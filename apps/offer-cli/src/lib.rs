//! # offer-cli: Command Line Front End
//!
//! Library part of the `offer` binary: configuration, error type and the
//! service that runs each command against offer-core and offer-db.
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Load `AppConfig` (TOML file, then `OFFER_*` environment)
//! 3. Connect to database & run migrations
//! 4. Run the requested command through [`OfferService`]

pub mod config;
pub mod error;
pub mod service;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use service::{FormOverview, NewPosition, OfferService, SubmitReceipt, TermsChange};

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` for verbose output
/// - `RUST_LOG=offer=trace` for this workspace only
/// - Default: `info,offer=debug,sqlx=warn`
///
/// Logs go to stderr; stdout carries the command output.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,offer=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
