//! # Application Configuration
//!
//! Settings for the `offer` command line tool.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     OFFER_DB_PATH=/srv/offer/offer.db                                  │
//! │     OFFER_WEBHOOK_URL=https://automation.example/webhook/offer-doc     │
//! │     OFFER_VAT_RATE=19                                                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, or offer.toml in the platform config directory    │
//! │     ~/.config/offer-form/offer.toml (Linux)                            │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/srv/offer/offer.db"
//! max_connections = 5
//!
//! [webhook]
//! url = "https://automation.example/webhook/offer-document"
//!
//! [defaults]
//! vat_rate_percent = 19
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use offer_core::validation::validate_percent;
use offer_core::{parse_number_input, ParsedNumber, DEFAULT_VAT_RATE_PERCENT};

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite database file.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("de", "offer", "offer-form")
        .map(|dirs| dirs.data_dir().join("offer.db"))
        .unwrap_or_else(|| PathBuf::from("offer.db"))
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// `[webhook]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookSettings {
    /// Document-generation endpoint stored with each queued request.
    /// Submitting is refused while this is unset.
    #[serde(default)]
    pub url: Option<String>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultSettings {
    /// VAT rate for newly created forms.
    #[serde(default = "default_vat_rate")]
    pub vat_rate_percent: Decimal,
}

fn default_vat_rate() -> Decimal {
    Decimal::from(DEFAULT_VAT_RATE_PERCENT)
}

impl Default for DefaultSettings {
    fn default() -> Self {
        DefaultSettings {
            vat_rate_percent: default_vat_rate(),
        }
    }
}

// =============================================================================
// App Config
// =============================================================================

/// Complete configuration of the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub webhook: WebhookSettings,

    #[serde(default)]
    pub defaults: DefaultSettings,
}

impl AppConfig {
    /// Loads configuration from file, then environment, then validates.
    ///
    /// An explicitly given path must exist; a missing default file just
    /// means defaults.
    pub fn load(config_path: Option<PathBuf>) -> AppResult<Self> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// Like [`AppConfig::load`], with a custom environment lookup.
    pub fn load_with(
        config_path: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> AppResult<Self> {
        let mut config = Self::default();

        match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::config(format!(
                        "config file {} does not exist",
                        path.display()
                    )));
                }
                config = Self::read_file(&path)?;
            }
            None => {
                if let Some(path) = Self::default_config_path() {
                    if path.exists() {
                        config = Self::read_file(&path)?;
                    } else {
                        debug!(?path, "Config file not found, using defaults");
                    }
                }
            }
        }

        config.apply_overrides(env);
        config.validate()?;

        Ok(config)
    }

    fn read_file(path: &Path) -> AppResult<Self> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path).map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Applies `OFFER_*` overrides.
    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(path) = env("OFFER_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(url) = env("OFFER_WEBHOOK_URL") {
            debug!(url = %url, "Overriding webhook URL from environment");
            self.webhook.url = Some(url);
        }

        if let Some(rate) = env("OFFER_VAT_RATE") {
            match parse_number_input(&rate) {
                ParsedNumber::Value(value) => self.defaults.vat_rate_percent = value,
                _ => warn!(value = %rate, "Ignoring unreadable OFFER_VAT_RATE"),
            }
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> AppResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(AppError::config("database.path must not be empty"));
        }

        if self.database.max_connections == 0 {
            return Err(AppError::config(
                "database.max_connections must be greater than 0",
            ));
        }

        if let Some(ref url) = self.webhook.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AppError::config(format!(
                    "webhook.url must start with http:// or https://, got: {}",
                    url
                )));
            }
        }

        validate_percent("defaults.vat_rate_percent", self.defaults.vat_rate_percent)
            .map_err(|e| AppError::config(e.to_string()))?;

        Ok(())
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("de", "offer", "offer-form")
            .map(|dirs| dirs.config_dir().join("offer.toml"))
    }

    /// Returns the webhook URL if configured.
    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook.url.as_deref()
    }
}
