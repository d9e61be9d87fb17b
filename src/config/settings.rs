//! Application settings loaded from `budgetly.toml`.
//!
//! Every key is optional; a missing file yields the defaults below.
//!
//! ```toml
//! [database]
//! url = "sqlite://data/budgetly.sqlite?mode=rwc"
//!
//! [pagination]
//! transactions = 5
//! wallets = 2
//! categories = 5
//! tags = 5
//! users = 10
//! ```

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Default location of the settings file
pub const DEFAULT_SETTINGS_PATH: &str = "budgetly.toml";

/// Root of `budgetly.toml`
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Storage settings
    pub database: DatabaseSettings,
    /// Page sizes for paginated listings
    pub pagination: PaginationSettings,
}

/// `[database]` section
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseSettings {
    /// `SeaORM` connection URL
    pub url: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://data/budgetly.sqlite?mode=rwc".to_string(),
        }
    }
}

/// `[pagination]` section - items per page for each listing
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PaginationSettings {
    /// Transaction history
    pub transactions: u64,
    /// Wallet list
    pub wallets: u64,
    /// Category list
    pub categories: u64,
    /// Tag list
    pub tags: u64,
    /// User administration list
    pub users: u64,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            transactions: 5,
            wallets: 2,
            categories: 5,
            tags: 5,
            users: 10,
        }
    }
}

impl Settings {
    fn validate(self) -> Result<Self> {
        let p = &self.pagination;
        if [p.transactions, p.wallets, p.categories, p.tags, p.users].contains(&0) {
            return Err(Error::Config {
                message: "pagination sizes must be greater than zero".to_string(),
            });
        }
        if self.database.url.trim().is_empty() {
            return Err(Error::Config {
                message: "database.url must not be empty".to_string(),
            });
        }
        Ok(self)
    }
}

/// Parses settings from TOML text.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    toml::from_str::<Settings>(contents)
        .map_err(|e| Error::Config {
            message: format!("Failed to parse settings: {e}"),
        })?
        .validate()
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read or parsed, or if a
/// page size is zero.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    debug!("Loading settings from {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read settings file {}: {e}", path.display()),
    })?;
    parse_settings(&contents)
}

/// Loads `./budgetly.toml`, or the defaults when the file does not exist.
pub fn load_default_settings() -> Result<Settings> {
    let path = Path::new(DEFAULT_SETTINGS_PATH);
    if path.exists() {
        load_settings(path)
    } else {
        info!("{DEFAULT_SETTINGS_PATH} not found, using default settings");
        Ok(Settings::default())
    }
}
