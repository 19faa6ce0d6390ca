//! # Configuration State
//!
//! Storefront configuration loaded at startup.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TEKHNIKA_DB_PATH=./data/tekhnika.db                                │
//! │     TEKHNIKA_CART_KEY=cart                                             │
//! │     TEKHNIKA_STORE_NAME=Техника                                        │
//! │     TEKHNIKA_ORDER_PREFIX=TK                                           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tekhnika/storefront.toml (Linux)                         │
//! │     ~/Library/Application Support/ru.tekhnika.storefront/... (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [store]
//! name = "Техника"
//! order_prefix = "TK"
//!
//! [database]
//! path = "/var/lib/tekhnika/tekhnika.db"
//!
//! [cart]
//! storage_key = "cart"
//!
//! [catalog]
//! per_page = 24
//! default_sort = "featured"
//! ```
//!
//! Configuration is read-only after startup, so no lock is needed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tekhnika_core::catalog::{SortOrder, DEFAULT_PER_PAGE, MAX_PER_PAGE};
use thiserror::Error;
use tracing::{debug, info};

/// Configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine the application data directory")]
    NoDataDir,
}

// =============================================================================
// Sections
// =============================================================================

/// Store identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Display name.
    #[serde(default = "default_store_name")]
    pub name: String,

    /// Prefix of human-readable order numbers (`TK-20241129-0001`).
    #[serde(default = "default_order_prefix")]
    pub order_prefix: String,
}

fn default_store_name() -> String {
    "Техника".to_string()
}

fn default_order_prefix() -> String {
    "TK".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: default_store_name(),
            order_prefix: default_order_prefix(),
        }
    }
}

/// Database location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path, or `:memory:`. Falls back to the platform data dir.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Cart persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSettings {
    /// Key of the cart snapshot in the key-value store.
    #[serde(default = "default_cart_key")]
    pub storage_key: String,
}

fn default_cart_key() -> String {
    "cart".to_string()
}

impl Default for CartSettings {
    fn default() -> Self {
        CartSettings {
            storage_key: default_cart_key(),
        }
    }
}

/// Catalog listing defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    #[serde(default)]
    pub default_sort: SortOrder,
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

impl Default for CatalogSettings {
    fn default() -> Self {
        CatalogSettings {
            per_page: default_per_page(),
            default_sort: SortOrder::default(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete storefront configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigState {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub cart: CartSettings,

    #[serde(default)]
    pub catalog: CatalogSettings,
}

impl ConfigState {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`storefront.toml`)
    /// 3. Environment variables
    ///
    /// An explicit `config_path` that does not exist is an error; a missing
    /// default file is not.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let explicit = config_path.is_some();
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() || explicit {
                info!(?path, "Loading storefront config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.order_prefix.is_empty()
            || !self
                .store
                .order_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ConfigError::Invalid(format!(
                "store.order_prefix must be non-empty ASCII letters or digits, got '{}'",
                self.store.order_prefix
            )));
        }

        if self.cart.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "cart.storage_key must not be empty".into(),
            ));
        }

        if self.catalog.per_page == 0 || self.catalog.per_page > MAX_PER_PAGE {
            return Err(ConfigError::Invalid(format!(
                "catalog.per_page must be between 1 and {}",
                MAX_PER_PAGE
            )));
        }

        Ok(())
    }

    /// Applies environment overrides read through `lookup`.
    fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("TEKHNIKA_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(key) = lookup("TEKHNIKA_CART_KEY") {
            self.cart.storage_key = key;
        }

        if let Some(name) = lookup("TEKHNIKA_STORE_NAME") {
            self.store.name = name;
        }

        if let Some(prefix) = lookup("TEKHNIKA_ORDER_PREFIX") {
            debug!(prefix = %prefix, "Overriding order prefix from environment");
            self.store.order_prefix = prefix;
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("ru", "tekhnika", "storefront")
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("storefront.toml"))
    }

    /// Resolves the database file, creating the data directory if needed.
    ///
    /// ## Platform-Specific Paths
    /// - **Linux**: `~/.local/share/storefront/tekhnika.db`
    /// - **macOS**: `~/Library/Application Support/ru.tekhnika.storefront/tekhnika.db`
    /// - **Windows**: `%APPDATA%\tekhnika\storefront\data\tekhnika.db`
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = Self::project_dirs().ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join("tekhnika.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConfigState::default();
        assert_eq!(config.store.order_prefix, "TK");
        assert_eq!(config.cart.storage_key, "cart");
        assert_eq!(config.catalog.per_page, 24);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ConfigState::from_toml(
            r#"
            [store]
            name = "Техника на Ленина"

            [catalog]
            default_sort = "price_asc"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.name, "Техника на Ленина");
        assert_eq!(config.store.order_prefix, "TK");
        assert_eq!(config.catalog.default_sort, SortOrder::PriceAsc);
        assert_eq!(config.catalog.per_page, 24);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ConfigState::default();
        config.apply_env_overrides(|key| match key {
            "TEKHNIKA_DB_PATH" => Some(":memory:".to_string()),
            "TEKHNIKA_ORDER_PREFIX" => Some("SPB".to_string()),
            _ => None,
        });

        assert_eq!(config.database.path, Some(PathBuf::from(":memory:")));
        assert_eq!(config.store.order_prefix, "SPB");
        assert_eq!(config.cart.storage_key, "cart");
    }

    #[test]
    fn test_validation() {
        let mut config = ConfigState::default();

        config.store.order_prefix = "T-K".to_string();
        assert!(config.validate().is_err());

        config.store.order_prefix = "TK".to_string();
        config.catalog.per_page = 0;
        assert!(config.validate().is_err());

        config.catalog.per_page = 50;
        config.cart.storage_key = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_database_path_wins() {
        let mut config = ConfigState::default();
        config.database.path = Some(PathBuf::from("/tmp/shop.db"));
        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/tmp/shop.db")
        );
    }

    #[test]
    fn test_unknown_sort_rejected() {
        assert!(ConfigState::from_toml("[catalog]\ndefault_sort = \"random\"").is_err());
    }
}
