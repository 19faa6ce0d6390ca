//! # Tekhnika Storefront Library
//!
//! Application layer of the storefront: state, commands and their error type.
//! The `tekhnika` binary in `main.rs` is a thin CLI over this crate.
//!
//! ## Module Organization
//! ```text
//! tekhnika_storefront/
//! ├── lib.rs          ◄─── You are here (startup & tracing)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   ├── cart.rs     ◄─── Cart state and snapshot storage
//! │   └── config.rs   ◄─── Configuration (TOML + env)
//! ├── commands/
//! │   ├── catalog.rs  ◄─── Listing, product detail, categories
//! │   ├── cart.rs     ◄─── Cart manipulation
//! │   ├── checkout.rs ◄─── Cart → order
//! │   ├── orders.rs   ◄─── Order history and status
//! │   └── admin.rs    ◄─── Stock, discounts, import
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## State Management
//! There is no single `AppState`: each command asks for the state it needs.
//!
//! ```text
//!  ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────────┐
//!  │    DbState       │ │    CartState     │ │    ConfigState       │
//!  │                  │ │                  │ │                      │
//!  │  • Database pool │ │  • Current cart  │ │  • Store name/prefix │
//!  │  • Repositories  │ │  • Snapshot store│ │  • Catalog paging    │
//!  └──────────────────┘ └──────────────────┘ └──────────────────────┘
//! ```
//!
//! [`Storefront`] bundles the three for front ends that need all of them.

pub mod commands;
pub mod error;
pub mod state;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use error::ApiError;
use state::{CartState, ConfigState, DbState, KvCartStorage};
use tekhnika_db::DbConfig;

/// Everything a front end needs to run commands.
#[derive(Debug, Clone)]
pub struct Storefront {
    pub db: DbState,
    pub cart: CartState,
    pub config: ConfigState,
}

impl Storefront {
    /// Opens the storefront described by `config`.
    ///
    /// ## Startup Sequence
    /// ```text
    /// 1. Resolve database path (config, TEKHNIKA_DB_PATH or data dir)
    /// 2. Connect to SQLite and run pending migrations
    /// 3. Restore the cart snapshot from the key-value table
    /// ```
    pub async fn open(config: ConfigState) -> Result<Self, ApiError> {
        let db_path = config.database_path()?;
        info!(?db_path, "Database path determined");

        let db = DbState::open(DbConfig::new(db_path)).await?;
        info!("Database connected and migrations applied");

        let storage = KvCartStorage::new(db.inner().clone(), config.cart.storage_key.clone());
        let cart = CartState::load(Arc::new(storage)).await?;

        Ok(Storefront { db, cart, config })
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr; stdout carries command output.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tekhnika=trace` - Show trace for tekhnika crates only
/// - Default: INFO, DEBUG for tekhnika crates
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tekhnika=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DatabaseSettings;
    use chrono::Utc;

    #[tokio::test]
    async fn test_open_in_memory() {
        let config = ConfigState {
            database: DatabaseSettings {
                path: Some(":memory:".into()),
            },
            ..ConfigState::default()
        };

        let storefront = Storefront::open(config).await.unwrap();
        assert!(storefront.cart.with_cart(|c| c.is_empty()));

        let view = commands::cart::get_cart(&storefront.db, &storefront.cart, Utc::now())
            .await
            .unwrap();
        assert!(view.lines.is_empty());
    }
}
