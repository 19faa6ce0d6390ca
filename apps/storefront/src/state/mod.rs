//! # State Module
//!
//! Application state shared by storefront commands.
//!
//! Instead of a single `AppState` struct containing everything, each concern
//! gets its own state type and every command asks only for what it uses.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────┐           │
//! │  │   DbState    │  │    CartState     │  │   ConfigState    │           │
//! │  │              │  │                  │  │                  │           │
//! │  │  Database    │  │  Arc<Mutex<Cart>>│  │  store           │           │
//! │  │  (SQLite     │  │  + CartStorage   │  │  database        │           │
//! │  │   pool)      │  │    (kv_store)    │  │  cart, catalog   │           │
//! │  └──────────────┘  └──────────────────┘  └──────────────────┘           │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has an internal connection pool                   │
//! │  • CartState: one mutation at a time behind the Mutex                  │
//! │  • ConfigState: read-only after startup                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod config;
mod db;

pub use cart::{CartState, CartStorage, KvCartStorage, MemoryCartStorage};
pub use config::{
    CartSettings, CatalogSettings, ConfigError, ConfigState, DatabaseSettings, StoreSettings,
};
pub use db::DbState;
