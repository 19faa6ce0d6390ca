//! # tekhnika-db: Database Layer for the Tekhnika Storefront
//!
//! Local SQLite storage for the storefront: a catalog cache filled from the
//! storefront API, placed orders, and a small key-value store that keeps the
//! customer's cart between sessions. Uses sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Tekhnika Storefront Data Flow                       │
//! │                                                                         │
//! │  Storefront command (catalog, cart add, checkout)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  tekhnika-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ CategoryRepo   │    │ 001_initial_ │  │   │
//! │  │   │               │    │ OrderRepo      │    │  schema.sql  │  │   │
//! │  │   │               │    │ KvRepo (cart)  │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/tekhnika/tekhnika.db (platform data dir)       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, category, order, kv)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tekhnika_db::{Database, DbConfig};
//!
//! // Create database (runs migrations by default)
//! let db = Database::new(DbConfig::new("path/to/tekhnika.db")).await?;
//!
//! // Use repositories
//! let products = db.products().list_active().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::kv::KvRepository;
pub use repository::order::{OrderRepository, OrderSummary};
pub use repository::product::{ImportReport, ProductRepository};
