//! # Repository Module
//!
//! Database repository implementations for the storefront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Storefront command                                                    │
//! │       │                                                                 │
//! │       │  db.products().get_by_id("fridge-1")                           │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── list_active(&self)                                                │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── upsert(&self, product)                                            │
//! │  └── set_discount(&self, id, discount)                                 │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • Easy to test (mock the repository)                                  │
//! │  • SQL is isolated in one place                                        │
//! │  • Can swap database implementations                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog cache and admin edits
//! - [`CategoryRepository`](category::CategoryRepository) - Categories
//! - [`OrderRepository`](order::OrderRepository) - Placed orders and their lines
//! - [`KvRepository`](kv::KvRepository) - Key-value store (cart persistence)

pub mod category;
pub mod kv;
pub mod order;
pub mod product;
