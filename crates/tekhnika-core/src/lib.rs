//! # tekhnika-core: Pricing and Availability Engine
//!
//! Pure business logic for the Tekhnika home-appliance storefront. Every
//! display surface (catalog listing, product card, product page, cart) asks
//! this crate two questions about a product: what does it cost right now, and
//! can it be bought.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Tekhnika Storefront Architecture                    │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Storefront app (state + commands + CLI)            │   │
//! │  │    catalog ──► product ──► cart ──► checkout ──► admin          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ tekhnika-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │ pricing │ │  stock  │ │  cart   │ │ catalog │ │  order  │  │   │
//! │  │   │ final   │ │ status  │ │ guards  │ │ filter  │ │ snapshot│  │   │
//! │  │   │ price   │ │         │ │ totals  │ │ sort    │ │         │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK READS • PURE FUNCTIONS        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 tekhnika-db (Database Layer)                    │   │
//! │  │          catalog cache, orders, key-value cart storage          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Discount, Category)
//! - [`money`] - Money type with integer arithmetic (kopecks, no floats)
//! - [`pricing`] - Effective price under a time-bounded discount
//! - [`stock`] - Stock status classification
//! - [`cart`] - Cart state container with stock guards
//! - [`catalog`] - Listing filters, sorting and paging
//! - [`order`] - Checkout order snapshots
//! - [`document`] - JSON documents served by the storefront API
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use tekhnika_core::money::Money;
//! use tekhnika_core::pricing::calculate_final_price;
//! use tekhnika_core::types::{Discount, Product};
//!
//! let mut product = Product::new("fridge-1", "Холодильник Atlant", Money::from_rubles(1000));
//! product.discount = Some(Discount::percentage(20, None, None));
//!
//! assert_eq!(calculate_final_price(&product, Utc::now()), Money::from_rubles(800));
//! ```

pub mod cart;
pub mod catalog;
pub mod document;
pub mod error;
pub mod money;
pub mod order;
pub mod pricing;
pub mod stock;
pub mod types;
pub mod validation;

// Re-exports so callers can write `tekhnika_core::Money`.
pub use cart::{Cart, CartAdjustment, CartLine, CartTotals};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order::{CustomerInfo, Order, OrderLine, OrderStatus};
pub use pricing::calculate_final_price;
pub use stock::{classify_stock, StockStatus};
pub use types::*;

/// Low-stock threshold used when a product carries no `min_stock_level`.
pub const DEFAULT_MIN_STOCK_LEVEL: i64 = 5;

/// Maximum number of distinct lines in a single cart.
pub const MAX_CART_LINES: usize = 50;

/// Maximum quantity of a single product in the cart, regardless of stock.
///
/// Appliances are not bought by the pallet; anything above this is a typo.
pub const MAX_ITEM_QUANTITY: i64 = 99;

/// Highest accepted product price: 100 000 000 ₽ in kopecks.
///
/// A full cart at this price (`MAX_CART_LINES × MAX_ITEM_QUANTITY` units)
/// still fits in an `i64`.
pub const MAX_PRICE_KOPECKS: i64 = 10_000_000_000;
