//! # Commands Module
//!
//! Every operation the storefront exposes. The CLI in `main.rs` and any
//! future front end call these functions; each one takes only the state it
//! needs and returns `Result<T, ApiError>` where `T` serializes to JSON.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── catalog.rs   ◄─── Product listing, detail, categories
//! ├── cart.rs      ◄─── Cart manipulation
//! ├── checkout.rs  ◄─── Cart → order
//! ├── orders.rs    ◄─── Order history and status
//! └── admin.rs     ◄─── Stock, discounts, unlisting, import
//! ```
//!
//! ## State Injection
//! ```rust,ignore
//! // Only needs database
//! catalog::list_categories(&db).await?;
//!
//! // Only needs cart
//! cart::clear_cart(&cart, now).await?;
//!
//! // Needs both
//! cart::add_to_cart(&db, &cart, "fridge-lg", 1, now).await?;
//! ```
//!
//! Commands that depend on time take `now` explicitly.

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;

#[cfg(test)]
pub(crate) mod test_support;
