//! # Stock Status
//!
//! Derives the availability badge shown on every product surface.
//!
//! ```text
//!   stock_quantity        status
//!   ──────────────        ──────────
//!   None / <= 0     ───►  OutOfStock   "Нет в наличии"
//!   1 ..= min       ───►  Low          "Осталось мало"
//!   > min           ───►  InStock      "В наличии"
//! ```
//!
//! `min` is the product's `min_stock_level`, or
//! [`DEFAULT_MIN_STOCK_LEVEL`](crate::DEFAULT_MIN_STOCK_LEVEL) when the product
//! has none. An explicit `0` is honoured as-is.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::DEFAULT_MIN_STOCK_LEVEL;

/// Availability classification of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    Low,
    InStock,
}

impl StockStatus {
    /// Low and in-stock products can be added to a cart.
    #[inline]
    pub fn is_purchasable(&self) -> bool {
        !matches!(self, StockStatus::OutOfStock)
    }

    /// Customer-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "Нет в наличии",
            StockStatus::Low => "Осталось мало",
            StockStatus::InStock => "В наличии",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockStatus::OutOfStock => write!(f, "out_of_stock"),
            StockStatus::Low => write!(f, "low"),
            StockStatus::InStock => write!(f, "in_stock"),
        }
    }
}

/// Classifies stock from the current quantity and the low-stock threshold.
///
/// ## Example
/// ```rust
/// use tekhnika_core::stock::{classify_stock, StockStatus};
///
/// assert_eq!(classify_stock(Some(0), Some(5)), StockStatus::OutOfStock);
/// assert_eq!(classify_stock(Some(5), Some(5)), StockStatus::Low);
/// assert_eq!(classify_stock(Some(6), None), StockStatus::InStock);
/// assert_eq!(classify_stock(None, Some(5)), StockStatus::OutOfStock);
/// ```
pub fn classify_stock(stock_quantity: Option<i64>, min_stock_level: Option<i64>) -> StockStatus {
    let min_stock_level = min_stock_level.unwrap_or(DEFAULT_MIN_STOCK_LEVEL);

    match stock_quantity {
        None => StockStatus::OutOfStock,
        Some(q) if q <= 0 => StockStatus::OutOfStock,
        Some(q) if q <= min_stock_level => StockStatus::Low,
        Some(_) => StockStatus::InStock,
    }
}
