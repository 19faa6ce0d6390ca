//! # Domain Types
//!
//! Core domain types used throughout the storefront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Discount     │   │    Category     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  kind           │   │  id             │       │
//! │  │  name, brand    │──►│  value          │   │  name           │       │
//! │  │  price (Money)  │   │  starts_at      │   │  slug           │       │
//! │  │  stock_quantity │   │  ends_at        │   │  sort_order     │       │
//! │  │  min_stock_level│   │  is_active      │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐                                                    │
//! │  │  DiscountKind   │   Percentage: value in basis points (2000 = 20%)   │
//! │  │  Percentage     │   Fixed:      value in kopecks                     │
//! │  │  Fixed          │                                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::pricing;
use crate::stock::{self, StockStatus};

// =============================================================================
// Discount
// =============================================================================

/// How a discount's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// `value` is a rate in basis points.
    Percentage,
    /// `value` is an amount in kopecks.
    Fixed,
}

impl DiscountKind {
    /// Returns the lowercase name used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "percentage",
            DiscountKind::Fixed => "fixed",
        }
    }
}

impl std::fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DiscountKind {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "percentage" | "percent" => Ok(DiscountKind::Percentage),
            "fixed" | "amount" => Ok(DiscountKind::Fixed),
            _ => Err(crate::error::ValidationError::NotAllowed {
                field: "discount.type".to_string(),
                allowed: vec!["percentage".to_string(), "fixed".to_string()],
            }),
        }
    }
}

/// A time-bounded price reduction attached to a product.
///
/// A discount applies only while `is_active` is set and "now" lies inside
/// `[starts_at, ends_at]`. Either bound may be open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub kind: DiscountKind,

    /// Basis points for [`DiscountKind::Percentage`], kopecks for
    /// [`DiscountKind::Fixed`].
    pub value: i64,

    #[ts(as = "Option<String>")]
    pub starts_at: Option<DateTime<Utc>>,

    #[ts(as = "Option<String>")]
    pub ends_at: Option<DateTime<Utc>>,

    pub is_active: bool,
}

impl Discount {
    /// An active percentage discount in whole percent.
    pub fn percentage(
        percent: i64,
        starts_at: Option<DateTime<Utc>>,
        ends_at: Option<DateTime<Utc>>,
    ) -> Self {
        Discount::percentage_bps(percent.saturating_mul(100), starts_at, ends_at)
    }

    /// An active percentage discount in basis points (1250 = 12.5%).
    pub fn percentage_bps(
        bps: i64,
        starts_at: Option<DateTime<Utc>>,
        ends_at: Option<DateTime<Utc>>,
    ) -> Self {
        Discount {
            kind: DiscountKind::Percentage,
            value: bps,
            starts_at,
            ends_at,
            is_active: true,
        }
    }

    /// An active fixed-amount discount.
    pub fn fixed(
        amount: Money,
        starts_at: Option<DateTime<Utc>>,
        ends_at: Option<DateTime<Utc>>,
    ) -> Self {
        Discount {
            kind: DiscountKind::Fixed,
            value: amount.kopecks(),
            starts_at,
            ends_at,
            is_active: true,
        }
    }

    /// Returns a copy with `is_active` switched off.
    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Checks whether `now` lies inside the discount window (bounds inclusive).
    pub fn is_in_window(&self, now: DateTime<Utc>) -> bool {
        if let Some(starts_at) = self.starts_at {
            if now < starts_at {
                return false;
            }
        }
        if let Some(ends_at) = self.ends_at {
            if now > ends_at {
                return false;
            }
        }
        true
    }

    /// Checks whether the discount changes the price at `now`.
    #[inline]
    pub fn applies_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.is_in_window(now)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog, as consumed by the pricing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Document identifier from the catalog store.
    pub id: String,

    /// Display name shown on cards and in the cart.
    pub name: String,

    pub description: Option<String>,

    pub brand: Option<String>,

    /// Category the product is listed under.
    pub category_id: Option<String>,

    /// Primary image, snapshotted into cart lines.
    pub image_url: Option<String>,

    /// Base price before any discount. Never negative.
    pub price: Money,

    pub discount: Option<Discount>,

    /// Units available. `None` means unknown, which is not the same as zero
    /// but is treated as out of stock.
    pub stock_quantity: Option<i64>,

    /// Threshold at or below which stock is reported as low.
    pub min_stock_level: Option<i64>,

    /// Whether the product is listed (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates an active product with no discount and unknown stock.
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Money) -> Self {
        Product {
            id: id.into(),
            name: name.into(),
            description: None,
            brand: None,
            category_id: None,
            image_url: None,
            price,
            discount: None,
            stock_quantity: None,
            min_stock_level: None,
            is_active: true,
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        }
    }

    /// Sets the stock quantity (builder style).
    pub fn with_stock(mut self, quantity: i64) -> Self {
        self.stock_quantity = Some(quantity);
        self
    }

    /// Sets the discount (builder style).
    pub fn with_discount(mut self, discount: Discount) -> Self {
        self.discount = Some(discount);
        self
    }

    /// Effective sale price at `now`.
    #[inline]
    pub fn final_price(&self, now: DateTime<Utc>) -> Money {
        pricing::calculate_final_price(self, now)
    }

    /// Stock status derived from quantity and threshold.
    #[inline]
    pub fn stock_status(&self) -> StockStatus {
        stock::classify_stock(self.stock_quantity, self.min_stock_level)
    }

    /// Units that can be put in a cart (absent or negative stock counts as 0).
    #[inline]
    pub fn available_quantity(&self) -> i64 {
        self.stock_quantity.unwrap_or(0).max(0)
    }

    /// Checks whether the product is listed and has stock.
    pub fn is_purchasable(&self) -> bool {
        self.is_active && self.stock_status().is_purchasable()
    }

    /// First image or `None`; kept for symmetry with cart snapshots.
    pub fn image(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}

// =============================================================================
// Category
// =============================================================================

/// A catalog category (refrigerators, washing machines, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    /// URL-safe identifier used by catalog filters.
    pub slug: String,
    /// Position in navigation menus, ascending.
    pub sort_order: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_discount_window_bounds_inclusive() {
        let now = noon();
        let discount = Discount::percentage(10, Some(now), Some(now));
        assert!(discount.is_in_window(now));
        assert!(!discount.is_in_window(now + Duration::seconds(1)));
        assert!(!discount.is_in_window(now - Duration::seconds(1)));
    }

    #[test]
    fn test_discount_open_window() {
        let discount = Discount::fixed(Money::from_rubles(100), None, None);
        assert!(discount.applies_at(noon()));
        assert!(!discount.deactivated().applies_at(noon()));
    }

    #[test]
    fn test_discount_kind_parsing() {
        assert_eq!("percentage".parse::<DiscountKind>().unwrap(), DiscountKind::Percentage);
        assert_eq!("FIXED".parse::<DiscountKind>().unwrap(), DiscountKind::Fixed);
        assert!("bogo".parse::<DiscountKind>().is_err());
    }

    #[test]
    fn test_available_quantity() {
        let product = Product::new("p", "Микроволновка", Money::from_rubles(5000));
        assert_eq!(product.available_quantity(), 0);
        assert_eq!(product.clone().with_stock(-3).available_quantity(), 0);
        assert_eq!(product.with_stock(4).available_quantity(), 4);
    }

    #[test]
    fn test_inactive_product_not_purchasable() {
        let mut product = Product::new("p", "Пылесос", Money::from_rubles(9000)).with_stock(10);
        assert!(product.is_purchasable());
        product.is_active = false;
        assert!(!product.is_purchasable());
    }
}
