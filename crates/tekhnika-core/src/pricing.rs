//! # Pricing
//!
//! Effective sale price of a product under an optional, time-bounded
//! discount.
//!
//! ## Decision Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  calculate_final_price(product, now)                                    │
//! │       │                                                                 │
//! │       ├── no discount? ──────────────────────────► price               │
//! │       ├── discount.is_active == false? ──────────► price               │
//! │       ├── now < starts_at? ──────────────────────► price               │
//! │       ├── now > ends_at? ────────────────────────► price               │
//! │       │                                                                 │
//! │       ├── Percentage(bps) ──► price × (1 − bps/10000), floor at 0      │
//! │       └── Fixed(kopecks)  ──► max(0, price − kopecks)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is total: missing data means "no discount". `now` is
//! always a parameter so the same inputs give the same price in tests and in
//! production.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Discount, DiscountKind, Product};

/// Effective sale price of `product` at `now`.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use tekhnika_core::money::Money;
/// use tekhnika_core::pricing::calculate_final_price;
/// use tekhnika_core::types::{Discount, Product};
///
/// let product = Product::new("wm-1", "Стиральная машина", Money::from_rubles(1000))
///     .with_discount(Discount::fixed(Money::from_rubles(1500), None, None));
///
/// // Fixed discounts never push the price below zero
/// assert_eq!(calculate_final_price(&product, Utc::now()), Money::zero());
/// ```
pub fn calculate_final_price(product: &Product, now: DateTime<Utc>) -> Money {
    match active_discount(product, now) {
        Some(discount) => apply_discount(product.price, discount),
        None => product.price,
    }
}

/// Returns the product's discount if it changes the price at `now`.
pub fn active_discount(product: &Product, now: DateTime<Utc>) -> Option<&Discount> {
    product.discount.as_ref().filter(|d| d.applies_at(now))
}

/// Checks whether the product is on sale at `now`.
#[inline]
pub fn is_on_sale(product: &Product, now: DateTime<Utc>) -> bool {
    calculate_final_price(product, now) < product.price
}

/// Applies a discount to a base price, ignoring its activity window.
///
/// The result is clamped at zero for both kinds. A negative discount value
/// counts as no discount.
pub fn apply_discount(price: Money, discount: &Discount) -> Money {
    let price = price.non_negative();
    let discounted = match discount.kind {
        DiscountKind::Percentage => {
            price.apply_percentage_discount(discount.value.clamp(0, 10_000))
        }
        DiscountKind::Fixed => price - Money::from_kopecks(discount.value.max(0)),
    };
    discounted.non_negative()
}

// =============================================================================
// Price Breakdown
// =============================================================================

/// Everything a product card needs to render its price block.
///
/// ```text
/// ┌──────────────────────────────┐
/// │  ~~24 990 ₽~~   -20%         │  ← base, percent_off
/// │  19 992 ₽                    │  ← final
/// │  Выгода 4 998 ₽              │  ← savings
/// └──────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub base: Money,
    pub final_price: Money,
    pub savings: Money,
    /// Whole percent saved, rounded half-up; 0 when not on sale.
    pub percent_off: u32,
    #[ts(as = "Option<String>")]
    pub discount_ends_at: Option<DateTime<Utc>>,
}

impl PriceBreakdown {
    pub fn is_discounted(&self) -> bool {
        self.savings.is_positive()
    }
}

/// Computes the full price breakdown of `product` at `now`.
pub fn price_breakdown(product: &Product, now: DateTime<Utc>) -> PriceBreakdown {
    let final_price = calculate_final_price(product, now);
    let savings = product.price - final_price;

    PriceBreakdown {
        base: product.price,
        final_price,
        savings,
        percent_off: Money::percent_of(savings, product.price),
        discount_ends_at: active_discount(product, now).and_then(|d| d.ends_at),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 29, 10, 0, 0).unwrap()
    }

    fn product(price_rubles: i64) -> Product {
        Product::new("tv-55", "Телевизор 55\"", Money::from_rubles(price_rubles))
    }

    #[test]
    fn test_no_discount_returns_base_price() {
        assert_eq!(calculate_final_price(&product(1000), now()), Money::from_rubles(1000));
    }

    #[test]
    fn test_inactive_discount_returns_base_price() {
        let p = product(1000).with_discount(Discount::percentage(20, None, None).deactivated());
        assert_eq!(calculate_final_price(&p, now()), Money::from_rubles(1000));
    }

    #[test]
    fn test_percentage_discount() {
        let p = product(1000).with_discount(Discount::percentage(20, None, None));
        assert_eq!(calculate_final_price(&p, now()), Money::from_rubles(800));
    }

    #[test]
    fn test_fractional_percentage_discount() {
        // 12.5% off 2 999.90 ₽ = 374.9875 ₽ off → 374.99 ₽
        let p = Product::new("k", "Чайник", Money::from_kopecks(299_990))
            .with_discount(Discount::percentage_bps(1250, None, None));
        assert_eq!(calculate_final_price(&p, now()), Money::from_kopecks(262_491));
    }

    #[test]
    fn test_fixed_discount() {
        let p = product(1000).with_discount(Discount::fixed(Money::from_rubles(250), None, None));
        assert_eq!(calculate_final_price(&p, now()), Money::from_rubles(750));
    }

    #[test]
    fn test_fixed_discount_clamps_at_zero() {
        let p = product(1000).with_discount(Discount::fixed(Money::from_rubles(1500), None, None));
        assert_eq!(calculate_final_price(&p, now()), Money::zero());
    }

    #[test]
    fn test_percentage_above_hundred_clamps_at_zero() {
        let p = product(1000).with_discount(Discount::percentage(150, None, None));
        assert_eq!(calculate_final_price(&p, now()), Money::zero());
    }

    #[test]
    fn test_negative_fixed_discount_is_ignored() {
        let p = product(1000).with_discount(Discount::fixed(Money::from_kopecks(i64::MIN), None, None));
        assert_eq!(calculate_final_price(&p, now()), Money::from_rubles(1000));
        assert!(!is_on_sale(&p, now()));
    }

    #[test]
    fn test_extreme_discount_values_stay_in_range() {
        let p = Product::new("x", "X", Money::from_kopecks(i64::MAX))
            .with_discount(Discount::percentage_bps(i64::MIN, None, None));
        assert_eq!(calculate_final_price(&p, now()), Money::from_kopecks(i64::MAX));

        let p = product(1000).with_discount(Discount::fixed(Money::from_kopecks(i64::MAX), None, None));
        assert_eq!(calculate_final_price(&p, now()), Money::zero());
    }

    #[test]
    fn test_discount_not_started() {
        let starts = now() + Duration::seconds(1);
        let p = product(1000).with_discount(Discount::percentage(20, Some(starts), None));
        assert_eq!(calculate_final_price(&p, now()), Money::from_rubles(1000));
    }

    #[test]
    fn test_discount_expired() {
        let ends = now() - Duration::seconds(1);
        let p = product(1000).with_discount(Discount::percentage(20, None, Some(ends)));
        assert_eq!(calculate_final_price(&p, now()), Money::from_rubles(1000));
    }

    #[test]
    fn test_discount_inside_window() {
        let p = product(1000).with_discount(Discount::percentage(
            20,
            Some(now() - Duration::days(1)),
            Some(now() + Duration::days(1)),
        ));
        assert_eq!(calculate_final_price(&p, now()), Money::from_rubles(800));
        assert!(is_on_sale(&p, now()));
    }

    #[test]
    fn test_zero_price_stays_zero() {
        let p = product(0).with_discount(Discount::fixed(Money::from_rubles(10), None, None));
        assert_eq!(calculate_final_price(&p, now()), Money::zero());
        assert!(!is_on_sale(&p, now()));
    }

    #[test]
    fn test_price_breakdown() {
        let ends = now() + Duration::days(3);
        let p = product(24_990).with_discount(Discount::percentage(20, None, Some(ends)));

        let breakdown = price_breakdown(&p, now());
        assert_eq!(breakdown.base, Money::from_rubles(24_990));
        assert_eq!(breakdown.final_price, Money::from_rubles(19_992));
        assert_eq!(breakdown.savings, Money::from_rubles(4_998));
        assert_eq!(breakdown.percent_off, 20);
        assert_eq!(breakdown.discount_ends_at, Some(ends));
        assert!(breakdown.is_discounted());
    }

    #[test]
    fn test_price_breakdown_without_discount() {
        let breakdown = price_breakdown(&product(500), now());
        assert_eq!(breakdown.savings, Money::zero());
        assert_eq!(breakdown.percent_off, 0);
        assert_eq!(breakdown.discount_ends_at, None);
        assert!(!breakdown.is_discounted());
    }
}
