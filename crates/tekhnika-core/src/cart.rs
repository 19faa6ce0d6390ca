//! # Cart
//!
//! The shopping cart as a plain value. The storefront app owns one behind a
//! mutex and persists it after every mutation; this module only knows the
//! rules.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Customer Action          Cart method              Line change          │
//! │  ───────────────          ───────────              ───────────          │
//! │                                                                         │
//! │  "В корзину" ────────────► add_product() ────────► push / qty += n     │
//! │                                                                         │
//! │  "+" / "−" ──────────────► set_quantity() ───────► qty = n (0 removes) │
//! │                                                                         │
//! │  Remove ─────────────────► remove() ─────────────► line dropped        │
//! │                                                                         │
//! │  Empty cart ─────────────► clear() ──────────────► all lines dropped   │
//! │                                                                         │
//! │  Open cart page ─────────► refresh() ────────────► re-snapshot prices  │
//! │                                                     and stock caps      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Guard
//! Every line remembers the product's stock at the time it was last seen
//! (`stock_quantity`). Quantities above that cap are rejected and the line
//! keeps its previous quantity. The guard is advisory: nothing is reserved.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::stock::StockStatus;
use crate::types::Product;
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// A product in the cart.
///
/// Everything except `quantity` is a snapshot taken when the product was
/// added (or last refreshed), so the cart renders without a catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,

    pub name: String,

    /// Effective price at add time.
    pub unit_price: Money,

    /// Base price at add time, shown struck through when discounted.
    pub original_price: Money,

    pub image_url: Option<String>,

    pub quantity: i64,

    /// Stock cap for this line.
    pub stock_quantity: i64,

    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Snapshots `product` at `now` with the given quantity.
    pub fn from_product(product: &Product, quantity: i64, now: DateTime<Utc>) -> Self {
        CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.final_price(now),
            original_price: product.price,
            image_url: product.image_url.clone(),
            quantity,
            stock_quantity: product.available_quantity(),
            added_at: now,
        }
    }

    /// Unit price × quantity.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// Original price × quantity.
    pub fn line_original_total(&self) -> Money {
        self.original_price.multiply_quantity(self.quantity)
    }

    pub fn line_savings(&self) -> Money {
        (self.line_original_total() - self.line_total()).non_negative()
    }

    /// Largest quantity this line may hold.
    #[inline]
    pub fn max_quantity(&self) -> i64 {
        self.stock_quantity.clamp(0, MAX_ITEM_QUANTITY)
    }

    fn check_quantity(&self, requested: i64) -> CoreResult<()> {
        check_against_stock(&self.name, self.stock_quantity, requested)
    }
}

fn check_against_stock(name: &str, stock_quantity: i64, requested: i64) -> CoreResult<()> {
    if requested > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested,
            max: MAX_ITEM_QUANTITY,
        });
    }
    if requested > stock_quantity {
        return Err(CoreError::InsufficientStock {
            name: name.to_string(),
            available: stock_quantity.max(0),
            requested,
        });
    }
    Ok(())
}

// =============================================================================
// Adjustments
// =============================================================================

/// Why a line was dropped during a refresh or merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// The product is gone from the catalog or no longer listed.
    Unavailable,
    OutOfStock,
    /// The cart already held `MAX_CART_LINES` lines.
    CartFull,
}

/// A change made to the cart by [`Cart::refresh`] or [`Cart::merge`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartAdjustment {
    #[serde(rename_all = "camelCase")]
    Removed {
        product_id: String,
        name: String,
        reason: RemovalReason,
    },
    #[serde(rename_all = "camelCase")]
    QuantityReduced {
        product_id: String,
        name: String,
        from: i64,
        to: i64,
    },
    #[serde(rename_all = "camelCase")]
    PriceChanged {
        product_id: String,
        name: String,
        from: Money,
        to: Money,
    },
}

impl CartAdjustment {
    /// Removals and quantity cuts stop a checkout; price changes do not.
    pub fn is_blocking(&self) -> bool {
        !matches!(self, CartAdjustment::PriceChanged { .. })
    }

    pub fn product_id(&self) -> &str {
        match self {
            CartAdjustment::Removed { product_id, .. }
            | CartAdjustment::QuantityReduced { product_id, .. }
            | CartAdjustment::PriceChanged { product_id, .. } => product_id,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product increases quantity)
/// - `0 < quantity <= min(stock_quantity, MAX_ITEM_QUANTITY)` for every line
/// - At most `MAX_CART_LINES` lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub lines: Vec<CartLine>,

    /// Time of the last mutation; `None` for a cart never touched.
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds `quantity` units of `product`, or increases an existing line.
    ///
    /// ## Errors
    /// - `ProductUnavailable` if the product is not listed
    /// - `OutOfStock` if stock is absent or `<= 0`
    /// - `InsufficientStock` if the resulting quantity exceeds stock
    /// - `QuantityTooLarge` / `CartTooLarge` for the hard ceilings
    ///
    /// On error the cart is unchanged.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::Utc;
    /// use tekhnika_core::{Cart, CoreError, Money};
    /// use tekhnika_core::types::Product;
    ///
    /// let product = Product::new("mw-1", "Микроволновка", Money::from_rubles(7990)).with_stock(2);
    /// let mut cart = Cart::new();
    ///
    /// let err = cart.add_product(&product, 3, Utc::now()).unwrap_err();
    /// assert!(matches!(err, CoreError::InsufficientStock { available: 2, requested: 3, .. }));
    /// assert!(cart.is_empty());
    /// ```
    pub fn add_product(
        &mut self,
        product: &Product,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<&CartLine> {
        if quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        if !product.is_active {
            return Err(CoreError::ProductUnavailable(product.id.clone()));
        }

        if product.stock_status() == StockStatus::OutOfStock {
            return Err(CoreError::OutOfStock {
                name: product.name.clone(),
            });
        }

        match self.lines.iter().position(|l| l.product_id == product.id) {
            Some(index) => {
                let line = &mut self.lines[index];
                let requested = line.quantity.saturating_add(quantity);

                // The product may have been restocked since the line was added
                let stock_quantity = product.available_quantity();
                check_against_stock(&product.name, stock_quantity, requested)?;
                line.stock_quantity = stock_quantity;
                line.quantity = requested;

                self.updated_at = Some(now);
                Ok(&self.lines[index])
            }
            None => {
                if self.lines.len() >= MAX_CART_LINES {
                    return Err(CoreError::CartTooLarge {
                        max: MAX_CART_LINES,
                    });
                }

                let line = CartLine::from_product(product, quantity, now);
                line.check_quantity(quantity)?;
                self.lines.push(line);

                self.updated_at = Some(now);
                Ok(&self.lines[self.lines.len() - 1])
            }
        }
    }

    /// Sets a line's quantity. Zero removes the line.
    ///
    /// The check uses the line's snapshotted stock cap; call [`Cart::refresh`]
    /// first to pick up restocks.
    pub fn set_quantity(
        &mut self,
        product_id: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        if quantity < 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        if quantity == 0 {
            return self.remove(product_id, now).map(|_| ());
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::NotInCart(product_id.to_string()))?;

        line.check_quantity(quantity)?;
        line.quantity = quantity;
        self.updated_at = Some(now);
        Ok(())
    }

    /// Removes a line and returns it.
    pub fn remove(&mut self, product_id: &str, now: DateTime<Utc>) -> CoreResult<CartLine> {
        let index = self
            .lines
            .iter()
            .position(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::NotInCart(product_id.to_string()))?;

        self.updated_at = Some(now);
        Ok(self.lines.remove(index))
    }

    /// Removes all lines.
    pub fn clear(&mut self, now: DateTime<Utc>) {
        self.lines.clear();
        self.updated_at = Some(now);
    }

    /// Folds `other` into this cart (e.g. a cart saved on another device
    /// into the current one).
    ///
    /// Quantities are summed per product and capped at the line's stock cap
    /// and `MAX_ITEM_QUANTITY`. Lines beyond `MAX_CART_LINES` are dropped.
    /// Every cap or drop is reported.
    pub fn merge(&mut self, other: Cart, now: DateTime<Utc>) -> Vec<CartAdjustment> {
        let mut adjustments = Vec::new();

        for incoming in other.lines {
            let existing = self
                .lines
                .iter()
                .position(|l| l.product_id == incoming.product_id);

            let (index, requested) = match existing {
                Some(index) => {
                    let line = &mut self.lines[index];
                    // The newer snapshot knows the fresher stock level
                    if incoming.added_at > line.added_at {
                        line.stock_quantity = incoming.stock_quantity;
                    }
                    (index, line.quantity.saturating_add(incoming.quantity))
                }
                None => {
                    if self.lines.len() >= MAX_CART_LINES {
                        adjustments.push(CartAdjustment::Removed {
                            product_id: incoming.product_id,
                            name: incoming.name,
                            reason: RemovalReason::CartFull,
                        });
                        continue;
                    }
                    let requested = incoming.quantity;
                    self.lines.push(incoming);
                    (self.lines.len() - 1, requested)
                }
            };

            let line = &mut self.lines[index];
            let capped = requested.min(line.max_quantity());
            line.quantity = capped;
            if capped < requested {
                adjustments.push(CartAdjustment::QuantityReduced {
                    product_id: line.product_id.clone(),
                    name: line.name.clone(),
                    from: requested,
                    to: capped,
                });
            }
        }

        // A zero cap leaves nothing to buy
        self.lines.retain(|l| l.quantity > 0);
        self.updated_at = Some(now);
        adjustments
    }

    /// Re-snapshots every line against the current catalog.
    ///
    /// Lines whose product is missing, unlisted or out of stock are removed.
    /// Quantities above the current stock are cut down. Prices and stock caps
    /// are updated. Returns what changed, in line order.
    pub fn refresh(&mut self, products: &[Product], now: DateTime<Utc>) -> Vec<CartAdjustment> {
        let by_id: HashMap<&str, &Product> =
            products.iter().map(|p| (p.id.as_str(), p)).collect();
        let mut adjustments = Vec::new();

        self.lines.retain_mut(|line| {
            let product = match by_id.get(line.product_id.as_str()) {
                Some(p) if p.is_active => *p,
                _ => {
                    adjustments.push(CartAdjustment::Removed {
                        product_id: line.product_id.clone(),
                        name: line.name.clone(),
                        reason: RemovalReason::Unavailable,
                    });
                    return false;
                }
            };

            if product.stock_status() == StockStatus::OutOfStock {
                adjustments.push(CartAdjustment::Removed {
                    product_id: line.product_id.clone(),
                    name: product.name.clone(),
                    reason: RemovalReason::OutOfStock,
                });
                return false;
            }

            line.name = product.name.clone();
            line.image_url = product.image_url.clone();
            line.stock_quantity = product.available_quantity();

            let price = product.final_price(now);
            if price != line.unit_price {
                adjustments.push(CartAdjustment::PriceChanged {
                    product_id: line.product_id.clone(),
                    name: line.name.clone(),
                    from: line.unit_price,
                    to: price,
                });
                line.unit_price = price;
            }
            line.original_price = product.price;

            let max = line.max_quantity();
            if line.quantity > max {
                adjustments.push(CartAdjustment::QuantityReduced {
                    product_id: line.product_id.clone(),
                    name: line.name.clone(),
                    from: line.quantity,
                    to: max,
                });
                line.quantity = max;
            }

            true
        });

        if !adjustments.is_empty() {
            self.updated_at = Some(now);
        }
        adjustments
    }

    /// Finds a line by product id.
    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// Ids of all products in the cart, in line order.
    pub fn product_ids(&self) -> Vec<String> {
        self.lines.iter().map(|l| l.product_id.clone()).collect()
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of all line quantities.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Computes the totals block.
    pub fn totals(&self) -> CartTotals {
        CartTotals::from(self)
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Cart totals summary for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    /// At original prices.
    pub subtotal: Money,
    pub savings: Money,
    /// At snapshotted effective prices.
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        let subtotal: Money = cart.lines.iter().map(CartLine::line_original_total).sum();
        let total: Money = cart.lines.iter().map(CartLine::line_total).sum();
        let savings: Money = cart.lines.iter().map(CartLine::line_savings).sum();

        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            subtotal,
            savings,
            total,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Discount;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 29, 10, 0, 0).unwrap()
    }

    fn product(id: &str, rubles: i64, stock: i64) -> Product {
        Product::new(id, format!("Товар {}", id), Money::from_rubles(rubles)).with_stock(stock)
    }

    #[test]
    fn test_add_product() {
        let mut cart = Cart::new();
        let p = product("1", 1000, 10);

        cart.add_product(&p, 2, now()).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.totals().total, Money::from_rubles(2000));
        assert_eq!(cart.updated_at, Some(now()));
    }

    #[test]
    fn test_add_same_product_increases_quantity() {
        let mut cart = Cart::new();
        let p = product("1", 1000, 10);

        cart.add_product(&p, 2, now()).unwrap();
        cart.add_product(&p, 3, now()).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_add_beyond_stock_on_empty_cart_is_rejected() {
        let mut cart = Cart::new();
        let p = product("1", 1000, 2);

        let err = cart.add_product(&p, 3, now()).unwrap_err();

        assert_eq!(
            err,
            CoreError::InsufficientStock {
                name: "Товар 1".to_string(),
                available: 2,
                requested: 3,
            }
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_increase_beyond_stock_keeps_prior_quantity() {
        let mut cart = Cart::new();
        let p = product("1", 1000, 2);

        cart.add_product(&p, 2, now()).unwrap();
        assert!(cart.add_product(&p, 1, now()).is_err());
        assert!(cart.set_quantity("1", 3, now()).is_err());

        assert_eq!(cart.line("1").unwrap().quantity, 2);
    }

    #[test]
    fn test_add_out_of_stock_is_rejected() {
        let mut cart = Cart::new();

        let zero = product("1", 1000, 0);
        assert!(matches!(
            cart.add_product(&zero, 1, now()),
            Err(CoreError::OutOfStock { .. })
        ));

        let unknown = Product::new("2", "Без остатка", Money::from_rubles(100));
        assert!(matches!(
            cart.add_product(&unknown, 1, now()),
            Err(CoreError::OutOfStock { .. })
        ));

        let negative = product("3", 1000, -4);
        assert!(cart.add_product(&negative, 1, now()).is_err());

        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_inactive_product_is_rejected() {
        let mut cart = Cart::new();
        let mut p = product("1", 1000, 5);
        p.is_active = false;

        assert_eq!(
            cart.add_product(&p, 1, now()).unwrap_err(),
            CoreError::ProductUnavailable("1".to_string())
        );
    }

    #[test]
    fn test_add_non_positive_quantity_is_rejected() {
        let mut cart = Cart::new();
        let p = product("1", 1000, 5);

        assert!(matches!(
            cart.add_product(&p, 0, now()),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_max_item_quantity() {
        let mut cart = Cart::new();
        let p = product("1", 10, 500);

        assert!(matches!(
            cart.add_product(&p, MAX_ITEM_QUANTITY + 1, now()),
            Err(CoreError::QuantityTooLarge { .. })
        ));
        cart.add_product(&p, MAX_ITEM_QUANTITY, now()).unwrap();
    }

    #[test]
    fn test_max_cart_lines() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_LINES {
            cart.add_product(&product(&i.to_string(), 10, 5), 1, now())
                .unwrap();
        }

        assert_eq!(
            cart.add_product(&product("extra", 10, 5), 1, now()).unwrap_err(),
            CoreError::CartTooLarge {
                max: MAX_CART_LINES
            }
        );
    }

    #[test]
    fn test_line_snapshots_effective_price() {
        let mut cart = Cart::new();
        let p = product("1", 1000, 5).with_discount(Discount::percentage(20, None, None));

        let line = cart.add_product(&p, 1, now()).unwrap();
        assert_eq!(line.unit_price, Money::from_rubles(800));
        assert_eq!(line.original_price, Money::from_rubles(1000));
        assert_eq!(line.stock_quantity, 5);
        assert_eq!(line.added_at, now());
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::new();
        cart.add_product(&product("1", 1000, 5), 2, now()).unwrap();

        cart.set_quantity("1", 0, now()).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_unknown_line() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.set_quantity("nope", 1, now()).unwrap_err(),
            CoreError::NotInCart("nope".to_string())
        );
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add_product(&product("1", 1000, 5), 1, now()).unwrap();
        cart.add_product(&product("2", 500, 5), 1, now()).unwrap();

        let removed = cart.remove("1", now()).unwrap();
        assert_eq!(removed.product_id, "1");
        assert!(cart.remove("1", now()).is_err());

        cart.clear(now());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_totals_with_savings() {
        let mut cart = Cart::new();
        let discounted = product("1", 1000, 5).with_discount(Discount::percentage(20, None, None));
        let plain = product("2", 500, 5);

        cart.add_product(&discounted, 2, now()).unwrap();
        cart.add_product(&plain, 1, now()).unwrap();

        let totals = cart.totals();
        assert_eq!(totals.item_count, 2);
        assert_eq!(totals.total_quantity, 3);
        assert_eq!(totals.subtotal, Money::from_rubles(2500));
        assert_eq!(totals.savings, Money::from_rubles(400));
        assert_eq!(totals.total, Money::from_rubles(2100));
    }

    #[test]
    fn test_totals_saturate_on_huge_prices() {
        let mut cart = Cart::new();
        let huge = Product::new("big", "Склад", Money::from_kopecks(i64::MAX / 2)).with_stock(10);

        cart.add_product(&huge, 3, now()).unwrap();

        let totals = cart.totals();
        assert_eq!(totals.subtotal, Money::from_kopecks(i64::MAX));
        assert_eq!(totals.total, Money::from_kopecks(i64::MAX));
        assert_eq!(totals.savings, Money::zero());
    }

    #[test]
    fn test_merge_caps_at_stock() {
        let mut cart = Cart::new();
        cart.add_product(&product("1", 1000, 3), 2, now()).unwrap();

        let mut other = Cart::new();
        other.add_product(&product("1", 1000, 3), 2, now()).unwrap();
        other.add_product(&product("2", 500, 5), 1, now()).unwrap();

        let adjustments = cart.merge(other, now());

        assert_eq!(cart.line("1").unwrap().quantity, 3);
        assert_eq!(cart.line("2").unwrap().quantity, 1);
        assert_eq!(
            adjustments,
            vec![CartAdjustment::QuantityReduced {
                product_id: "1".to_string(),
                name: "Товар 1".to_string(),
                from: 4,
                to: 3,
            }]
        );
    }

    #[test]
    fn test_merge_into_full_cart_reports_cart_full() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_LINES {
            cart.add_product(&product(&i.to_string(), 100, 5), 1, now())
                .unwrap();
        }

        let mut other = Cart::new();
        other.add_product(&product("extra", 100, 5), 1, now()).unwrap();

        let adjustments = cart.merge(other, now());

        assert_eq!(cart.item_count(), MAX_CART_LINES);
        assert_eq!(
            adjustments,
            vec![CartAdjustment::Removed {
                product_id: "extra".to_string(),
                name: "Товар extra".to_string(),
                reason: RemovalReason::CartFull,
            }]
        );
    }

    #[test]
    fn test_merge_uses_newer_stock_snapshot() {
        let mut cart = Cart::new();
        cart.add_product(&product("1", 1000, 2), 2, now()).unwrap();

        let mut other = Cart::new();
        let later = now() + Duration::hours(1);
        other.add_product(&product("1", 1000, 10), 3, later).unwrap();

        assert!(cart.merge(other, later).is_empty());
        assert_eq!(cart.line("1").unwrap().quantity, 5);
    }

    #[test]
    fn test_refresh_removes_unavailable_and_caps_quantity() {
        let mut cart = Cart::new();
        cart.add_product(&product("gone", 100, 5), 1, now()).unwrap();
        cart.add_product(&product("empty", 100, 5), 1, now()).unwrap();
        cart.add_product(&product("short", 100, 5), 4, now()).unwrap();
        cart.add_product(&product("ok", 100, 5), 1, now()).unwrap();

        let catalog = vec![
            product("empty", 100, 0),
            product("short", 100, 2),
            product("ok", 100, 5),
        ];
        let adjustments = cart.refresh(&catalog, now());

        assert_eq!(cart.product_ids(), vec!["short", "ok"]);
        assert_eq!(cart.line("short").unwrap().quantity, 2);
        assert_eq!(adjustments.len(), 3);
        assert!(adjustments.iter().all(CartAdjustment::is_blocking));
        assert_eq!(adjustments[0].product_id(), "gone");
        assert!(matches!(
            adjustments[1],
            CartAdjustment::Removed {
                reason: RemovalReason::OutOfStock,
                ..
            }
        ));
    }

    #[test]
    fn test_refresh_picks_up_price_change() {
        let mut cart = Cart::new();
        let ends = now() + Duration::days(1);
        let p = product("1", 1000, 5).with_discount(Discount::percentage(20, None, Some(ends)));
        cart.add_product(&p, 1, now()).unwrap();

        // The sale is over by the time the customer returns
        let later = ends + Duration::seconds(1);
        let adjustments = cart.refresh(&[p], later);

        assert_eq!(
            adjustments,
            vec![CartAdjustment::PriceChanged {
                product_id: "1".to_string(),
                name: "Товар 1".to_string(),
                from: Money::from_rubles(800),
                to: Money::from_rubles(1000),
            }]
        );
        assert!(!adjustments[0].is_blocking());
        assert_eq!(cart.totals().total, Money::from_rubles(1000));
    }

    #[test]
    fn test_cart_json_round_trip() {
        let mut cart = Cart::new();
        cart.add_product(&product("1", 1000, 5), 2, now()).unwrap();

        let json = serde_json::to_string(&cart).unwrap();
        assert!(json.contains("\"productId\":\"1\""));
        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cart);
    }
}
