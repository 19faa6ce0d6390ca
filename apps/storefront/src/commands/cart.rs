//! # Cart Commands
//!
//! Commands for cart manipulation.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Checkout │────►│  Order   │       │
//! │  │  Cart    │     │          │     │  Form    │     │  Placed  │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                 │                              │
//! │                   add_to_cart        checkout                          │
//! │                   set_quantity       (checkout.rs)                     │
//! │                   remove_from_cart                                      │
//! │                   merge_cart                                            │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   clear_cart ──────────────────────►                   │
//! │                                                      (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every response carries the lines, the totals and any adjustments the
//! catalog forced on the cart (a product sold out, a price changed).

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{CartState, DbState};
use tekhnika_core::{Cart, CartAdjustment, CartLine, CartTotals, CoreError, Product};

/// Cart response including lines, totals and adjustments.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
    /// Changes made by the last refresh against the catalog.
    pub adjustments: Vec<CartAdjustment>,
}

impl CartView {
    fn new(cart: &Cart, adjustments: Vec<CartAdjustment>) -> Self {
        CartView {
            lines: cart.lines.clone(),
            totals: cart.totals(),
            adjustments,
        }
    }
}

/// Loads the current catalog state of every product in the cart.
pub(crate) async fn cart_products(db: &DbState, cart: &CartState) -> Result<Vec<Product>, ApiError> {
    let ids = cart.with_cart(|c| c.product_ids());
    Ok(db.inner().products().get_many(&ids).await?)
}

/// Gets the cart, re-checked against the current catalog.
///
/// Lines whose product sold out or was unlisted are dropped, quantities above
/// the current stock are cut and prices follow the catalog. The adjusted cart
/// is persisted.
pub async fn get_cart(
    db: &DbState,
    cart: &CartState,
    now: DateTime<Utc>,
) -> Result<CartView, ApiError> {
    debug!("get_cart command");

    let products = cart_products(db, cart).await?;
    let adjustments = cart.update(|c| c.refresh(&products, now)).await?;

    if !adjustments.is_empty() {
        info!(count = adjustments.len(), "Cart adjusted to catalog");
    }

    Ok(cart.with_cart(|c| CartView::new(c, adjustments)))
}

/// Adds a product to the cart.
///
/// ## Behavior
/// - Already in cart: quantity increases
/// - Not in cart: added as a new line with the current sale price
/// - Stock is checked against the catalog; a rejected add leaves the cart as
///   it was
pub async fn add_to_cart(
    db: &DbState,
    cart: &CartState,
    product_id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> Result<CartView, ApiError> {
    debug!(product_id = %product_id, quantity = %quantity, "add_to_cart command");

    let product = db
        .inner()
        .products()
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| ApiError::from(CoreError::ProductNotFound(product_id.to_string())))?;

    cart.mutate(|c| c.add_product(&product, quantity, now).map(|_| ()))
        .await?;

    Ok(cart.with_cart(|c| CartView::new(c, Vec::new())))
}

/// Sets the quantity of a line. Quantity 0 removes the line.
///
/// The cart is refreshed first so the stock cap is current.
pub async fn set_quantity(
    db: &DbState,
    cart: &CartState,
    product_id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> Result<CartView, ApiError> {
    debug!(product_id = %product_id, quantity = %quantity, "set_quantity command");

    let products = cart_products(db, cart).await?;
    let adjustments = cart
        .mutate(|c| {
            let adjustments = c.refresh(&products, now);
            c.set_quantity(product_id, quantity, now)?;
            Ok(adjustments)
        })
        .await?;

    Ok(cart.with_cart(|c| CartView::new(c, adjustments)))
}

/// Folds a saved cart (exported from another device or session) into the
/// current one, then re-checks the result against the catalog.
///
/// Quantities are summed per product and capped; lines that do not fit or
/// are no longer sold are reported as adjustments.
pub async fn merge_cart(
    db: &DbState,
    cart: &CartState,
    other: Cart,
    now: DateTime<Utc>,
) -> Result<CartView, ApiError> {
    debug!(lines = other.item_count(), "merge_cart command");

    let mut ids = cart.with_cart(|c| c.product_ids());
    ids.extend(other.product_ids());
    ids.sort();
    ids.dedup();
    let products = db.inner().products().get_many(&ids).await?;

    let adjustments = cart
        .update(|c| {
            let mut adjustments = c.merge(other, now);
            adjustments.extend(c.refresh(&products, now));
            adjustments
        })
        .await?;

    info!(adjustments = adjustments.len(), "Cart merged");
    Ok(cart.with_cart(|c| CartView::new(c, adjustments)))
}

/// Removes a line from the cart.
pub async fn remove_from_cart(
    cart: &CartState,
    product_id: &str,
    now: DateTime<Utc>,
) -> Result<CartView, ApiError> {
    debug!(product_id = %product_id, "remove_from_cart command");

    cart.mutate(|c| c.remove(product_id, now).map(|_| ()))
        .await?;

    Ok(cart.with_cart(|c| CartView::new(c, Vec::new())))
}

/// Clears all lines from the cart.
pub async fn clear_cart(cart: &CartState, now: DateTime<Utc>) -> Result<CartView, ApiError> {
    debug!("clear_cart command");

    cart.update(|c| c.clear(now)).await?;
    Ok(cart.with_cart(|c| CartView::new(c, Vec::new())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{memory_cart, seeded_db, test_now};
    use crate::error::ErrorCode;
    use tekhnika_core::Money;

    #[tokio::test]
    async fn test_add_uses_sale_price() {
        let db = seeded_db().await;
        let cart = memory_cart().await;

        let view = add_to_cart(&db, &cart, "fridge-lg", 1, test_now())
            .await
            .unwrap();

        assert_eq!(view.lines[0].unit_price, Money::from_rubles(40_000));
        assert_eq!(view.totals.subtotal, Money::from_rubles(50_000));
        assert_eq!(view.totals.savings, Money::from_rubles(10_000));
        assert_eq!(view.totals.total, Money::from_rubles(40_000));
    }

    #[tokio::test]
    async fn test_add_beyond_stock_rejected() {
        let db = seeded_db().await;
        let cart = memory_cart().await;

        let err = add_to_cart(&db, &cart, "kettle", 3, test_now())
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(cart.with_cart(|c| c.is_empty()));
    }

    #[tokio::test]
    async fn test_add_out_of_stock_and_unknown() {
        let db = seeded_db().await;
        let cart = memory_cart().await;

        let err = add_to_cart(&db, &cart, "washer-beko", 1, test_now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let err = add_to_cart(&db, &cart, "nope", 1, test_now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_refresh_reports_sold_out_line() {
        let db = seeded_db().await;
        let cart = memory_cart().await;
        add_to_cart(&db, &cart, "kettle", 2, test_now())
            .await
            .unwrap();
        add_to_cart(&db, &cart, "fridge-atlant", 1, test_now())
            .await
            .unwrap();

        db.inner().products().set_stock("kettle", Some(0)).await.unwrap();

        let view = get_cart(&db, &cart, test_now()).await.unwrap();
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.adjustments.len(), 1);
        assert_eq!(view.adjustments[0].product_id(), "kettle");
    }

    #[tokio::test]
    async fn test_set_quantity_respects_fresh_stock() {
        let db = seeded_db().await;
        let cart = memory_cart().await;
        add_to_cart(&db, &cart, "fridge-lg", 1, test_now())
            .await
            .unwrap();

        db.inner()
            .products()
            .set_stock("fridge-lg", Some(4))
            .await
            .unwrap();

        let err = set_quantity(&db, &cart, "fridge-lg", 5, test_now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let view = set_quantity(&db, &cart, "fridge-lg", 4, test_now())
            .await
            .unwrap();
        assert_eq!(view.totals.total_quantity, 4);

        let view = set_quantity(&db, &cart, "fridge-lg", 0, test_now())
            .await
            .unwrap();
        assert!(view.lines.is_empty());
    }

    #[tokio::test]
    async fn test_merge_saved_cart() {
        let db = seeded_db().await;
        let cart = memory_cart().await;
        add_to_cart(&db, &cart, "kettle", 1, test_now())
            .await
            .unwrap();

        let products = db
            .inner()
            .products()
            .get_many(&["kettle".to_string(), "fridge-atlant".to_string()])
            .await
            .unwrap();
        let mut saved = Cart::new();
        for product in &products {
            saved.add_product(product, 2, test_now()).unwrap();
        }

        let view = merge_cart(&db, &cart, saved, test_now()).await.unwrap();

        // kettle: 1 + 2 capped at stock 2
        let kettle = view.lines.iter().find(|l| l.product_id == "kettle").unwrap();
        assert_eq!(kettle.quantity, 2);
        let atlant = view
            .lines
            .iter()
            .find(|l| l.product_id == "fridge-atlant")
            .unwrap();
        assert_eq!(atlant.quantity, 2);
        assert_eq!(view.adjustments.len(), 1);
        assert_eq!(view.adjustments[0].product_id(), "kettle");
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let db = seeded_db().await;
        let cart = memory_cart().await;
        add_to_cart(&db, &cart, "kettle", 1, test_now())
            .await
            .unwrap();
        add_to_cart(&db, &cart, "fridge-lg", 1, test_now())
            .await
            .unwrap();

        let view = remove_from_cart(&cart, "kettle", test_now()).await.unwrap();
        assert_eq!(view.lines.len(), 1);

        let err = remove_from_cart(&cart, "kettle", test_now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);

        let view = clear_cart(&cart, test_now()).await.unwrap();
        assert!(view.lines.is_empty());
        assert_eq!(view.totals.total, Money::default());
    }
}
