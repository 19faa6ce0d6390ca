//! # Checkout Command
//!
//! Turns the cart into an order.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  checkout(customer)                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. Refresh cart against the catalog (persisted)                       │
//! │       │                                                                 │
//! │       ├── line removed or cut? ──► CART_CHANGED, nothing ordered       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  2. Order number: {prefix}-{YYYYMMDD}-{n}, n = orders today + 1        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  3. Order::from_cart (contact form validated, lines frozen)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  4. INSERT order + items (one transaction)                             │
//! │       │   number taken by a concurrent checkout? ──► next number       │
//! │       ▼                                                                 │
//! │  5. Clear cart                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is not reserved or decremented; the back office confirms orders by
//! phone and corrects stock through the admin commands.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::commands::cart::cart_products;
use crate::error::{ApiError, ErrorCode};
use crate::state::{CartState, ConfigState, DbState};
use tekhnika_core::order::format_order_number;
use tekhnika_core::{CartAdjustment, CustomerInfo, Order};
use tekhnika_db::DbError;

/// Attempts at claiming an order number before giving up.
const MAX_NUMBER_ATTEMPTS: u32 = 3;

/// Result of a successful checkout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResult {
    pub order: Order,
    /// Price changes picked up by the final refresh; the order uses the new
    /// prices.
    pub price_changes: Vec<CartAdjustment>,
}

fn describe(adjustments: &[CartAdjustment]) -> String {
    let names: Vec<String> = adjustments
        .iter()
        .map(|a| match a {
            CartAdjustment::Removed { name, .. } => format!("{} is no longer available", name),
            CartAdjustment::QuantityReduced { name, to, .. } => {
                format!("only {} of {} left", to, name)
            }
            CartAdjustment::PriceChanged { name, to, .. } => {
                format!("{} now costs {}", name, to)
            }
        })
        .collect();

    format!("The cart has changed: {}", names.join("; "))
}

/// Places an order for the current cart.
pub async fn checkout(
    db: &DbState,
    cart: &CartState,
    config: &ConfigState,
    customer: CustomerInfo,
    now: DateTime<Utc>,
) -> Result<CheckoutResult, ApiError> {
    debug!("checkout command");

    let products = cart_products(db, cart).await?;
    let adjustments = cart.update(|c| c.refresh(&products, now)).await?;

    let (blocking, price_changes): (Vec<_>, Vec<_>) =
        adjustments.into_iter().partition(CartAdjustment::is_blocking);

    if !blocking.is_empty() {
        warn!(count = blocking.len(), "Checkout stopped by cart changes");
        return Err(ApiError::new(ErrorCode::CartChanged, describe(&blocking)));
    }

    let snapshot = cart.snapshot();
    let orders = db.inner().orders();
    let mut sequence = orders.next_daily_sequence(now).await?;
    let mut attempt = 1;

    let order = loop {
        let number = format_order_number(&config.store.order_prefix, now, sequence);
        let order = Order::from_cart(&snapshot, customer.clone(), number, now)?;

        match orders.insert(&order).await {
            Ok(()) => break order,
            Err(DbError::UniqueViolation { .. }) if attempt < MAX_NUMBER_ATTEMPTS => {
                warn!(order_number = %order.order_number, "Order number taken, retrying");
                sequence += 1;
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    };

    cart.update(|c| c.clear(now)).await?;

    info!(
        order_number = %order.order_number,
        lines = order.lines.len(),
        total = %order.total,
        "Order placed"
    );

    Ok(CheckoutResult {
        order,
        price_changes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::add_to_cart;
    use crate::commands::test_support::{memory_cart, seeded_db, test_now};
    use chrono::Duration;
    use tekhnika_core::{Money, OrderStatus};

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "Иван Петров".to_string(),
            phone: "8 (912) 345-67-89".to_string(),
            email: Some("ivan@example.ru".to_string()),
            address: Some("Екатеринбург, ул. Ленина, 1".to_string()),
            comment: None,
        }
    }

    #[tokio::test]
    async fn test_checkout_places_order_and_clears_cart() {
        let db = seeded_db().await;
        let cart = memory_cart().await;
        let config = ConfigState::default();
        add_to_cart(&db, &cart, "fridge-lg", 1, test_now())
            .await
            .unwrap();
        add_to_cart(&db, &cart, "kettle", 2, test_now())
            .await
            .unwrap();

        let result = checkout(&db, &cart, &config, customer(), test_now())
            .await
            .unwrap();

        let order = result.order;
        assert_eq!(order.order_number, "TK-20241129-0001");
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.customer.phone, "+79123456789");
        assert_eq!(order.total, Money::from_rubles(44_000));
        assert_eq!(order.savings, Money::from_rubles(10_000));
        assert!(cart.with_cart(|c| c.is_empty()));

        let stored = db.inner().orders().get(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.lines.len(), 2);
    }

    #[tokio::test]
    async fn test_sequence_continues_within_day() {
        let db = seeded_db().await;
        let cart = memory_cart().await;
        let config = ConfigState::default();

        for expected in ["TK-20241129-0001", "TK-20241129-0002"] {
            add_to_cart(&db, &cart, "fridge-lg", 1, test_now())
                .await
                .unwrap();
            let result = checkout(&db, &cart, &config, customer(), test_now())
                .await
                .unwrap();
            assert_eq!(result.order.order_number, expected);
        }
    }

    #[tokio::test]
    async fn test_sold_out_line_blocks_checkout() {
        let db = seeded_db().await;
        let cart = memory_cart().await;
        add_to_cart(&db, &cart, "kettle", 2, test_now())
            .await
            .unwrap();
        db.inner().products().set_stock("kettle", Some(1)).await.unwrap();

        let err = checkout(&db, &cart, &ConfigState::default(), customer(), test_now())
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::CartChanged);
        // The cart now reflects the cut, so a second attempt goes through
        assert_eq!(cart.with_cart(|c| c.total_quantity()), 1);
        assert!(checkout(&db, &cart, &ConfigState::default(), customer(), test_now())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_expired_discount_is_not_blocking() {
        let db = seeded_db().await;
        let cart = memory_cart().await;
        add_to_cart(&db, &cart, "fridge-lg", 1, test_now())
            .await
            .unwrap();

        let later = test_now() + Duration::days(10);
        let result = checkout(&db, &cart, &ConfigState::default(), customer(), later)
            .await
            .unwrap();

        assert_eq!(result.price_changes.len(), 1);
        assert_eq!(result.order.total, Money::from_rubles(50_000));
    }

    #[tokio::test]
    async fn test_empty_cart_and_bad_contact() {
        let db = seeded_db().await;
        let cart = memory_cart().await;
        let config = ConfigState::default();

        let err = checkout(&db, &cart, &config, customer(), test_now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);

        add_to_cart(&db, &cart, "kettle", 1, test_now())
            .await
            .unwrap();
        let mut bad = customer();
        bad.phone = "12".to_string();
        let err = checkout(&db, &cart, &config, bad, test_now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(!cart.with_cart(|c| c.is_empty()));
    }
}
