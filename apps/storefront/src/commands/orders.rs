//! # Order Commands
//!
//! Order history and back-office status changes.
//!
//! ## Order Lifecycle
//! ```text
//!   ┌───────┐   confirm   ┌───────────┐
//!   │  new  │────────────►│ confirmed │
//!   └───┬───┘             └─────┬─────┘
//!       │ cancel                │ cancel
//!       ▼                       ▼
//!   ┌─────────────────────────────────┐
//!   │            cancelled            │
//!   └─────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::DbState;
use tekhnika_core::{Order, OrderStatus};
use tekhnika_db::OrderSummary;

/// Default and maximum page size of the order list.
pub const DEFAULT_ORDER_LIMIT: u32 = 50;
pub const MAX_ORDER_LIMIT: u32 = 500;

/// Lists recent orders, newest first.
pub async fn list_orders(db: &DbState, limit: Option<u32>) -> Result<Vec<OrderSummary>, ApiError> {
    let limit = limit.unwrap_or(DEFAULT_ORDER_LIMIT).clamp(1, MAX_ORDER_LIMIT);
    debug!(limit, "list_orders command");

    Ok(db.inner().orders().list_recent(limit).await?)
}

/// Gets an order by id or by order number.
pub async fn get_order(db: &DbState, id_or_number: &str) -> Result<Order, ApiError> {
    debug!(key = %id_or_number, "get_order command");

    let orders = db.inner().orders();
    if let Some(order) = orders.get(id_or_number).await? {
        return Ok(order);
    }

    orders
        .get_by_number(id_or_number)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", id_or_number))
}

/// Moves an order to `status`, enforcing the lifecycle.
pub async fn update_order_status(
    db: &DbState,
    id_or_number: &str,
    status: OrderStatus,
    now: DateTime<Utc>,
) -> Result<Order, ApiError> {
    let mut order = get_order(db, id_or_number).await?;
    let from = order.status;

    order.transition(status, now)?;
    db.inner()
        .orders()
        .update_status(&order.id, order.status, order.updated_at)
        .await?;

    info!(
        order_number = %order.order_number,
        from = %from,
        to = %status,
        "Order status changed"
    );
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::add_to_cart;
    use crate::commands::checkout::checkout;
    use crate::commands::test_support::{memory_cart, seeded_db, test_now};
    use crate::error::ErrorCode;
    use crate::state::ConfigState;
    use tekhnika_core::CustomerInfo;

    async fn place_order(db: &DbState) -> Order {
        let cart = memory_cart().await;
        add_to_cart(db, &cart, "kettle", 1, test_now()).await.unwrap();
        let customer = CustomerInfo {
            name: "Мария".to_string(),
            phone: "+7 912 000 11 22".to_string(),
            email: None,
            address: None,
            comment: None,
        };
        checkout(db, &cart, &ConfigState::default(), customer, test_now())
            .await
            .unwrap()
            .order
    }

    #[tokio::test]
    async fn test_lookup_by_id_and_number() {
        let db = seeded_db().await;
        let order = place_order(&db).await;

        assert_eq!(get_order(&db, &order.id).await.unwrap().id, order.id);
        assert_eq!(
            get_order(&db, &order.order_number).await.unwrap().id,
            order.id
        );
        assert_eq!(
            get_order(&db, "TK-19990101-0001").await.unwrap_err().code,
            ErrorCode::NotFound
        );

        let list = list_orders(&db, None).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].order_number, order.order_number);
    }

    #[tokio::test]
    async fn test_status_lifecycle() {
        let db = seeded_db().await;
        let order = place_order(&db).await;

        let confirmed = update_order_status(&db, &order.order_number, OrderStatus::Confirmed, test_now())
            .await
            .unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);

        let cancelled = update_order_status(&db, &order.id, OrderStatus::Cancelled, test_now())
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let err = update_order_status(&db, &order.id, OrderStatus::Confirmed, test_now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        let stored = get_order(&db, &order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Cancelled);
    }
}
