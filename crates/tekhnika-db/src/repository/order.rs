//! # Order Repository
//!
//! Stores placed orders and their frozen lines.
//!
//! ## Checkout Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert(order)                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │    INSERT INTO orders       (1 row)                                     │
//! │    INSERT INTO order_items  (1 row per line, position = line index)     │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure rolls back: an order never exists without its lines.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use tekhnika_core::{CustomerInfo, Money, Order, OrderLine, OrderStatus};

#[derive(Debug, Clone, FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    status: OrderStatus,
    customer_name: String,
    customer_phone: String,
    customer_email: Option<String>,
    delivery_address: Option<String>,
    comment: Option<String>,
    subtotal_kopecks: i64,
    savings_kopecks: i64,
    total_kopecks: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct OrderItemRow {
    product_id: String,
    name_snapshot: String,
    unit_price_kopecks: i64,
    original_price_kopecks: i64,
    quantity: i64,
    line_total_kopecks: i64,
}

impl From<OrderItemRow> for OrderLine {
    fn from(row: OrderItemRow) -> Self {
        OrderLine {
            product_id: row.product_id,
            name: row.name_snapshot,
            unit_price: Money::from_kopecks(row.unit_price_kopecks),
            original_price: Money::from_kopecks(row.original_price_kopecks),
            quantity: row.quantity,
            line_total: Money::from_kopecks(row.line_total_kopecks),
        }
    }
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> Order {
        Order {
            id: self.id,
            order_number: self.order_number,
            status: self.status,
            customer: CustomerInfo {
                name: self.customer_name,
                phone: self.customer_phone,
                email: self.customer_email,
                address: self.delivery_address,
                comment: self.comment,
            },
            lines,
            subtotal: Money::from_kopecks(self.subtotal_kopecks),
            savings: Money::from_kopecks(self.savings_kopecks),
            total: Money::from_kopecks(self.total_kopecks),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// An order without its lines, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub customer_name: String,
    pub customer_phone: String,
    pub total: Money,
    pub created_at: DateTime<Utc>,
}

impl From<OrderRow> for OrderSummary {
    fn from(row: OrderRow) -> Self {
        OrderSummary {
            id: row.id,
            order_number: row.order_number,
            status: row.status,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            total: Money::from_kopecks(row.total_kopecks),
            created_at: row.created_at,
        }
    }
}

const ORDER_COLUMNS: &str = r#"
    id, order_number, status, customer_name, customer_phone, customer_email,
    delivery_address, comment, subtotal_kopecks, savings_kopecks, total_kopecks,
    created_at, updated_at
"#;

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order with all its lines in one transaction.
    pub async fn insert(&self, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, order_number = %order.order_number, "Inserting order");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, status, customer_name, customer_phone, customer_email,
                delivery_address, comment, subtotal_kopecks, savings_kopecks, total_kopecks,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(order.status)
        .bind(&order.customer.name)
        .bind(&order.customer.phone)
        .bind(&order.customer.email)
        .bind(&order.customer.address)
        .bind(&order.customer.comment)
        .bind(order.subtotal.kopecks())
        .bind(order.savings.kopecks())
        .bind(order.total.kopecks())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for (position, line) in order.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_id, position, product_id, name_snapshot,
                    unit_price_kopecks, original_price_kopecks, quantity, line_total_kopecks
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&order.id)
            .bind(position as i64)
            .bind(&line.product_id)
            .bind(&line.name)
            .bind(line.unit_price.kopecks())
            .bind(line.original_price.kopecks())
            .bind(line.quantity)
            .bind(line.line_total.kopecks())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            order_number = %order.order_number,
            lines = order.lines.len(),
            total = %order.total,
            "Order stored"
        );
        Ok(())
    }

    /// Gets an order with its lines.
    pub async fn get(&self, id: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS);
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let lines = self.lines(&row.id).await?;
                Ok(Some(row.into_order(lines)))
            }
            None => Ok(None),
        }
    }

    /// Gets an order by its human-readable number.
    pub async fn get_by_number(&self, order_number: &str) -> DbResult<Option<Order>> {
        let id: Option<String> =
            sqlx::query_scalar("SELECT id FROM orders WHERE order_number = ?1")
                .bind(order_number)
                .fetch_optional(&self.pool)
                .await?;

        match id {
            Some(id) => self.get(&id).await,
            None => Ok(None),
        }
    }

    async fn lines(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT product_id, name_snapshot, unit_price_kopecks, original_price_kopecks,
                   quantity, line_total_kopecks
            FROM order_items
            WHERE order_id = ?1
            ORDER BY position
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderLine::from).collect())
    }

    /// Lists the most recent orders, newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<OrderSummary>> {
        let sql = format!(
            "SELECT {} FROM orders ORDER BY created_at DESC LIMIT ?1",
            ORDER_COLUMNS
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(OrderSummary::from).collect())
    }

    /// Stores a status change. Lifecycle rules are checked by the caller
    /// through `Order::transition`.
    pub async fn update_status(
        &self,
        id: &str,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(id = %id, status = %status, "Updating order status");

        let result = sqlx::query("UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(updated_at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }

    /// Next 1-based order sequence number for the UTC day containing `now`.
    pub async fn next_daily_sequence(&self, now: DateTime<Utc>) -> DbResult<u32> {
        let day_start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let day_end = day_start + Duration::days(1);

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE created_at >= ?1 AND created_at < ?2",
        )
        .bind(day_start)
        .bind(day_end)
        .fetch_one(&self.pool)
        .await?;

        Ok(count as u32 + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::TimeZone;
    use tekhnika_core::{Cart, Product};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 29, 10, 0, 0).unwrap()
    }

    fn order(number: &str, at: DateTime<Utc>) -> Order {
        let mut cart = Cart::new();
        let kettle = Product::new("kettle", "Чайник", Money::from_rubles(2_000)).with_stock(5);
        let iron = Product::new("iron", "Утюг", Money::from_rubles(3_000)).with_stock(5);
        cart.add_product(&kettle, 2, at).unwrap();
        cart.add_product(&iron, 1, at).unwrap();

        let customer = CustomerInfo {
            name: "Анна".to_string(),
            phone: "+79123456789".to_string(),
            email: None,
            address: None,
            comment: Some("Позвонить после 18:00".to_string()),
        };
        Order::from_cart(&cart, customer, number, at).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = order("TK-20241129-0001", now());

        db.orders().insert(&order).await.unwrap();

        let loaded = db.orders().get(&order.id).await.unwrap().unwrap();
        assert_eq!(loaded, order);
        assert_eq!(loaded.lines[0].product_id, "kettle");

        let by_number = db
            .orders()
            .get_by_number("TK-20241129-0001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_number.id, order.id);
    }

    #[tokio::test]
    async fn test_duplicate_order_number_rolls_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.orders().insert(&order("TK-1", now())).await.unwrap();

        let dup = order("TK-1", now());
        assert!(matches!(
            db.orders().insert(&dup).await,
            Err(DbError::UniqueViolation { .. })
        ));
        assert!(db.orders().get(&dup.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_status() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = order("TK-1", now());
        db.orders().insert(&order).await.unwrap();

        db.orders()
            .update_status(&order.id, OrderStatus::Confirmed, now())
            .await
            .unwrap();
        let loaded = db.orders().get(&order.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::Confirmed);

        assert!(db
            .orders()
            .update_status("missing", OrderStatus::Cancelled, now())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_daily_sequence_and_listing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert_eq!(db.orders().next_daily_sequence(now()).await.unwrap(), 1);

        let yesterday = now() - Duration::days(1);
        db.orders().insert(&order("TK-A", yesterday)).await.unwrap();
        db.orders().insert(&order("TK-B", now())).await.unwrap();

        assert_eq!(db.orders().next_daily_sequence(now()).await.unwrap(), 2);

        let recent = db.orders().list_recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].order_number, "TK-B");
        assert_eq!(recent[0].total, Money::from_rubles(7_000));
    }
}
