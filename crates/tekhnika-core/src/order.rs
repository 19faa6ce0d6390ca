//! # Orders
//!
//! A checkout freezes the cart into an order. Lines keep the snapshot prices
//! from the cart, so later catalog edits never change what the customer
//! agreed to pay.
//!
//! ## Order Lifecycle
//! ```text
//!              confirm()             cancel()
//!   ┌──────┐ ───────────► ┌───────────┐ ───────────► ┌───────────┐
//!   │ New  │              │ Confirmed │              │ Cancelled │
//!   └──────┘ ─────────────────────────────────────►  └───────────┘
//!                            cancel()
//! ```
//!
//! No payment or delivery states: the storefront hands confirmed orders to
//! the back office by phone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{Cart, CartLine};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation;

// =============================================================================
// Order Status
// =============================================================================

/// The status of a storefront order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed by the customer, not yet called back.
    #[default]
    New,
    /// Confirmed with the customer.
    Confirmed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Checks whether an order may move from `self` to `to`.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        matches!(
            (self, to),
            (OrderStatus::New, OrderStatus::Confirmed)
                | (OrderStatus::New, OrderStatus::Cancelled)
                | (OrderStatus::Confirmed, OrderStatus::Cancelled)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(OrderStatus::New),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec![
                    "new".to_string(),
                    "confirmed".to_string(),
                    "cancelled".to_string(),
                ],
            }),
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Contact details from the checkout form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub comment: Option<String>,
}

impl CustomerInfo {
    /// Validates the form and returns a normalized copy.
    ///
    /// Trims every field, drops empty optional fields and normalizes the
    /// phone to `+<digits>`.
    pub fn validated(self) -> Result<CustomerInfo, ValidationError> {
        let name = self.name.trim().to_string();
        validation::validate_customer_name(&name)?;

        let phone = validation::normalize_phone(&self.phone)?;

        let email = non_empty(self.email);
        if let Some(email) = &email {
            validation::validate_email(email)?;
        }

        Ok(CustomerInfo {
            name,
            phone,
            email,
            address: non_empty(self.address),
            comment: non_empty(self.comment),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Order Line
// =============================================================================

/// A frozen cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: String,
    /// Product name at time of checkout (frozen).
    pub name: String,
    pub unit_price: Money,
    pub original_price: Money,
    pub quantity: i64,
    /// unit_price × quantity
    pub line_total: Money,
}

impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        OrderLine {
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            unit_price: line.unit_price,
            original_price: line.original_price,
            quantity: line.quantity,
            line_total: line.line_total(),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    /// Human-readable number read out over the phone (`TK-20241129-0001`).
    pub order_number: String,
    pub status: OrderStatus,
    pub customer: CustomerInfo,
    pub lines: Vec<OrderLine>,
    /// At original prices.
    pub subtotal: Money,
    pub savings: Money,
    pub total: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Freezes `cart` into a new order.
    ///
    /// The cart should already have been refreshed against the catalog; this
    /// function trusts its snapshots.
    ///
    /// ## Errors
    /// - `EmptyCart` when there is nothing to order
    /// - `Validation` when the contact form is invalid
    pub fn from_cart(
        cart: &Cart,
        customer: CustomerInfo,
        order_number: impl Into<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<Order> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let customer = customer.validated()?;
        let totals = cart.totals();

        Ok(Order {
            id: uuid::Uuid::new_v4().to_string(),
            order_number: order_number.into(),
            status: OrderStatus::New,
            customer,
            lines: cart.lines.iter().map(OrderLine::from).collect(),
            subtotal: totals.subtotal,
            savings: totals.savings,
            total: totals.total,
            created_at: now,
            updated_at: now,
        })
    }

    /// Moves the order to `to`, enforcing the lifecycle.
    pub fn transition(&mut self, to: OrderStatus, now: DateTime<Utc>) -> CoreResult<()> {
        if !self.status.can_transition_to(to) {
            return Err(CoreError::InvalidOrderTransition {
                order_id: self.id.clone(),
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }

        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

/// Formats an order number: `{prefix}-{YYYYMMDD}-{seq:04}`.
///
/// `seq` is the 1-based count of orders placed that day.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use tekhnika_core::order::format_order_number;
///
/// let now = Utc.with_ymd_and_hms(2024, 11, 29, 10, 0, 0).unwrap();
/// assert_eq!(format_order_number("TK", now, 7), "TK-20241129-0007");
/// ```
pub fn format_order_number(prefix: &str, now: DateTime<Utc>, seq: u32) -> String {
    format!("{}-{}-{:04}", prefix, now.format("%Y%m%d"), seq)
}

// =============================================================================
// Unit Tests
// =============================================================================
