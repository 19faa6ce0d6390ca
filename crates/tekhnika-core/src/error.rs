//! # Error Types
//!
//! Domain-specific error types for tekhnika-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tekhnika-core errors (this file)                                      │
//! │  ├── CoreError        - Cart, stock and order rule violations          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tekhnika-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Storefront errors (in app)                                            │
//! │  └── ApiError         - What the front end sees (serialized)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Front end               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pricing and stock classification never fail; only the cart guards,
//! document conversion and checkout produce these errors.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Product id is unknown to the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but is no longer listed.
    #[error("Product {0} is not available for sale")]
    ProductUnavailable(String),

    /// Product has no stock at all.
    ///
    /// ## User Workflow
    /// ```text
    /// "В корзину" on a card with stock 0 (or unknown)
    ///      │
    ///      ▼
    /// OutOfStock { name: "Atlant XM-4021" }
    ///      │
    ///      ▼
    /// Cart unchanged, UI shows "Нет в наличии"
    /// ```
    #[error("{name} is out of stock")]
    OutOfStock { name: String },

    /// Requested quantity exceeds the stock captured for the line.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart line qty 2, stock 2, user presses "+"
    ///      │
    ///      ▼
    /// InsufficientStock { name, available: 2, requested: 3 }
    ///      │
    ///      ▼
    /// Line keeps qty 2, UI shows "Доступно только 2 шт."
    /// ```
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Operation targets a product that is not in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(String),

    /// Cart already holds the maximum number of distinct lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Quantity exceeds the per-line ceiling.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Checkout attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Order status change not allowed from the current status.
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidOrderTransition {
        order_id: String,
        from: String,
        to: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before business logic runs: customer forms, admin edits and
/// documents coming from the storefront API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid phone, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            name: "Atlant XM-4021".to_string(),
            available: 2,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Atlant XM-4021: available 2, requested 3"
        );

        let err = CoreError::OutOfStock {
            name: "Bosch WAN24".to_string(),
        };
        assert_eq!(err.to_string(), "Bosch WAN24 is out of stock");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "phone".to_string(),
        };
        assert_eq!(err.to_string(), "phone is required");

        let err = ValidationError::TooShort {
            field: "name".to_string(),
            min: 2,
        };
        assert_eq!(err.to_string(), "name must be at least 2 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
