//! # Validation Module
//!
//! Input validation for admin edits, imported documents and checkout forms.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Front end                                                    │
//! │  ├── Form masks (phone, email)                                         │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Storefront commands (Rust)                                   │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tekhnika_core::validation::{normalize_phone, validate_quantity};
//!
//! assert_eq!(normalize_phone("+7 (912) 345-67-89").unwrap(), "+79123456789");
//! assert!(validate_quantity(3).is_ok());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Discount, DiscountKind};
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_KOPECKS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Product Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a base price. Zero is allowed (promo items); negative prices
/// and prices above [`MAX_PRICE_KOPECKS`] are not.
///
/// ## Example
/// ```rust
/// use tekhnika_core::money::Money;
/// use tekhnika_core::validation::validate_price;
///
/// assert!(validate_price(Money::from_rubles(24_990)).is_ok());
/// assert!(validate_price(Money::zero()).is_ok());
/// assert!(validate_price(Money::from_kopecks(-1)).is_err());
/// assert!(validate_price(Money::from_rubles(500_000_000)).is_err());
/// ```
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_KOPECKS).contains(&price.kopecks()) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_KOPECKS,
        });
    }

    Ok(())
}

/// Validates a stock quantity or threshold as set by the back office.
pub fn validate_stock_level(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount definition.
///
/// ## Rules
/// - Percentage: 0 to 10000 basis points (0% to 100%)
/// - Fixed: non-negative amount
/// - If both bounds are set, start must not be after end
pub fn validate_discount(discount: &Discount) -> ValidationResult<()> {
    match discount.kind {
        DiscountKind::Percentage => {
            if !(0..=10_000).contains(&discount.value) {
                return Err(ValidationError::OutOfRange {
                    field: "discount.value".to_string(),
                    min: 0,
                    max: 10_000,
                });
            }
        }
        DiscountKind::Fixed => {
            if !(0..=MAX_PRICE_KOPECKS).contains(&discount.value) {
                return Err(ValidationError::OutOfRange {
                    field: "discount.value".to_string(),
                    min: 0,
                    max: MAX_PRICE_KOPECKS,
                });
            }
        }
    }

    if let (Some(starts_at), Some(ends_at)) = (discount.starts_at, discount.ends_at) {
        if starts_at > ends_at {
            return Err(ValidationError::InvalidFormat {
                field: "discount.endDate".to_string(),
                reason: "must not be before startDate".to_string(),
            });
        }
    }

    Ok(())
}

/// Validates a category slug: lowercase ASCII letters, digits and hyphens.
pub fn validate_slug(slug: &str) -> ValidationResult<()> {
    if slug.is_empty() {
        return Err(ValidationError::Required {
            field: "slug".to_string(),
        });
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "slug".to_string(),
            reason: "must contain only lowercase letters, digits and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query and returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Cart Validators
// =============================================================================

/// Validates a requested line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
///
/// Stock limits are checked separately by the cart itself.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Customer Validators
// =============================================================================

/// Validates the customer name on the checkout form.
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    let len = name.chars().count();
    if len < 2 {
        return Err(ValidationError::TooShort {
            field: "name".to_string(),
            min: 2,
        });
    }
    if len > 100 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 100,
        });
    }

    Ok(())
}

/// Normalizes a phone number to `+<digits>`.
///
/// Spaces, dashes, dots and parentheses are dropped. A leading `8` on an
/// eleven-digit number is the domestic trunk prefix and becomes `+7`.
///
/// ## Rules
/// - 10 to 15 digits after normalization
pub fn normalize_phone(phone: &str) -> ValidationResult<String> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    let mut digits = String::with_capacity(phone.len());
    for (i, c) in phone.chars().enumerate() {
        match c {
            '0'..='9' => digits.push(c),
            '+' if i == 0 => {}
            ' ' | '-' | '(' | ')' | '.' => {}
            _ => {
                return Err(ValidationError::InvalidFormat {
                    field: "phone".to_string(),
                    reason: format!("unexpected character '{}'", c),
                })
            }
        }
    }

    if !(10..=15).contains(&digits.len()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain 10 to 15 digits".to_string(),
        });
    }

    if digits.len() == 11 && digits.starts_with('8') && !phone.starts_with('+') {
        digits.replace_range(0..1, "7");
    }

    Ok(format!("+{}", digits))
}

/// Validates an optional email address (a single `@` with a dotted domain).
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must look like name@example.com".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }

    Ok(())
}
