//! # Admin Commands
//!
//! Back-office product maintenance and catalog import.
//!
//! | Command          | Effect                                          |
//! |------------------|-------------------------------------------------|
//! | `set_stock`      | Absolute stock correction (`None` = unknown)    |
//! | `set_discount`   | Replace the product's discount                  |
//! | `clear_discount` | Remove the discount                             |
//! | `deactivate`     | Unlist the product (soft delete)                |
//! | `import_catalog` | Upsert categories and products from a JSON dump |

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::DbState;
use tekhnika_core::document::{parse_catalog_dump, DiscountDocument};
use tekhnika_core::{Discount, Product, ValidationError};

/// Import outcome.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub categories_imported: usize,
    pub products_imported: usize,
    /// `(id, reason)` of every document that was skipped.
    pub rejected: Vec<(String, String)>,
}

async fn load_product(db: &DbState, id: &str) -> Result<Product, ApiError> {
    db.inner()
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))
}

/// Sets the stock of a product.
pub async fn set_stock(
    db: &DbState,
    product_id: &str,
    stock_quantity: Option<i64>,
) -> Result<Product, ApiError> {
    debug!(product_id = %product_id, ?stock_quantity, "set_stock command");

    db.inner()
        .products()
        .set_stock(product_id, stock_quantity)
        .await?;

    info!(product_id = %product_id, ?stock_quantity, "Stock corrected");
    load_product(db, product_id).await
}

/// Replaces the discount of a product. The discount arrives in its wire
/// form: percent or rubles as decimals.
pub async fn set_discount(
    db: &DbState,
    product_id: &str,
    document: DiscountDocument,
) -> Result<Product, ApiError> {
    debug!(product_id = %product_id, kind = %document.kind, "set_discount command");

    let discount = Discount::try_from(document)?;
    db.inner()
        .products()
        .set_discount(product_id, &discount)
        .await?;

    info!(
        product_id = %product_id,
        kind = %discount.kind,
        value = discount.value,
        "Discount set"
    );
    load_product(db, product_id).await
}

/// Removes the discount of a product.
pub async fn clear_discount(db: &DbState, product_id: &str) -> Result<Product, ApiError> {
    debug!(product_id = %product_id, "clear_discount command");

    db.inner().products().clear_discount(product_id).await?;
    load_product(db, product_id).await
}

/// Unlists a product. Carts drop it on their next refresh.
pub async fn deactivate(db: &DbState, product_id: &str) -> Result<Product, ApiError> {
    debug!(product_id = %product_id, "deactivate command");

    db.inner().products().soft_delete(product_id).await?;
    info!(product_id = %product_id, "Product unlisted");
    load_product(db, product_id).await
}

/// Imports a catalog dump: `{"categories": [...], "products": [...]}` or a
/// bare array of products.
///
/// Categories go first so products can reference them. Invalid documents are
/// skipped and listed in the summary.
pub async fn import_catalog(
    db: &DbState,
    json: &str,
    now: DateTime<Utc>,
) -> Result<ImportSummary, ApiError> {
    let dump = parse_catalog_dump(json).map_err(|e| {
        ApiError::from(ValidationError::InvalidFormat {
            field: "catalog".to_string(),
            reason: e.to_string(),
        })
    })?;
    debug!(
        categories = dump.categories.len(),
        products = dump.products.len(),
        "import_catalog command"
    );

    let (categories_imported, mut rejected) =
        db.inner().categories().import(dump.categories).await?;
    let report = db.inner().products().import(dump.products, now).await?;
    rejected.extend(report.rejected);

    info!(
        categories = categories_imported,
        products = report.products_imported,
        rejected = rejected.len(),
        "Catalog imported"
    );

    Ok(ImportSummary {
        categories_imported,
        products_imported: report.products_imported,
        rejected,
    })
}
