//! # Product Repository
//!
//! Database operations for the catalog cache.
//!
//! ## Key Operations
//! - Catalog reads (active listing, single product, batch by id)
//! - Upsert from storefront API documents
//! - Back-office edits: stock, discount, soft delete
//!
//! ## Row Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products                                                               │
//! │                                                                         │
//! │  id | name | ... | price_kopecks | discount_* (5 cols) | stock_quantity │
//! │                                         │                               │
//! │                                         ▼                               │
//! │  ProductRow ──From──► Product { discount: Option<Discount>, .. }        │
//! │                                                                         │
//! │  discount_kind IS NULL        → no discount                             │
//! │  stock_quantity IS NULL       → unknown stock (reads as out of stock)   │
//! │  min_stock_level IS NULL      → default low-stock threshold             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use tekhnika_core::document::ProductDocument;
use tekhnika_core::validation;
use tekhnika_core::{Discount, DiscountKind, Money, Product};

const PRODUCT_COLUMNS: &str = r#"
    id, name, description, brand, category_id, image_url, price_kopecks,
    discount_kind, discount_value, discount_starts_at, discount_ends_at, discount_is_active,
    stock_quantity, min_stock_level, is_active, created_at, updated_at
"#;

/// A `products` row as stored.
#[derive(Debug, Clone, FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: Option<String>,
    brand: Option<String>,
    category_id: Option<String>,
    image_url: Option<String>,
    price_kopecks: i64,
    discount_kind: Option<DiscountKind>,
    discount_value: Option<i64>,
    discount_starts_at: Option<DateTime<Utc>>,
    discount_ends_at: Option<DateTime<Utc>>,
    discount_is_active: Option<bool>,
    stock_quantity: Option<i64>,
    min_stock_level: Option<i64>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        // A kind without a value is a half-written discount; treat it as none
        let discount = match (row.discount_kind, row.discount_value) {
            (Some(kind), Some(value)) => Some(Discount {
                kind,
                value,
                starts_at: row.discount_starts_at,
                ends_at: row.discount_ends_at,
                is_active: row.discount_is_active.unwrap_or(false),
            }),
            _ => None,
        };

        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            brand: row.brand,
            category_id: row.category_id,
            image_url: row.image_url,
            price: Money::from_kopecks(row.price_kopecks),
            discount,
            stock_quantity: row.stock_quantity,
            min_stock_level: row.min_stock_level,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Outcome of a catalog import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub products_imported: usize,
    pub categories_imported: usize,
    /// Documents that failed validation, as `(id, reason)`.
    pub rejected: Vec<(String, String)>,
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let catalog = repo.list_active().await?;
/// let fridge = repo.get_by_id("fridge-1").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists listed products, sorted by name.
    ///
    /// Filtering and sorting for the catalog page happen in
    /// `tekhnika_core::catalog`, which needs the effective price at "now".
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE is_active = 1 ORDER BY name",
            PRODUCT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Loaded active products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Lists every product including soft-deleted ones (back office).
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {} FROM products ORDER BY name", PRODUCT_COLUMNS);
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Gets a product by its ID, listed or not.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Gets several products at once (cart refresh). Unknown ids are skipped.
    pub async fn get_many(&self, ids: &[String]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM products WHERE id IN (", PRODUCT_COLUMNS));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let rows = builder
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Lists listed products in one category.
    pub async fn list_by_category(&self, category_id: &str) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE is_active = 1 AND category_id = ?1 ORDER BY name",
            PRODUCT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(category_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Inserts a product, or replaces every field except `created_at` if the
    /// id already exists.
    pub async fn upsert(&self, product: &Product) -> DbResult<()> {
        validate_product(product)?;
        debug!(id = %product.id, "Upserting product");

        upsert_with(&self.pool, product).await
    }

    /// Sets the stock level (absolute, for back-office corrections).
    ///
    /// `None` marks the stock as unknown.
    pub async fn set_stock(&self, id: &str, stock_quantity: Option<i64>) -> DbResult<()> {
        if let Some(quantity) = stock_quantity {
            validation::validate_stock_level("stockQuantity", quantity)?;
        }
        debug!(id = %id, stock_quantity = ?stock_quantity, "Setting stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(stock_quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Attaches or replaces the product's discount.
    pub async fn set_discount(&self, id: &str, discount: &Discount) -> DbResult<()> {
        validation::validate_discount(discount)?;
        debug!(id = %id, kind = %discount.kind, value = discount.value, "Setting discount");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                discount_kind = ?2,
                discount_value = ?3,
                discount_starts_at = ?4,
                discount_ends_at = ?5,
                discount_is_active = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(discount.kind)
        .bind(discount.value)
        .bind(discount.starts_at)
        .bind(discount.ends_at)
        .bind(discount.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Removes the product's discount.
    pub async fn clear_discount(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Clearing discount");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                discount_kind = NULL,
                discount_value = NULL,
                discount_starts_at = NULL,
                discount_ends_at = NULL,
                discount_is_active = NULL,
                updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Orders keep their own snapshot of the product, and carts drop the line
    /// on their next refresh.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET is_active = 0, updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts listed products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Imports product documents in a single transaction.
    ///
    /// Invalid documents are skipped and reported; valid ones are upserted.
    /// Missing timestamps are filled with `now`.
    pub async fn import(
        &self,
        documents: Vec<ProductDocument>,
        now: DateTime<Utc>,
    ) -> DbResult<ImportReport> {
        let mut report = ImportReport::default();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for mut document in documents {
            document.stamp_missing(now);
            let id = document.id.clone();

            let product = match Product::try_from(document) {
                Ok(product) => product,
                Err(e) => {
                    warn!(id = %id, error = %e, "Skipping invalid product document");
                    report.rejected.push((id, e.to_string()));
                    continue;
                }
            };

            upsert_with(&mut *tx, &product).await?;
            report.products_imported += 1;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            imported = report.products_imported,
            rejected = report.rejected.len(),
            "Product import complete"
        );
        Ok(report)
    }
}

fn validate_product(product: &Product) -> DbResult<()> {
    validation::validate_product_name(&product.name)?;
    validation::validate_price(product.price)?;
    if let Some(min) = product.min_stock_level {
        validation::validate_stock_level("minStockLevel", min)?;
    }
    if let Some(discount) = &product.discount {
        validation::validate_discount(discount)?;
    }
    Ok(())
}

async fn upsert_with<'e, E>(executor: E, product: &Product) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let discount = product.discount.as_ref();

    sqlx::query(
        r#"
        INSERT INTO products (
            id, name, description, brand, category_id, image_url, price_kopecks,
            discount_kind, discount_value, discount_starts_at, discount_ends_at, discount_is_active,
            stock_quantity, min_stock_level, is_active, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7,
            ?8, ?9, ?10, ?11, ?12,
            ?13, ?14, ?15, ?16, ?17
        )
        ON CONFLICT (id) DO UPDATE SET
            name = excluded.name,
            description = excluded.description,
            brand = excluded.brand,
            category_id = excluded.category_id,
            image_url = excluded.image_url,
            price_kopecks = excluded.price_kopecks,
            discount_kind = excluded.discount_kind,
            discount_value = excluded.discount_value,
            discount_starts_at = excluded.discount_starts_at,
            discount_ends_at = excluded.discount_ends_at,
            discount_is_active = excluded.discount_is_active,
            stock_quantity = excluded.stock_quantity,
            min_stock_level = excluded.min_stock_level,
            is_active = excluded.is_active,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(&product.brand)
    .bind(&product.category_id)
    .bind(&product.image_url)
    .bind(product.price.kopecks())
    .bind(discount.map(|d| d.kind))
    .bind(discount.map(|d| d.value))
    .bind(discount.and_then(|d| d.starts_at))
    .bind(discount.and_then(|d| d.ends_at))
    .bind(discount.map(|d| d.is_active))
    .bind(product.stock_quantity)
    .bind(product.min_stock_level)
    .bind(product.is_active)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
