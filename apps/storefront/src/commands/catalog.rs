//! # Catalog Commands
//!
//! Product listing, detail and category navigation.
//!
//! ## Listing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  list_products({ category: "fridges", maxPrice: 50000, sort: ... })     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Resolve category slug ──► NOT_FOUND if unknown                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Load active products (of that category)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tekhnika_core::catalog::list_products                                 │
//! │    filter on effective price at `now`, sort, paginate                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductListing { items, total, page, perPage, totalPages }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{ConfigState, DbState};
use tekhnika_core::catalog::{
    self, Availability, Page, ProductFilter, ProductListing, ProductSummary, SortOrder,
};
use tekhnika_core::validation;
use tekhnika_core::{pricing, Category, Money, ValidationError};

/// Catalog query as sent by the front end. Prices are decimal rubles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    /// Category id or slug.
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub on_sale: bool,
    pub search: Option<String>,
    /// Falls back to the configured default.
    pub sort: Option<SortOrder>,
    pub page: Option<u32>,
    /// Falls back to the configured default.
    pub per_page: Option<u32>,
}

/// Full product view for the detail page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub summary: ProductSummary,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub on_sale: bool,
    /// Largest quantity the cart will accept right now.
    pub max_orderable: i64,
}

fn price_bound(field: &str, value: Option<Decimal>) -> Result<Option<Money>, ApiError> {
    match value {
        None => Ok(None),
        Some(v) if v.is_sign_negative() => Err(ValidationError::MustBePositive {
            field: field.to_string(),
        }
        .into()),
        Some(v) => Money::from_decimal(v).map(Some).ok_or_else(|| {
            ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: "amount is out of range".to_string(),
            }
            .into()
        }),
    }
}

/// Lists one page of the catalog.
pub async fn list_products(
    db: &DbState,
    config: &ConfigState,
    query: CatalogQuery,
    now: DateTime<Utc>,
) -> Result<ProductListing, ApiError> {
    let start = Instant::now();
    debug!(?query, "list_products command");

    let search = match query.search.as_deref() {
        Some(raw) => Some(validation::validate_search_query(raw)?).filter(|s| !s.is_empty()),
        None => None,
    };

    let category_id = match query.category.as_deref() {
        Some(key) => {
            let category = db
                .inner()
                .categories()
                .find(key)
                .await?
                .ok_or_else(|| ApiError::not_found("Category", key))?;
            Some(category.id)
        }
        None => None,
    };

    let filter = ProductFilter {
        min_price: price_bound("minPrice", query.min_price)?,
        max_price: price_bound("maxPrice", query.max_price)?,
        availability: query.availability,
        on_sale_only: query.on_sale,
        search,
        category_id: category_id.clone(),
    };

    let products = match &category_id {
        Some(id) => db.inner().products().list_by_category(id).await?,
        None => db.inner().products().list_active().await?,
    };

    let sort = query.sort.unwrap_or(config.catalog.default_sort);
    let page = Page::new(
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(config.catalog.per_page),
    );

    let listing = catalog::list_products(&products, &filter, sort, page, now);

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        scanned = products.len(),
        total = listing.total,
        "list_products complete"
    );

    Ok(listing)
}

/// Gets a listed product with its price breakdown.
///
/// Unlisted products are reported as not found.
pub async fn get_product(
    db: &DbState,
    id: &str,
    now: DateTime<Utc>,
) -> Result<ProductDetail, ApiError> {
    debug!(id = %id, "get_product command");

    let product = db
        .inner()
        .products()
        .get_by_id(id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    let category = match &product.category_id {
        Some(category_id) => db.inner().categories().find(category_id).await?,
        None => None,
    };

    Ok(ProductDetail {
        summary: ProductSummary::from_product(&product, now),
        description: product.description.clone(),
        category,
        on_sale: pricing::is_on_sale(&product, now),
        max_orderable: product
            .available_quantity()
            .min(tekhnika_core::MAX_ITEM_QUANTITY),
    })
}

/// Lists categories in menu order.
pub async fn list_categories(db: &DbState) -> Result<Vec<Category>, ApiError> {
    debug!("list_categories command");
    Ok(db.inner().categories().list().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{seeded_db, test_now};
    use tekhnika_core::StockStatus;

    #[tokio::test]
    async fn test_list_by_category_slug() {
        let db = seeded_db().await;
        let config = ConfigState::default();

        let listing = list_products(
            &db,
            &config,
            CatalogQuery {
                category: Some("fridges".to_string()),
                sort: Some(SortOrder::PriceAsc),
                ..Default::default()
            },
            test_now(),
        )
        .await
        .unwrap();

        assert_eq!(listing.total, 2);
        assert!(listing
            .items
            .iter()
            .all(|p| p.category_id.as_deref() == Some("fridges")));
        assert!(listing.items[0].price.final_price <= listing.items[1].price.final_price);
    }

    #[tokio::test]
    async fn test_unknown_category_is_not_found() {
        let db = seeded_db().await;
        let err = list_products(
            &db,
            &ConfigState::default(),
            CatalogQuery {
                category: Some("tv".to_string()),
                ..Default::default()
            },
            test_now(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, crate::error::ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_price_filter_uses_sale_price() {
        let db = seeded_db().await;

        // The fridge at 50 000 is 20% off, so it fits under 45 000
        let listing = list_products(
            &db,
            &ConfigState::default(),
            CatalogQuery {
                max_price: Some(Decimal::new(45_000, 0)),
                category: Some("fridges".to_string()),
                ..Default::default()
            },
            test_now(),
        )
        .await
        .unwrap();

        assert_eq!(listing.total, 2);
        let sale = listing.items.iter().find(|p| p.id == "fridge-lg").unwrap();
        assert_eq!(sale.price.final_price, Money::from_rubles(40_000));
    }

    #[tokio::test]
    async fn test_negative_price_bound_rejected() {
        let db = seeded_db().await;
        let err = list_products(
            &db,
            &ConfigState::default(),
            CatalogQuery {
                min_price: Some(Decimal::new(-1, 0)),
                ..Default::default()
            },
            test_now(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, crate::error::ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_product_detail() {
        let db = seeded_db().await;
        let detail = get_product(&db, "fridge-lg", test_now()).await.unwrap();

        assert!(detail.on_sale);
        assert_eq!(detail.summary.price.percent_off, 20);
        assert_eq!(detail.category.unwrap().slug, "fridges");

        let kettle = get_product(&db, "kettle", test_now()).await.unwrap();
        assert_eq!(kettle.summary.stock_status, StockStatus::Low);
        assert_eq!(kettle.max_orderable, 2);
    }

    #[tokio::test]
    async fn test_unlisted_product_not_found() {
        let db = seeded_db().await;
        db.inner().products().soft_delete("kettle").await.unwrap();

        assert!(get_product(&db, "kettle", test_now()).await.is_err());
    }
}
