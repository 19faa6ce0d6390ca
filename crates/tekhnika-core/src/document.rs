//! # Catalog Documents
//!
//! The JSON shapes served by the storefront API:
//!
//! - `GET /api/products`, `GET /api/products/:id` → [`ProductDocument`]
//! - `GET /api/product-categories` → [`CategoryDocument`]
//!
//! Documents use camelCase keys, accept `_id` for `id`, and carry prices as
//! decimal rubles. Percentage discounts arrive as whole or fractional
//! percent (`12.5`), fixed discounts as rubles. Conversion into domain types
//! goes through `TryFrom`, which is where validation happens.
//!
//! ```text
//!   JSON ──serde──► ProductDocument ──TryFrom──► Product
//!                        ▲                          │
//!                        └──────── From<&Product> ──┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Category, Discount, DiscountKind, Product};
use crate::validation;

// =============================================================================
// Discount Document
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountDocument {
    #[serde(rename = "type")]
    pub kind: String,

    /// Percent (`20`, `12.5`) or rubles, depending on `kind`.
    pub value: Decimal,

    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl TryFrom<DiscountDocument> for Discount {
    type Error = ValidationError;

    fn try_from(doc: DiscountDocument) -> Result<Self, Self::Error> {
        let kind: DiscountKind = doc.kind.parse()?;

        let out_of_range = || ValidationError::OutOfRange {
            field: "discount.value".to_string(),
            min: 0,
            max: i64::MAX,
        };

        let value = match kind {
            DiscountKind::Percentage => doc
                .value
                .checked_mul(Decimal::ONE_HUNDRED)
                .map(|bps| bps.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
                .and_then(|bps| bps.to_i64())
                .ok_or_else(out_of_range)?,
            DiscountKind::Fixed => Money::from_decimal(doc.value)
                .ok_or_else(out_of_range)?
                .kopecks(),
        };

        let discount = Discount {
            kind,
            value,
            starts_at: doc.start_date,
            ends_at: doc.end_date,
            is_active: doc.is_active,
        };
        validation::validate_discount(&discount)?;
        Ok(discount)
    }
}

impl From<&Discount> for DiscountDocument {
    fn from(discount: &Discount) -> Self {
        let value = match discount.kind {
            DiscountKind::Percentage => Decimal::new(discount.value, 2),
            DiscountKind::Fixed => Money::from_kopecks(discount.value).to_decimal(),
        };

        DiscountDocument {
            kind: discount.kind.as_str().to_string(),
            value: value.normalize(),
            start_date: discount.starts_at,
            end_date: discount.ends_at,
            is_active: discount.is_active,
        }
    }
}

// =============================================================================
// Product Document
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDocument {
    #[serde(alias = "_id")]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub brand: Option<String>,

    #[serde(default, alias = "category")]
    pub category_id: Option<String>,

    #[serde(default)]
    pub image_url: Option<String>,

    /// Gallery; the first entry stands in for `imageUrl` when that is absent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,

    pub price: Decimal,

    #[serde(default)]
    pub discount: Option<DiscountDocument>,

    #[serde(default)]
    pub stock_quantity: Option<i64>,

    #[serde(default)]
    pub min_stock_level: Option<i64>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProductDocument {
    /// Fills missing timestamps with `now`. Import calls this before conversion.
    pub fn stamp_missing(&mut self, now: DateTime<Utc>) {
        self.created_at.get_or_insert(now);
        let created_at = self.created_at;
        if self.updated_at.is_none() {
            self.updated_at = created_at;
        }
    }
}

impl TryFrom<ProductDocument> for Product {
    type Error = ValidationError;

    /// Missing timestamps become the Unix epoch; see
    /// [`ProductDocument::stamp_missing`].
    fn try_from(doc: ProductDocument) -> Result<Self, Self::Error> {
        if doc.id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "id".to_string(),
            });
        }
        validation::validate_product_name(&doc.name)?;

        let price = Money::from_decimal(doc.price).ok_or_else(|| ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        })?;
        validation::validate_price(price)?;

        if let Some(min) = doc.min_stock_level {
            validation::validate_stock_level("minStockLevel", min)?;
        }

        let discount = doc.discount.map(Discount::try_from).transpose()?;
        let image_url = doc.image_url.or_else(|| doc.images.into_iter().next());
        let created_at = doc.created_at.unwrap_or_default();

        Ok(Product {
            id: doc.id,
            name: doc.name.trim().to_string(),
            description: doc.description,
            brand: doc.brand,
            category_id: doc.category_id,
            image_url,
            price,
            discount,
            // Negative stock is kept as-is and reads as out of stock
            stock_quantity: doc.stock_quantity,
            min_stock_level: doc.min_stock_level,
            is_active: doc.is_active,
            created_at,
            updated_at: doc.updated_at.unwrap_or(created_at),
        })
    }
}

impl From<&Product> for ProductDocument {
    fn from(product: &Product) -> Self {
        ProductDocument {
            id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            brand: product.brand.clone(),
            category_id: product.category_id.clone(),
            image_url: product.image_url.clone(),
            images: Vec::new(),
            price: product.price.to_decimal(),
            discount: product.discount.as_ref().map(DiscountDocument::from),
            stock_quantity: product.stock_quantity,
            min_stock_level: product.min_stock_level,
            is_active: product.is_active,
            created_at: Some(product.created_at),
            updated_at: Some(product.updated_at),
        }
    }
}

// =============================================================================
// Category Document
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDocument {
    #[serde(alias = "_id")]
    pub id: String,

    pub name: String,

    /// Falls back to the id when absent.
    #[serde(default)]
    pub slug: Option<String>,

    #[serde(default, alias = "order")]
    pub sort_order: i64,
}

impl TryFrom<CategoryDocument> for Category {
    type Error = ValidationError;

    fn try_from(doc: CategoryDocument) -> Result<Self, Self::Error> {
        if doc.name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "name".to_string(),
            });
        }

        let slug = doc.slug.unwrap_or_else(|| doc.id.to_lowercase());
        validation::validate_slug(&slug)?;

        Ok(Category {
            id: doc.id,
            name: doc.name.trim().to_string(),
            slug,
            sort_order: doc.sort_order,
        })
    }
}

impl From<&Category> for CategoryDocument {
    fn from(category: &Category) -> Self {
        CategoryDocument {
            id: category.id.clone(),
            name: category.name.clone(),
            slug: Some(category.slug.clone()),
            sort_order: category.sort_order,
        }
    }
}

// =============================================================================
// Catalog Dump
// =============================================================================

/// A saved copy of the two catalog endpoints, used for imports.
///
/// Accepted shapes:
/// - `{ "products": [...], "categories": [...] }` (either key optional)
/// - a bare array of products, as returned by `GET /api/products`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDump {
    #[serde(default)]
    pub products: Vec<ProductDocument>,
    #[serde(default)]
    pub categories: Vec<CategoryDocument>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DumpShape {
    Products(Vec<ProductDocument>),
    Full(CatalogDump),
}

/// Parses a catalog dump in either accepted shape.
pub fn parse_catalog_dump(json: &str) -> Result<CatalogDump, serde_json::Error> {
    Ok(match serde_json::from_str::<DumpShape>(json)? {
        DumpShape::Products(products) => CatalogDump {
            products,
            categories: Vec::new(),
        },
        DumpShape::Full(dump) => dump,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::StockStatus;
    use chrono::TimeZone;

    const FRIDGE: &str = r#"{
        "_id": "65a1f0c2e4b0a1b2c3d4e5f6",
        "name": "Холодильник Atlant XM-4021",
        "brand": "Atlant",
        "category": "fridges",
        "images": ["/img/atlant-1.jpg", "/img/atlant-2.jpg"],
        "price": 34990.50,
        "discount": {
            "type": "percentage",
            "value": 12.5,
            "startDate": "2024-11-25T00:00:00Z",
            "endDate": "2024-12-01T23:59:59Z",
            "isActive": true
        },
        "stockQuantity": 4,
        "createdAt": "2024-01-15T09:30:00Z"
    }"#;

    #[test]
    fn test_product_document_conversion() {
        let doc: ProductDocument = serde_json::from_str(FRIDGE).unwrap();
        let product = Product::try_from(doc).unwrap();

        assert_eq!(product.id, "65a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(product.category_id.as_deref(), Some("fridges"));
        assert_eq!(product.image_url.as_deref(), Some("/img/atlant-1.jpg"));
        assert_eq!(product.price, Money::from_kopecks(3_499_050));
        assert_eq!(product.min_stock_level, None);
        assert_eq!(product.stock_status(), StockStatus::Low);
        assert!(product.is_active);
        assert_eq!(product.updated_at, product.created_at);

        let discount = product.discount.as_ref().unwrap();
        assert_eq!(discount.kind, DiscountKind::Percentage);
        assert_eq!(discount.value, 1250);

        let during_sale = Utc.with_ymd_and_hms(2024, 11, 29, 10, 0, 0).unwrap();
        assert_eq!(product.final_price(during_sale), Money::from_kopecks(3_061_669));
    }

    #[test]
    fn test_fixed_discount_in_rubles() {
        let doc = DiscountDocument {
            kind: "fixed".to_string(),
            value: Decimal::new(150_000, 2),
            start_date: None,
            end_date: None,
            is_active: true,
        };
        let discount = Discount::try_from(doc).unwrap();
        assert_eq!(discount.value, Money::from_rubles(1500).kopecks());
    }

    #[test]
    fn test_invalid_documents_rejected() {
        let mut doc: ProductDocument = serde_json::from_str(FRIDGE).unwrap();
        doc.price = Decimal::new(-1, 0);
        assert!(Product::try_from(doc).is_err());

        let mut doc: ProductDocument = serde_json::from_str(FRIDGE).unwrap();
        doc.discount.as_mut().unwrap().kind = "bogo".to_string();
        assert!(matches!(
            Product::try_from(doc),
            Err(ValidationError::NotAllowed { .. })
        ));

        let mut doc: ProductDocument = serde_json::from_str(FRIDGE).unwrap();
        doc.name = "".to_string();
        assert!(Product::try_from(doc).is_err());
        let mut doc: ProductDocument = serde_json::from_str(FRIDGE).unwrap();
        doc.price = Decimal::new(50_000_000_000_000_000, 0);
        assert!(matches!(
            Product::try_from(doc),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_product_document_from_product() {
        let doc: ProductDocument = serde_json::from_str(FRIDGE).unwrap();
        let product = Product::try_from(doc).unwrap();

        let json = serde_json::to_value(ProductDocument::from(&product)).unwrap();
        assert_eq!(json["id"], "65a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(json["categoryId"], "fridges");
        assert_eq!(json["discount"]["type"], "percentage");

        let back: ProductDocument = serde_json::from_value(json).unwrap();
        assert_eq!(Product::try_from(back).unwrap(), product);
    }

    #[test]
    fn test_stamp_missing() {
        let mut doc: ProductDocument =
            serde_json::from_str(r#"{"id": "k1", "name": "Чайник", "price": 1990}"#).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 11, 29, 10, 0, 0).unwrap();
        doc.stamp_missing(now);

        let product = Product::try_from(doc).unwrap();
        assert_eq!(product.created_at, now);
        assert_eq!(product.updated_at, now);
        assert_eq!(product.stock_quantity, None);
        assert_eq!(product.stock_status(), StockStatus::OutOfStock);
    }

    #[test]
    fn test_category_document() {
        let doc: CategoryDocument =
            serde_json::from_str(r#"{"_id": "fridges", "name": "Холодильники", "order": 2}"#)
                .unwrap();
        let category = Category::try_from(doc).unwrap();
        assert_eq!(category.slug, "fridges");
        assert_eq!(category.sort_order, 2);
    }

    #[test]
    fn test_parse_catalog_dump_shapes() {
        let bare = format!("[{}]", FRIDGE);
        let dump = parse_catalog_dump(&bare).unwrap();
        assert_eq!(dump.products.len(), 1);
        assert!(dump.categories.is_empty());

        let full = format!(
            r#"{{"products": [{}], "categories": [{{"_id": "fridges", "name": "Холодильники"}}]}}"#,
            FRIDGE
        );
        let dump = parse_catalog_dump(&full).unwrap();
        assert_eq!(dump.products.len(), 1);
        assert_eq!(dump.categories.len(), 1);

        assert!(parse_catalog_dump("42").is_err());
    }
}
