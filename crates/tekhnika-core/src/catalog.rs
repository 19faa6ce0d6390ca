//! # Catalog Listing
//!
//! Filtering, sorting and paging for the catalog page. Works on products
//! already loaded from the store; every price comparison uses the effective
//! price at the given `now`, so a 20%-off fridge shows up under the price it
//! actually sells for.
//!
//! ```text
//!   products ──► filter ──► sort ──► page ──► ProductListing
//!                  │          │        │
//!                  │          │        └── page (1-based), per_page
//!                  │          └── Featured | PriceAsc | PriceDesc | Name | Newest | DiscountDesc
//!                  └── category, price range, availability, on sale, search
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::pricing::{self, PriceBreakdown};
use crate::stock::StockStatus;
use crate::types::Product;

/// Default page size for the catalog grid.
pub const DEFAULT_PER_PAGE: u32 = 24;

/// Largest page a client may ask for.
pub const MAX_PER_PAGE: u32 = 100;

// =============================================================================
// Filter
// =============================================================================

/// Which stock statuses a listing includes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// Everything, including out-of-stock products.
    #[default]
    Any,
    /// Strictly in stock (above the low-stock threshold).
    InStock,
    /// Low or in stock.
    Available,
}

impl Availability {
    pub fn matches(&self, status: StockStatus) -> bool {
        match self {
            Availability::Any => true,
            Availability::InStock => status == StockStatus::InStock,
            Availability::Available => status.is_purchasable(),
        }
    }
}

impl std::str::FromStr for Availability {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(Availability::Any),
            "in_stock" | "in-stock" => Ok(Availability::InStock),
            "available" => Ok(Availability::Available),
            _ => Err(crate::error::ValidationError::NotAllowed {
                field: "availability".to_string(),
                allowed: vec![
                    "any".to_string(),
                    "in_stock".to_string(),
                    "available".to_string(),
                ],
            }),
        }
    }
}

/// Catalog filter. All criteria are combined with AND; `None` means "don't care".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductFilter {
    pub category_id: Option<String>,

    /// Inclusive lower bound on the effective price.
    pub min_price: Option<Money>,

    /// Inclusive upper bound on the effective price.
    pub max_price: Option<Money>,

    pub availability: Availability,

    pub on_sale_only: bool,

    /// Case-insensitive substring of name or brand.
    pub search: Option<String>,
}

impl ProductFilter {
    /// Checks whether `product` passes every criterion at `now`.
    ///
    /// Unlisted products never match.
    pub fn matches(&self, product: &Product, now: DateTime<Utc>) -> bool {
        if !product.is_active {
            return false;
        }

        if let Some(category_id) = &self.category_id {
            if product.category_id.as_deref() != Some(category_id.as_str()) {
                return false;
            }
        }

        if !self.availability.matches(product.stock_status()) {
            return false;
        }

        let final_price = product.final_price(now);
        if self.min_price.is_some_and(|min| final_price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| final_price > max) {
            return false;
        }

        if self.on_sale_only && final_price >= product.price {
            return false;
        }

        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => matches_search(product, needle),
            _ => true,
        }
    }
}

fn matches_search(product: &Product, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    product.name.to_lowercase().contains(&needle)
        || product
            .brand
            .as_deref()
            .is_some_and(|b| b.to_lowercase().contains(&needle))
}

// =============================================================================
// Sort
// =============================================================================

/// Catalog sort order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Purchasable first, then newest. The storefront's default.
    #[default]
    Featured,
    PriceAsc,
    PriceDesc,
    Name,
    Newest,
    /// Biggest percentage off first.
    DiscountDesc,
}

impl std::str::FromStr for SortOrder {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "featured" => Ok(SortOrder::Featured),
            "price_asc" | "price-asc" => Ok(SortOrder::PriceAsc),
            "price_desc" | "price-desc" => Ok(SortOrder::PriceDesc),
            "name" => Ok(SortOrder::Name),
            "newest" => Ok(SortOrder::Newest),
            "discount_desc" | "discount" => Ok(SortOrder::DiscountDesc),
            _ => Err(crate::error::ValidationError::NotAllowed {
                field: "sort".to_string(),
                allowed: [
                    "featured",
                    "price_asc",
                    "price_desc",
                    "name",
                    "newest",
                    "discount_desc",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            }),
        }
    }
}

// =============================================================================
// Page
// =============================================================================

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Page {
    fn default() -> Self {
        Page {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Page {
    /// Builds a page request, clamping to sane bounds.
    pub fn new(page: u32, per_page: u32) -> Self {
        Page {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.per_page as usize
    }
}

// =============================================================================
// Listing
// =============================================================================

/// A product as the catalog grid renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    pub brand: Option<String>,
    pub category_id: Option<String>,
    pub image_url: Option<String>,
    pub price: PriceBreakdown,
    pub stock_status: StockStatus,
    /// "В наличии", "Осталось мало" or "Нет в наличии".
    pub stock_label: String,
    pub available_quantity: i64,
}

impl ProductSummary {
    pub fn from_product(product: &Product, now: DateTime<Utc>) -> Self {
        ProductSummary {
            id: product.id.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            category_id: product.category_id.clone(),
            image_url: product.image_url.clone(),
            price: pricing::price_breakdown(product, now),
            stock_status: product.stock_status(),
            stock_label: product.stock_status().label().to_string(),
            available_quantity: product.available_quantity(),
        }
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductListing {
    pub items: Vec<ProductSummary>,
    /// Matches across all pages.
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

/// Filters, sorts and pages `products` at `now`.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use tekhnika_core::catalog::{list_products, Page, ProductFilter, SortOrder};
/// use tekhnika_core::money::Money;
/// use tekhnika_core::types::Product;
///
/// let products = vec![
///     Product::new("a", "Чайник", Money::from_rubles(2000)).with_stock(10),
///     Product::new("b", "Утюг", Money::from_rubles(3000)).with_stock(10),
/// ];
///
/// let listing = list_products(&products, &ProductFilter::default(), SortOrder::PriceDesc, Page::default(), Utc::now());
/// assert_eq!(listing.items[0].id, "b");
/// ```
pub fn list_products(
    products: &[Product],
    filter: &ProductFilter,
    sort: SortOrder,
    page: Page,
    now: DateTime<Utc>,
) -> ProductListing {
    let mut matched: Vec<&Product> = products.iter().filter(|p| filter.matches(p, now)).collect();
    sort_products(&mut matched, sort, now);

    let total = matched.len();
    let per_page = page.per_page.max(1);
    let total_pages = total.div_ceil(per_page as usize) as u32;

    let items = matched
        .into_iter()
        .skip(page.offset())
        .take(per_page as usize)
        .map(|p| ProductSummary::from_product(p, now))
        .collect();

    ProductListing {
        items,
        total,
        page: page.page,
        per_page,
        total_pages,
    }
}

/// Sorts in place. Ties fall back to product id so pages are stable.
pub fn sort_products(products: &mut [&Product], sort: SortOrder, now: DateTime<Utc>) {
    match sort {
        SortOrder::Featured => products.sort_by(|a, b| {
            b.stock_status()
                .is_purchasable()
                .cmp(&a.stock_status().is_purchasable())
                .then(b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        }),
        SortOrder::PriceAsc => products.sort_by(|a, b| {
            a.final_price(now)
                .cmp(&b.final_price(now))
                .then_with(|| a.id.cmp(&b.id))
        }),
        SortOrder::PriceDesc => products.sort_by(|a, b| {
            b.final_price(now)
                .cmp(&a.final_price(now))
                .then_with(|| a.id.cmp(&b.id))
        }),
        SortOrder::Name => products.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        }),
        SortOrder::Newest => products.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        }),
        SortOrder::DiscountDesc => products.sort_by_cached_key(|p| {
            let breakdown = pricing::price_breakdown(p, now);
            (
                std::cmp::Reverse(breakdown.percent_off),
                std::cmp::Reverse(breakdown.savings),
                p.id.clone(),
            )
        }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
