//! Fixtures shared by command tests.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tekhnika_core::{Category, Discount, Money, Product};
use tekhnika_db::{Database, DbConfig};

use crate::state::{CartState, DbState, MemoryCartStorage};

pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 29, 10, 0, 0).unwrap()
}

fn product(id: &str, name: &str, rubles: i64, category: &str, stock: i64) -> Product {
    let mut product = Product::new(id, name, Money::from_rubles(rubles)).with_stock(stock);
    product.category_id = Some(category.to_string());
    product.brand = name.split_whitespace().nth(1).map(str::to_string);
    product.created_at = test_now() - Duration::days(30);
    product.updated_at = product.created_at;
    product
}

/// In-memory database with three categories and four products:
///
/// | id            | price  | stock | notes                 |
/// |---------------|--------|-------|-----------------------|
/// | fridge-lg     | 50 000 | 10    | 20% off this week     |
/// | fridge-atlant | 38 000 | 3     | low stock             |
/// | kettle        | 2 000  | 2     | low stock             |
/// | washer-beko   | 30 000 | 0     | out of stock          |
pub async fn seeded_db() -> DbState {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    for (order, (id, name)) in [
        ("fridges", "Холодильники"),
        ("washers", "Стиральные машины"),
        ("kettles", "Чайники"),
    ]
    .into_iter()
    .enumerate()
    {
        db.categories()
            .upsert(&Category {
                id: id.to_string(),
                name: name.to_string(),
                slug: id.to_string(),
                sort_order: order as i64,
            })
            .await
            .unwrap();
    }

    let now = test_now();
    let products = [
        product("fridge-lg", "Холодильник LG GA-B509", 50_000, "fridges", 10).with_discount(
            Discount::percentage(
                20,
                Some(now - Duration::days(2)),
                Some(now + Duration::days(5)),
            ),
        ),
        product("fridge-atlant", "Холодильник Atlant ХМ-4624", 38_000, "fridges", 3),
        product("kettle", "Чайник Polaris PWK", 2_000, "kettles", 2),
        product("washer-beko", "Стиральная Beko WSRE", 30_000, "washers", 0),
    ];
    for p in &products {
        db.products().upsert(p).await.unwrap();
    }

    DbState::new(db)
}

pub async fn memory_cart() -> CartState {
    CartState::load(Arc::new(MemoryCartStorage::new()))
        .await
        .unwrap()
}
