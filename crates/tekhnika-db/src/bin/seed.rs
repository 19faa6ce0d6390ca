//! # Seed Data Generator
//!
//! Populates the database with a demo appliance catalog for development.
//!
//! ## Usage
//! ```bash
//! # Built-in demo catalog
//! cargo run -p tekhnika-db --bin seed
//!
//! # Specify database path
//! cargo run -p tekhnika-db --bin seed -- --db ./data/tekhnika.db
//!
//! # Load a catalog dump instead (JSON: {"categories": [...], "products": [...]} or a bare array)
//! cargo run -p tekhnika-db --bin seed -- --import ./catalog.json
//! ```
//!
//! ## Generated Products
//! Each category gets a handful of models in several variants. Ids are
//! deterministic (`{category}-{model}-{variant}`) so reseeding an existing
//! database updates rows in place. Roughly one product in four is on sale,
//! one in seven is out of stock and two in seven run low.

use chrono::{Duration, Utc};
use std::env;
use tekhnika_core::document::parse_catalog_dump;
use tekhnika_core::{Category, Discount, Money, Product};
use tekhnika_db::{migrations, Database, DbConfig};

/// `(slug, display name, base price in rubles, models)`
const CATEGORIES: &[(&str, &str, i64, &[&str])] = &[
    (
        "fridges",
        "Холодильники",
        38_000,
        &["Atlant ХМ-4624", "Bosch KGN39", "LG GA-B509", "Indesit ITS 4200", "Haier C2F637"],
    ),
    (
        "washers",
        "Стиральные машины",
        29_000,
        &["Bosch WAN28", "LG F2J3WS", "Samsung WW60", "Candy CS4 1061", "Beko WSRE 6512"],
    ),
    (
        "dishwashers",
        "Посудомоечные машины",
        27_000,
        &["Bosch SMS25", "Electrolux ESF9552", "Midea MFD45S", "Weissgauff BDW 4543"],
    ),
    (
        "ovens",
        "Духовые шкафы",
        22_000,
        &["Gorenje BO735", "Hansa BOEI68", "Bosch HBF134", "Electrolux OEF5C50"],
    ),
    (
        "microwaves",
        "Микроволновые печи",
        6_500,
        &["Samsung ME88", "LG MS2042", "Midea AM820", "BBK 20MWS", "Panasonic NN-ST34"],
    ),
    (
        "kettles",
        "Чайники",
        1_900,
        &["Polaris PWK 1725", "Redmond RK-G178", "Xiaomi Mi Kettle", "Tefal KO2608"],
    ),
    (
        "vacuums",
        "Пылесосы",
        9_500,
        &["Dyson V8", "Samsung VC18", "Philips FC9332", "Kitfort KT-541", "Tefal TW3953"],
    ),
];

/// `(suffix, price addon in rubles)`
const VARIANTS: &[(&str, i64)] = &[("белый", 0), ("серебристый", 1_500), ("чёрный", 2_500)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./tekhnika_dev.db");
    let mut import_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--import" | "-i" => {
                if i + 1 < args.len() {
                    import_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tekhnika Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Database file path (default: ./tekhnika_dev.db)");
                println!("  -i, --import <FILE>   Load a JSON catalog dump instead of demo data");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Tekhnika Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    let (total, applied) = migrations::migration_status(db.pool()).await?;
    println!("✓ Migrations applied ({}/{})", applied, total);

    let start = std::time::Instant::now();

    if let Some(path) = import_path {
        let json = std::fs::read_to_string(&path)?;
        let dump = parse_catalog_dump(&json)?;
        println!(
            "Importing {} categories and {} products from {}",
            dump.categories.len(),
            dump.products.len(),
            path
        );

        let (categories, rejected_categories) = db.categories().import(dump.categories).await?;
        let report = db.products().import(dump.products, Utc::now()).await?;

        println!("✓ Categories imported: {}", categories);
        println!("✓ Products imported:   {}", report.products_imported);
        for (id, reason) in rejected_categories.iter().chain(report.rejected.iter()) {
            eprintln!("  rejected {}: {}", id, reason);
        }
    } else {
        let generated = seed_demo_catalog(&db).await?;
        println!("✓ Generated {} products in {:?}", generated, start.elapsed());
    }

    let now = Utc::now();
    let products = db.products().list_all().await?;
    let active: Vec<&Product> = products.iter().filter(|p| p.is_active).collect();
    let on_sale = active
        .iter()
        .filter(|p| tekhnika_core::pricing::is_on_sale(p, now))
        .count();
    println!(
        "  Products: {} total, {} listed, {} on sale",
        products.len(),
        active.len(),
        on_sale
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

async fn seed_demo_catalog(db: &Database) -> Result<usize, Box<dyn std::error::Error>> {
    let mut generated = 0;

    for (sort_order, (slug, name, base_price, models)) in CATEGORIES.iter().enumerate() {
        db.categories()
            .upsert(&Category {
                id: slug.to_string(),
                name: name.to_string(),
                slug: slug.to_string(),
                sort_order: sort_order as i64 + 1,
            })
            .await?;

        for (model_idx, model) in models.iter().enumerate() {
            for (variant_idx, (variant, addon)) in VARIANTS.iter().enumerate() {
                let seed = sort_order * 100 + model_idx * 10 + variant_idx;
                let id = format!("{}-{}-{}", slug, model_idx + 1, variant_idx + 1);
                let product = generate_product(&id, slug, model, variant, base_price + addon, seed);

                if let Err(e) = db.products().upsert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.id, e);
                    continue;
                }
                generated += 1;
            }
        }
    }

    Ok(generated)
}

/// Generates a single product with deterministic data.
fn generate_product(
    id: &str,
    category: &str,
    model: &str,
    variant: &str,
    price_rubles: i64,
    seed: usize,
) -> Product {
    let now = Utc::now();
    let brand = model.split_whitespace().next().map(str::to_string);

    // Spread prices a little within a category; round to 10 rubles
    let spread = ((seed * 37) % 20) as i64 * 500;
    let price = Money::from_rubles((price_rubles + spread) / 10 * 10 - 10);

    let stock = match seed % 7 {
        0 => 0,
        1 | 2 => (seed % 4) as i64 + 1,
        _ => (seed % 40) as i64 + 6,
    };

    let discount = match seed % 4 {
        0 => Some(Discount::percentage(
            [10, 15, 20, 25][(seed / 4) % 4],
            Some(now - Duration::days(3)),
            Some(now + Duration::days(14)),
        )),
        3 if seed % 3 == 0 => Some(Discount::fixed(
            Money::from_rubles(1_000),
            None,
            Some(now + Duration::days(30)),
        )),
        _ => None,
    };

    let mut product = Product::new(id, format!("{} {}", model, variant), price).with_stock(stock);
    product.brand = brand;
    product.category_id = Some(category.to_string());
    product.description = Some(format!("{}, цвет: {}", model, variant));
    product.image_url = Some(format!("/images/{}/{}.jpg", category, id));
    product.discount = discount;
    product.created_at = now;
    product.updated_at = now;
    product
}
