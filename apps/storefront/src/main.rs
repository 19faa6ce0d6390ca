//! # Tekhnika CLI
//!
//! Command line front end of the storefront. Every command prints its result
//! as pretty JSON on stdout; logs go to stderr.
//!
//! ```text
//! tekhnika catalog --category fridges --sort price_asc --on-sale
//! tekhnika product lg-ga-b509-silver
//! tekhnika cart add lg-ga-b509-silver 1
//! tekhnika cart merge saved-cart.json
//! tekhnika checkout --name "Иван" --phone "+7 912 345-67-89"
//! tekhnika orders confirm TK-20241129-0001
//! tekhnika admin set-stock lg-ga-b509-silver 12
//! tekhnika import catalog.json
//! ```
//!
//! A failed command prints `{"code": ..., "message": ...}` and exits with 1.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;

use tekhnika_core::catalog::{Availability, SortOrder};
use tekhnika_core::document::DiscountDocument;
use tekhnika_core::{Cart, CustomerInfo, OrderStatus};
use tekhnika_storefront::commands::{admin, cart, catalog, checkout, orders};
use tekhnika_storefront::error::ApiError;
use tekhnika_storefront::state::ConfigState;
use tekhnika_storefront::{init_tracing, Storefront};

/// Tekhnika - home appliance storefront
#[derive(Parser)]
#[command(name = "tekhnika")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file (overrides config and TEKHNIKA_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List one page of the catalog
    Catalog(CatalogArgs),

    /// List categories
    Categories,

    /// Show one product
    Product {
        /// Product id
        id: String,
    },

    /// Inspect and change the cart
    #[command(subcommand)]
    Cart(CartCommand),

    /// Place an order for the cart
    Checkout(CheckoutArgs),

    /// Order history and status changes
    #[command(subcommand)]
    Orders(OrdersCommand),

    /// Import a catalog dump (JSON)
    Import {
        /// Path to the dump
        file: PathBuf,
    },

    /// Back-office product maintenance
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(clap::Args)]
struct CatalogArgs {
    /// Category id or slug
    #[arg(long)]
    category: Option<String>,

    /// Lowest sale price, rubles
    #[arg(long)]
    min_price: Option<Decimal>,

    /// Highest sale price, rubles
    #[arg(long)]
    max_price: Option<Decimal>,

    /// any | in_stock | available
    #[arg(long, default_value = "any")]
    availability: Availability,

    /// Only discounted products
    #[arg(long)]
    on_sale: bool,

    /// Name search
    #[arg(short, long)]
    search: Option<String>,

    /// featured | price_asc | price_desc | name | newest | discount_desc
    #[arg(long)]
    sort: Option<SortOrder>,

    #[arg(long)]
    page: Option<u32>,

    #[arg(long)]
    per_page: Option<u32>,
}

impl From<CatalogArgs> for catalog::CatalogQuery {
    fn from(args: CatalogArgs) -> Self {
        catalog::CatalogQuery {
            category: args.category,
            min_price: args.min_price,
            max_price: args.max_price,
            availability: args.availability,
            on_sale: args.on_sale,
            search: args.search,
            sort: args.sort,
            page: args.page,
            per_page: args.per_page,
        }
    }
}

#[derive(Subcommand)]
enum CartCommand {
    /// Show the cart, re-checked against the catalog
    Show,
    /// Add a product
    Add {
        product_id: String,
        #[arg(default_value_t = 1)]
        quantity: i64,
    },
    /// Set the quantity of a line (0 removes it)
    Set { product_id: String, quantity: i64 },
    /// Remove a line
    Remove { product_id: String },
    /// Fold a saved cart (JSON) into the current one
    Merge { file: PathBuf },
    /// Empty the cart
    Clear,
}

#[derive(clap::Args)]
struct CheckoutArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    comment: Option<String>,
}

impl From<CheckoutArgs> for CustomerInfo {
    fn from(args: CheckoutArgs) -> Self {
        CustomerInfo {
            name: args.name,
            phone: args.phone,
            email: args.email,
            address: args.address,
            comment: args.comment,
        }
    }
}

#[derive(Subcommand)]
enum OrdersCommand {
    /// Recent orders, newest first
    List {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show an order by id or number
    Show { order: String },
    /// Mark an order confirmed
    Confirm { order: String },
    /// Cancel an order
    Cancel { order: String },
}

#[derive(Subcommand)]
enum AdminCommand {
    /// Set stock (omit the quantity for "unknown")
    SetStock {
        product_id: String,
        quantity: Option<i64>,
    },
    /// Replace the discount of a product
    SetDiscount {
        product_id: String,
        /// percentage | fixed
        #[arg(long = "type")]
        kind: String,
        /// Percent, or rubles for fixed discounts
        #[arg(long)]
        value: Decimal,
        /// RFC 3339 start of the window
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        /// RFC 3339 end of the window
        #[arg(long)]
        end: Option<DateTime<Utc>>,
        /// Store the discount switched off
        #[arg(long)]
        inactive: bool,
    },
    /// Remove the discount of a product
    ClearDiscount { product_id: String },
    /// Unlist a product
    Deactivate { product_id: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(command: Commands, app: &Storefront) -> Result<std::result::Result<(), ApiError>> {
    let now = Utc::now();
    let db = &app.db;

    macro_rules! emit {
        ($call:expr) => {
            match $call.await {
                Ok(value) => print_json(&value)?,
                Err(e) => return Ok(Err(e)),
            }
        };
    }

    match command {
        Commands::Catalog(args) => {
            emit!(catalog::list_products(db, &app.config, args.into(), now))
        }
        Commands::Categories => emit!(catalog::list_categories(db)),
        Commands::Product { id } => emit!(catalog::get_product(db, &id, now)),
        Commands::Cart(command) => match command {
            CartCommand::Show => emit!(cart::get_cart(db, &app.cart, now)),
            CartCommand::Add {
                product_id,
                quantity,
            } => emit!(cart::add_to_cart(db, &app.cart, &product_id, quantity, now)),
            CartCommand::Set {
                product_id,
                quantity,
            } => emit!(cart::set_quantity(db, &app.cart, &product_id, quantity, now)),
            CartCommand::Remove { product_id } => {
                emit!(cart::remove_from_cart(&app.cart, &product_id, now))
            }
            CartCommand::Merge { file } => {
                let json = std::fs::read_to_string(&file)
                    .with_context(|| format!("reading cart {}", file.display()))?;
                let saved: Cart = serde_json::from_str(&json)
                    .with_context(|| format!("parsing cart {}", file.display()))?;
                emit!(cart::merge_cart(db, &app.cart, saved, now))
            }
            CartCommand::Clear => emit!(cart::clear_cart(&app.cart, now)),
        },
        Commands::Checkout(args) => emit!(checkout::checkout(
            db,
            &app.cart,
            &app.config,
            args.into(),
            now
        )),
        Commands::Orders(command) => match command {
            OrdersCommand::List { limit } => emit!(orders::list_orders(db, limit)),
            OrdersCommand::Show { order } => emit!(orders::get_order(db, &order)),
            OrdersCommand::Confirm { order } => emit!(orders::update_order_status(
                db,
                &order,
                OrderStatus::Confirmed,
                now
            )),
            OrdersCommand::Cancel { order } => emit!(orders::update_order_status(
                db,
                &order,
                OrderStatus::Cancelled,
                now
            )),
        },
        Commands::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("reading catalog dump {}", file.display()))?;
            emit!(admin::import_catalog(db, &json, now))
        }
        Commands::Admin(command) => match command {
            AdminCommand::SetStock {
                product_id,
                quantity,
            } => emit!(admin::set_stock(db, &product_id, quantity)),
            AdminCommand::SetDiscount {
                product_id,
                kind,
                value,
                start,
                end,
                inactive,
            } => {
                let document = DiscountDocument {
                    kind,
                    value,
                    start_date: start,
                    end_date: end,
                    is_active: !inactive,
                };
                emit!(admin::set_discount(db, &product_id, document))
            }
            AdminCommand::ClearDiscount { product_id } => {
                emit!(admin::clear_discount(db, &product_id))
            }
            AdminCommand::Deactivate { product_id } => {
                emit!(admin::deactivate(db, &product_id))
            }
        },
    }

    Ok(Ok(()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = ConfigState::load(cli.config).context("loading configuration")?;
    if let Some(db) = cli.db {
        config.database.path = Some(db);
    }

    let outcome = match Storefront::open(config).await {
        Ok(app) => run(cli.command, &app).await?,
        Err(e) => Err(e),
    };

    if let Err(e) = outcome {
        print_json(&e)?;
        std::process::exit(1);
    }

    Ok(())
}
