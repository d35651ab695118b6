//! # Seed Data Generator
//!
//! Populates the database with demo products for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p shopfront-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p shopfront-db --bin seed -- --count 1000
//!
//! # Specify database path (otherwise SHOPFRONT_DATABASE_PATH or ./shopfront.db)
//! cargo run -p shopfront-db --bin seed -- --db ./data/shopfront.db
//! ```
//!
//! Each product has:
//! - SKU: random UUID v4
//! - Name: `{base} {size}`, unique
//! - Price: 5.00 - 49.99 plus a size addon, derived from the product's index
//! - Stock: 0 - 100, derived from the product's index
//!
//! Only the SKUs change between runs; names, prices and stock are the same
//! every time.

use std::env;

use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use shopfront_core::validation::validate_create_product;
use shopfront_core::CreateProduct;
use shopfront_db::{Database, DbConfig};

/// Base product names.
const NAMES: &[&str] = &[
    "Kopi Susu",
    "Kopi Hitam",
    "Teh Manis",
    "Teh Tarik",
    "Air Mineral",
    "Jus Jeruk",
    "Jus Alpukat",
    "Roti Bakar",
    "Nasi Goreng",
    "Mie Goreng",
    "Keripik Singkong",
    "Kacang Mete",
    "Cokelat Batang",
    "Susu UHT",
    "Yogurt Stroberi",
    "Es Krim Vanila",
    "Sabun Mandi",
    "Sampo",
    "Pasta Gigi",
    "Tisu Basah",
];

/// Size variants with a price addon in minor units.
const SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Medium", 500),
    ("Large", 1_000),
    ("250ml", 0),
    ("500ml", 700),
    ("1L", 1_500),
    ("Pack of 6", 2_500),
    ("Pack of 12", 4_500),
    ("Family", 3_000),
    ("Travel", 200),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,shopfront=debug,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut config = DbConfig::from_env()?;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config = DbConfig::new(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shopfront Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./shopfront.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let capacity = NAMES.len() * SIZES.len();
    if count > capacity {
        warn!(requested = count, capacity, "Not enough unique names; capping product count");
        count = capacity;
    }

    info!(path = %config.database_path.display(), count, "Seeding database");

    let db = Database::new(config).await?;
    let products = db.products();

    let existing = products.count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut generated = 0;

    'outer: for (name_idx, name) in NAMES.iter().enumerate() {
        for (size_idx, (size, addon)) in SIZES.iter().enumerate() {
            if generated >= count {
                break 'outer;
            }

            let req = generate_product(name, size, *addon, name_idx * SIZES.len() + size_idx);
            validate_create_product(&req)?;

            if let Err(e) = products.insert(&req, Utc::now()).await {
                warn!(sku = %req.sku, error = %e, "Failed to insert product");
                continue;
            }

            generated += 1;
            if generated % 50 == 0 {
                info!(generated, "Seeding in progress");
            }
        }
    }

    info!(generated, elapsed_ms = start.elapsed().as_millis() as u64, "Seed complete");
    Ok(())
}

/// Builds one demo product. Price and stock are a pure function of `seed`.
fn generate_product(name: &str, size: &str, price_addon: i64, seed: usize) -> CreateProduct {
    let base_price = 500 + ((seed * 37) % 4_500) as i64;

    CreateProduct {
        sku: Uuid::new_v4().to_string(),
        name: format!("{name} {size}"),
        stock: (seed % 101) as i64,
        price_cents: base_price + price_addon,
    }
}
