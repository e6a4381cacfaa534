//! # Seed Data Generator
//!
//! Populates the database with a demo storefront catalog.
//!
//! ## Usage
//! ```bash
//! # Seed ./topup_dev.db
//! cargo run -p topup-db --bin seed
//!
//! # Specify database path and a demo profile with a starting balance
//! cargo run -p topup-db --bin seed -- --db ./data/topup.db --user demo --points 250
//! ```
//!
//! ## Generated Data
//! - Games with a handful of currency packages each, priced in Rupiah
//! - Voucher templates from 5% to 50%
//! - Optionally one profile, credited with `--points`

use chrono::Utc;
use std::env;
use topup_core::validation::{validate_discount_percentage, validate_points_required, validate_price};
use topup_core::{Game, Product, Voucher};
use topup_db::{Database, DbConfig};
use uuid::Uuid;

/// (name, slug, description, currency name, packages as (amount, price))
const GAMES: &[(&str, &str, &str, &str, &[(i64, i64)])] = &[
    (
        "Mobile Legends",
        "mobile-legends",
        "5v5 MOBA",
        "Diamonds",
        &[(86, 20_000), (172, 40_000), (257, 60_000), (706, 150_000), (2195, 450_000)],
    ),
    (
        "Free Fire",
        "free-fire",
        "Battle royale",
        "Diamonds",
        &[(70, 10_000), (140, 20_000), (355, 50_000), (720, 100_000)],
    ),
    (
        "Genshin Impact",
        "genshin-impact",
        "Open-world action RPG",
        "Genesis Crystals",
        &[(60, 16_000), (330, 79_000), (1090, 249_000), (3880, 799_000)],
    ),
    (
        "Valorant",
        "valorant",
        "Tactical shooter",
        "Points",
        &[(125, 15_000), (420, 50_000), (1375, 150_000)],
    ),
];

/// (name, discount %, points required)
const VOUCHERS: &[(&str, i64, i64)] = &[
    ("Diskon 5%", 5, 20),
    ("Diskon 10%", 10, 50),
    ("Diskon 20%", 20, 100),
    ("Diskon 50%", 50, 300),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./topup_dev.db");
    let mut user: Option<String> = None;
    let mut points: i64 = 0;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--user" | "-u" => {
                if i + 1 < args.len() {
                    user = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--points" | "-p" => {
                if i + 1 < args.len() {
                    points = args[i + 1].parse().unwrap_or(0);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Top-up Storefront Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>      Database file path (default: ./topup_dev.db)");
                println!("  -u, --user <ID>      Also create a demo profile with this user id");
                println!("  -p, --points <N>     Starting loyalty points for the demo profile");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Top-up Storefront Seed Data Generator");
    println!("========================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.catalog().list_active_games().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} games", existing.len());
        println!("  Skipping catalog seed to avoid duplicates.");
    } else {
        seed_catalog(&db).await?;
    }

    if let Some(user_id) = user {
        if db.profiles().get(&user_id).await?.is_none() {
            db.profiles().create(&user_id, "Demo Player").await?;
        }
        if points > 0 {
            let balance = db.profiles().adjust_balance(&user_id, points).await?;
            println!("✓ Profile '{}' now has {} points", user_id, balance);
        } else {
            println!("✓ Profile '{}' ready", user_id);
        }
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

async fn seed_catalog(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();
    let mut products = 0;

    println!();
    println!("Generating catalog...");

    for (name, slug, description, currency, packages) in GAMES {
        let game = Game {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            slug: slug.to_string(),
            description: Some(description.to_string()),
            thumbnail_url: None,
            is_active: true,
            created_at: now,
        };
        db.catalog().insert_game(&game).await?;

        for (amount, price) in packages.iter() {
            validate_price(*price)?;
            let product = Product {
                id: Uuid::new_v4().to_string(),
                game_id: game.id.clone(),
                name: format!("{} {}", amount, currency),
                price: *price,
                currency_amount: *amount,
                is_active: true,
                created_at: now,
            };
            if let Err(e) = db.catalog().insert_product(&product).await {
                eprintln!("Failed to insert {}: {}", product.name, e);
                continue;
            }
            products += 1;
        }

        println!("  {} ({} packages)", name, packages.len());
    }

    for (name, discount, points_required) in VOUCHERS {
        let discount = validate_discount_percentage(*discount)?;
        validate_points_required(*points_required)?;

        let voucher = Voucher {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: Some(format!("Potongan {} untuk satu pembelian", discount)),
            discount_percentage: discount.value(),
            points_required: *points_required,
            is_active: true,
            created_at: now,
        };
        db.catalog().insert_voucher(&voucher).await?;
    }

    println!();
    println!(
        "✓ Generated {} games, {} products, {} vouchers",
        GAMES.len(),
        products,
        VOUCHERS.len()
    );
    Ok(())
}
