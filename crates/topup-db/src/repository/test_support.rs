//! Fixtures shared by the repository tests.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::pool::{Database, DbConfig};
use topup_core::{Game, PaymentMethod, Product, Transaction, TransactionStatus, Voucher};

pub const SEED_USER: &str = "user-1";

pub fn game(name: &str, slug: &str) -> Game {
    Game {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        slug: slug.to_string(),
        description: None,
        thumbnail_url: None,
        is_active: true,
        created_at: Utc::now(),
    }
}

pub fn product(game_id: &str, name: &str, price: i64) -> Product {
    Product {
        id: Uuid::new_v4().to_string(),
        game_id: game_id.to_string(),
        name: name.to_string(),
        price,
        currency_amount: 86,
        is_active: true,
        created_at: Utc::now(),
    }
}

pub fn voucher(name: &str, discount_percentage: u8, points_required: i64) -> Voucher {
    Voucher {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        description: None,
        discount_percentage,
        points_required,
        is_active: true,
        created_at: Utc::now(),
    }
}

/// A pending, voucher-less purchase of `product` by [`SEED_USER`].
pub fn transaction(product: &Product, created_at: DateTime<Utc>) -> Transaction {
    Transaction {
        id: Uuid::new_v4().to_string(),
        user_id: SEED_USER.to_string(),
        game_id: product.game_id.clone(),
        product_id: product.id.clone(),
        user_game_id: "12345678".to_string(),
        user_voucher_id: None,
        payment_method: PaymentMethod::GoPay,
        total_price: product.price,
        points_earned: 0,
        status: TransactionStatus::Pending,
        created_at,
    }
}

pub async fn empty_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// One game with one 100,000 product, one 20%/100-point voucher, and
/// [`SEED_USER`] with a zero balance.
pub async fn seeded_db() -> Database {
    let db = empty_db().await;

    let g = game("Mobile Brawl", "mobile-brawl");
    db.catalog().insert_game(&g).await.unwrap();
    db.catalog()
        .insert_product(&product(&g.id, "86 Diamonds", 100_000))
        .await
        .unwrap();
    db.catalog()
        .insert_voucher(&voucher("Diskon 20%", 20, 100))
        .await
        .unwrap();
    db.profiles().create(SEED_USER, "Rina").await.unwrap();

    db
}
