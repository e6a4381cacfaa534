//! End-to-end purchase and redemption flows against both stores.

use std::sync::Arc;

use chrono::Utc;
use topup_core::{Game, Product, TransactionStatus, VoucherState, Voucher};
use topup_db::{Database, DbConfig};
use topup_service::{
    MemoryStore, PurchaseRequest, ServiceError, TopupService, TopupStore,
};
use uuid::Uuid;

const USER: &str = "user-1";

struct Catalog {
    game: Game,
    product: Product,
    voucher: Voucher,
}

fn catalog() -> Catalog {
    let game = Game {
        id: Uuid::new_v4().to_string(),
        name: "Mobile Brawl".to_string(),
        slug: "mobile-brawl".to_string(),
        description: None,
        thumbnail_url: None,
        is_active: true,
        created_at: Utc::now(),
    };
    let product = Product {
        id: Uuid::new_v4().to_string(),
        game_id: game.id.clone(),
        name: "706 Diamonds".to_string(),
        price: 100_000,
        currency_amount: 706,
        is_active: true,
        created_at: Utc::now(),
    };
    let voucher = Voucher {
        id: Uuid::new_v4().to_string(),
        name: "Diskon 20%".to_string(),
        description: None,
        discount_percentage: 20,
        points_required: 100,
        is_active: true,
        created_at: Utc::now(),
    };
    Catalog {
        game,
        product,
        voucher,
    }
}

async fn memory_service(starting_points: i64) -> (TopupService<MemoryStore>, Catalog) {
    let c = catalog();
    let store = MemoryStore::new();
    store.insert_game(c.game.clone()).unwrap();
    store.insert_product(c.product.clone()).unwrap();
    store.insert_voucher(c.voucher.clone()).unwrap();
    store.create_profile(USER, "Rina").await.unwrap();
    if starting_points > 0 {
        store.adjust_balance(USER, starting_points).await.unwrap();
    }
    (TopupService::new(store), c)
}

async fn sqlite_service(starting_points: i64) -> (TopupService<Database>, Catalog) {
    let c = catalog();
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    db.catalog().insert_game(&c.game).await.unwrap();
    db.catalog().insert_product(&c.product).await.unwrap();
    db.catalog().insert_voucher(&c.voucher).await.unwrap();
    db.profiles().create(USER, "Rina").await.unwrap();
    if starting_points > 0 {
        db.profiles().adjust_balance(USER, starting_points).await.unwrap();
    }
    (TopupService::new(db), c)
}

fn checkout(product: &Product, user_voucher_id: Option<&str>) -> PurchaseRequest {
    PurchaseRequest {
        product_id: product.id.clone(),
        user_game_id: " 12345678 ".to_string(),
        payment_method: "gopay".to_string(),
        user_voucher_id: user_voucher_id.map(str::to_string),
    }
}

async fn discounted_purchase_scenario<S: TopupStore>(service: TopupService<S>, c: Catalog) {
    let receipt = service.redeem_voucher(USER, &c.voucher.id).await.unwrap();
    assert_eq!(receipt.new_balance, 50);
    assert_eq!(receipt.user_voucher.state(), VoucherState::Available);

    let uv_id = receipt.user_voucher.id.clone();
    let quote = service
        .quote(USER, &c.product.id, Some(&uv_id))
        .await
        .unwrap();
    assert_eq!(quote.final_price.units(), 80_000);

    let purchase = service
        .purchase(USER, checkout(&c.product, Some(&uv_id)))
        .await
        .unwrap();
    assert_eq!(purchase.transaction.status, TransactionStatus::Success);
    assert_eq!(purchase.transaction.total_price, 80_000);
    assert_eq!(purchase.transaction.points_earned, 8);
    assert_eq!(purchase.transaction.user_game_id, "12345678");
    assert_eq!(purchase.quote.discount.units(), 20_000);
    assert_eq!(
        purchase.consumed_voucher.as_ref().map(|uv| uv.state()),
        Some(VoucherState::Used)
    );

    let stored = service.store().get_user_voucher(&uv_id, USER).await.unwrap();
    assert!(stored.is_used);
    assert!(stored.used_at.is_some());

    let vault = service.vault(USER).await.unwrap();
    assert_eq!(vault.loyalty_points, 58);
    assert_eq!(vault.history.len(), 1);
    assert_eq!(vault.history[0].product_name, "706 Diamonds");
    assert_eq!(vault.history[0].game_name, "Mobile Brawl");
    assert_eq!(vault.owned_vouchers.len(), 1);
    assert!(vault.owned_vouchers[0].user_voucher.is_used);

    // The same instance can neither be priced nor bought again.
    let err = service
        .quote(USER, &c.product.id, Some(&uv_id))
        .await
        .unwrap_err();
    assert_eq!(err, ServiceError::AlreadyUsed(uv_id.clone()));

    let err = service
        .purchase(USER, checkout(&c.product, Some(&uv_id)))
        .await
        .unwrap_err();
    assert_eq!(err, ServiceError::AlreadyUsed(uv_id));
    assert_eq!(service.vault(USER).await.unwrap().history.len(), 1);
}

#[tokio::test]
async fn test_discounted_purchase_memory() {
    let (service, c) = memory_service(150).await;
    discounted_purchase_scenario(service, c).await;
}

#[tokio::test]
async fn test_discounted_purchase_sqlite() {
    let (service, c) = sqlite_service(150).await;
    discounted_purchase_scenario(service, c).await;
}

#[tokio::test]
async fn test_full_price_purchase_accrues_points() {
    let (service, c) = sqlite_service(0).await;

    let receipt = service
        .purchase(USER, checkout(&c.product, None))
        .await
        .unwrap();
    assert_eq!(receipt.transaction.total_price, 100_000);
    assert_eq!(receipt.transaction.points_earned, 10);
    assert!(receipt.consumed_voucher.is_none());
    assert_eq!(service.vault(USER).await.unwrap().loyalty_points, 10);
}

#[tokio::test]
async fn test_insufficient_points_leaves_balance() {
    let (service, c) = sqlite_service(50).await;

    let err = service.redeem_voucher(USER, &c.voucher.id).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::InsufficientPoints {
            required: 100,
            available: 50
        }
    );

    let vault = service.vault(USER).await.unwrap();
    assert_eq!(vault.loyalty_points, 50);
    assert!(vault.owned_vouchers.is_empty());
}

#[tokio::test]
async fn test_voucher_of_another_user_is_not_found() {
    let (service, c) = memory_service(100).await;
    service.create_profile("user-2", "Budi").await.unwrap();

    let receipt = service.redeem_voucher(USER, &c.voucher.id).await.unwrap();
    let err = service
        .purchase(
            "user-2",
            checkout(&c.product, Some(&receipt.user_voucher.id)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));

    let stored = service
        .store()
        .get_user_voucher(&receipt.user_voucher.id, USER)
        .await
        .unwrap();
    assert!(!stored.is_used);
}

#[tokio::test]
async fn test_store_failure_is_never_reported_as_success() {
    let (service, c) = memory_service(100).await;
    let receipt = service.redeem_voucher(USER, &c.voucher.id).await.unwrap();
    let uv_id = receipt.user_voucher.id;

    service.store().fail_commits(true);
    let err = service
        .purchase(USER, checkout(&c.product, Some(&uv_id)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::StoreUnavailable(_)));
    assert_eq!(service.store().transaction_count().unwrap(), 0);

    let uv = service.store().get_user_voucher(&uv_id, USER).await.unwrap();
    assert!(!uv.is_used);
    assert_eq!(service.vault(USER).await.unwrap().loyalty_points, 0);

    service.store().fail_commits(false);
    let ok = service
        .purchase(USER, checkout(&c.product, Some(&uv_id)))
        .await
        .unwrap();
    assert_eq!(ok.transaction.total_price, 80_000);
}

#[tokio::test]
async fn test_inactive_product_is_not_sold() {
    let (service, c) = memory_service(0).await;
    let retired = Product {
        id: Uuid::new_v4().to_string(),
        is_active: false,
        ..c.product.clone()
    };
    service.store().insert_product(retired.clone()).unwrap();

    let err = service
        .purchase(USER, checkout(&retired, None))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

#[tokio::test]
async fn test_concurrent_redemptions_never_overspend() {
    let (service, c) = memory_service(150).await;
    let service = Arc::new(service);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        let voucher_id = c.voucher.id.clone();
        handles.push(tokio::spawn(async move {
            service.redeem_voucher(USER, &voucher_id).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(ServiceError::InsufficientPoints { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(successes, 1);
    let vault = service.vault(USER).await.unwrap();
    assert_eq!(vault.loyalty_points, 50);
    assert_eq!(vault.owned_vouchers.len(), 1);
}

#[tokio::test]
async fn test_browsing() {
    let (service, c) = sqlite_service(0).await;

    let games = service.catalog().await.unwrap();
    assert_eq!(games.len(), 1);

    let page = service.game_products("mobile-brawl").await.unwrap();
    assert_eq!(page.game.id, c.game.id);
    assert_eq!(page.products.len(), 1);

    let err = service.game_products("unknown").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

#[tokio::test]
async fn test_profile_history_is_limited() {
    let (service, c) = sqlite_service(0).await;
    let service = service.with_history_limit(3);

    for _ in 0..5 {
        service
            .purchase(USER, checkout(&c.product, None))
            .await
            .unwrap();
    }

    let view = service.profile(USER).await.unwrap();
    assert_eq!(view.profile.loyalty_points, 50);
    assert_eq!(view.history.len(), 3);
}

async fn unknown_buyer_scenario<S: TopupStore>(service: TopupService<S>, c: Catalog) {
    let err = service
        .purchase("ghost", checkout(&c.product, None))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ServiceError::NotFound {
            entity: "Profile".to_string(),
            id: "ghost".to_string()
        }
    );
    assert!(service
        .store()
        .recent_transactions("ghost", 10)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_unknown_buyer_is_not_found_on_sqlite() {
    let (service, c) = sqlite_service(0).await;
    unknown_buyer_scenario(service, c).await;
}

#[tokio::test]
async fn test_unknown_buyer_is_not_found_in_memory() {
    let (service, c) = memory_service(0).await;
    unknown_buyer_scenario(service, c).await;
}

#[tokio::test]
async fn test_user_id_is_trimmed() {
    let (service, c) = sqlite_service(0).await;

    let receipt = service
        .purchase("  user-1 ", checkout(&c.product, None))
        .await
        .unwrap();
    assert_eq!(receipt.transaction.user_id, USER);

    let vault = service.vault(" user-1").await.unwrap();
    assert_eq!(vault.loyalty_points, 10);
    assert_eq!(vault.history.len(), 1);
}

#[tokio::test]
async fn test_product_of_inactive_game_is_not_sold() {
    let (service, c) = memory_service(0).await;
    let retired_game = Game {
        id: Uuid::new_v4().to_string(),
        slug: "retired-brawl".to_string(),
        is_active: false,
        ..c.game.clone()
    };
    let orphan = Product {
        id: Uuid::new_v4().to_string(),
        game_id: retired_game.id.clone(),
        ..c.product.clone()
    };
    service.store().insert_game(retired_game).unwrap();
    service.store().insert_product(orphan.clone()).unwrap();

    let err = service
        .quote(USER, &orphan.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));

    let err = service
        .purchase(USER, checkout(&orphan, None))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
    assert_eq!(service.store().transaction_count().unwrap(), 0);
}
