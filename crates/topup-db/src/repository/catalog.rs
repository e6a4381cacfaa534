//! # Catalog Repository
//!
//! Read access to games, products and voucher templates, plus inserts used
//! by the seed binary. Catalog management screens are not part of this
//! system; rows are treated as immutable once written.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use topup_core::{Game, Product, Voucher};

const GAME_COLUMNS: &str = "id, name, slug, description, thumbnail_url, is_active, created_at";

const PRODUCT_COLUMNS: &str = "id, game_id, name, price, currency_amount, is_active, created_at";

const VOUCHER_COLUMNS: &str =
    "id, name, description, discount_percentage, points_required, is_active, created_at";

/// Repository for catalog reads.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Games
    // =========================================================================

    /// Lists active games ordered by name.
    pub async fn list_active_games(&self) -> DbResult<Vec<Game>> {
        let sql = format!(
            "SELECT {GAME_COLUMNS} FROM games WHERE is_active = 1 ORDER BY name"
        );
        let games = sqlx::query_as::<_, Game>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = games.len(), "Listed active games");
        Ok(games)
    }

    /// Gets a game by ID, active or not.
    pub async fn get_game(&self, id: &str) -> DbResult<Option<Game>> {
        let sql = format!("SELECT {GAME_COLUMNS} FROM games WHERE id = ?1");
        let game = sqlx::query_as::<_, Game>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(game)
    }

    /// Gets an active game by its slug.
    pub async fn get_game_by_slug(&self, slug: &str) -> DbResult<Option<Game>> {
        let sql = format!("SELECT {GAME_COLUMNS} FROM games WHERE slug = ?1 AND is_active = 1");
        let game = sqlx::query_as::<_, Game>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(game)
    }

    /// Inserts a game.
    pub async fn insert_game(&self, game: &Game) -> DbResult<()> {
        debug!(id = %game.id, slug = %game.slug, "Inserting game");

        sqlx::query(
            r#"
            INSERT INTO games (id, name, slug, description, thumbnail_url, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&game.id)
        .bind(&game.name)
        .bind(&game.slug)
        .bind(&game.description)
        .bind(&game.thumbnail_url)
        .bind(game.is_active)
        .bind(game.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, game.slug.clone()),
            other => other,
        })?;

        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Lists a game's active products, cheapest first.
    pub async fn list_products_for_game(&self, game_id: &str) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE game_id = ?1 AND is_active = 1 \
             ORDER BY price, name"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(game_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    /// Gets a product by ID, active or not.
    pub async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Inserts a product.
    pub async fn insert_product(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, game_id = %product.game_id, price = product.price, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, game_id, name, price, currency_amount, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.game_id)
        .bind(&product.name)
        .bind(product.price)
        .bind(product.currency_amount)
        .bind(product.is_active)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Voucher templates
    // =========================================================================

    /// Lists vouchers offered for redemption, cheapest in points first.
    pub async fn list_active_vouchers(&self) -> DbResult<Vec<Voucher>> {
        let sql = format!(
            "SELECT {VOUCHER_COLUMNS} FROM vouchers \
             WHERE is_active = 1 \
             ORDER BY points_required, name"
        );
        let vouchers = sqlx::query_as::<_, Voucher>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(vouchers)
    }

    /// Gets a voucher template by ID, active or not.
    pub async fn get_voucher(&self, id: &str) -> DbResult<Option<Voucher>> {
        let sql = format!("SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE id = ?1");
        let voucher = sqlx::query_as::<_, Voucher>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(voucher)
    }

    /// Inserts a voucher template.
    pub async fn insert_voucher(&self, voucher: &Voucher) -> DbResult<()> {
        debug!(id = %voucher.id, points_required = voucher.points_required, "Inserting voucher");

        sqlx::query(
            r#"
            INSERT INTO vouchers (
                id, name, description, discount_percentage, points_required, is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&voucher.id)
        .bind(&voucher.name)
        .bind(&voucher.description)
        .bind(voucher.discount_percentage)
        .bind(voucher.points_required)
        .bind(voucher.is_active)
        .bind(voucher.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{game, product, seeded_db, voucher};

    #[tokio::test]
    async fn test_active_games_sorted_by_name() {
        let db = seeded_db().await;
        let mut hidden = game("Zeta Hidden", "zeta-hidden");
        hidden.is_active = false;
        db.catalog().insert_game(&hidden).await.unwrap();
        db.catalog()
            .insert_game(&game("Arena Legends", "arena-legends"))
            .await
            .unwrap();

        let games = db.catalog().list_active_games().await.unwrap();
        let names: Vec<_> = games.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Arena Legends", "Mobile Brawl"]);
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let db = seeded_db().await;
        let err = db
            .catalog()
            .insert_game(&game("Another", "mobile-brawl"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_game_by_slug() {
        let db = seeded_db().await;
        let found = db.catalog().get_game_by_slug("mobile-brawl").await.unwrap();
        assert!(found.is_some());
        assert!(db
            .catalog()
            .get_game_by_slug("missing")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_products_ordered_by_price() {
        let db = seeded_db().await;
        let g = db
            .catalog()
            .get_game_by_slug("mobile-brawl")
            .await
            .unwrap()
            .unwrap();

        let cheap = product(&g.id, "12 Diamonds", 3_500);
        let mut retired = product(&g.id, "Old Pack", 1_000);
        retired.is_active = false;
        db.catalog().insert_product(&cheap).await.unwrap();
        db.catalog().insert_product(&retired).await.unwrap();

        let products = db.catalog().list_products_for_game(&g.id).await.unwrap();
        let prices: Vec<_> = products.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![3_500, 100_000]);

        let loaded = db.catalog().get_product(&retired.id).await.unwrap().unwrap();
        assert!(!loaded.is_active);
    }

    #[tokio::test]
    async fn test_non_positive_price_rejected_by_schema() {
        let db = seeded_db().await;
        let g = db.catalog().list_active_games().await.unwrap().remove(0);
        let err = db
            .catalog()
            .insert_product(&product(&g.id, "Free", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_vouchers_ordered_by_points() {
        let db = seeded_db().await;
        db.catalog()
            .insert_voucher(&voucher("Diskon 5%", 5, 20))
            .await
            .unwrap();

        let vouchers = db.catalog().list_active_vouchers().await.unwrap();
        let points: Vec<_> = vouchers.iter().map(|v| v.points_required).collect();
        assert_eq!(points, vec![20, 100]);

        let v = db
            .catalog()
            .get_voucher(&vouchers[1].id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(v.discount_percentage, 20);
    }
}
