//! # SQLite Store
//!
//! [`TopupStore`] over `topup_db::Database`. Each method delegates to one
//! repository call; the atomic units are the ledger's SQLite transactions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::store::{StoreError, StoreResult, TopupStore};
use topup_core::loyalty::Redemption;
use topup_core::{
    Game, OwnedVoucher, Product, Profile, Transaction, TransactionSummary, UserVoucher, Voucher,
};
use topup_db::{Database, DbError, PurchaseCommit};

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => StoreError::NotFound { entity, id },
            DbError::InsufficientPoints {
                required,
                available,
                ..
            } => StoreError::InsufficientPoints {
                required,
                available,
            },
            DbError::AlreadyUsed(id) => StoreError::AlreadyUsed(id),
            DbError::UniqueViolation { field, value } => StoreError::Duplicate {
                entity: field,
                id: value,
            },
            DbError::ForeignKeyViolation { message } | DbError::CheckViolation { message } => {
                StoreError::Rejected(message)
            }
            other => {
                warn!(error = %other, "Database unavailable");
                StoreError::Unavailable(other.to_string())
            }
        }
    }
}

fn found<T>(row: Option<T>, entity: &str, id: &str) -> StoreResult<T> {
    row.ok_or_else(|| StoreError::not_found(entity, id))
}

#[async_trait]
impl TopupStore for Database {
    async fn list_games(&self) -> StoreResult<Vec<Game>> {
        Ok(self.catalog().list_active_games().await?)
    }

    async fn get_game(&self, id: &str) -> StoreResult<Game> {
        found(self.catalog().get_game(id).await?, "Game", id)
    }

    async fn get_game_by_slug(&self, slug: &str) -> StoreResult<Game> {
        found(self.catalog().get_game_by_slug(slug).await?, "Game", slug)
    }

    async fn list_products(&self, game_id: &str) -> StoreResult<Vec<Product>> {
        Ok(self.catalog().list_products_for_game(game_id).await?)
    }

    async fn get_product(&self, id: &str) -> StoreResult<Product> {
        found(self.catalog().get_product(id).await?, "Product", id)
    }

    async fn get_voucher(&self, id: &str) -> StoreResult<Voucher> {
        found(self.catalog().get_voucher(id).await?, "Voucher", id)
    }

    async fn list_vouchers(&self) -> StoreResult<Vec<Voucher>> {
        Ok(self.catalog().list_active_vouchers().await?)
    }

    async fn create_profile(&self, user_id: &str, name: &str) -> StoreResult<Profile> {
        Ok(self.profiles().create(user_id, name).await?)
    }

    async fn get_profile(&self, user_id: &str) -> StoreResult<Profile> {
        found(self.profiles().get(user_id).await?, "Profile", user_id)
    }

    async fn get_profile_balance(&self, user_id: &str) -> StoreResult<i64> {
        Ok(self.profiles().balance(user_id).await?)
    }

    async fn rename_profile(&self, user_id: &str, name: &str) -> StoreResult<Profile> {
        Ok(self.profiles().rename(user_id, name).await?)
    }

    async fn adjust_balance(&self, user_id: &str, delta: i64) -> StoreResult<i64> {
        Ok(self.profiles().adjust_balance(user_id, delta).await?)
    }

    async fn get_user_voucher(&self, id: &str, owner_id: &str) -> StoreResult<UserVoucher> {
        found(
            self.user_vouchers().get_owned(id, owner_id).await?,
            "UserVoucher",
            id,
        )
    }

    async fn list_user_vouchers(&self, user_id: &str) -> StoreResult<Vec<OwnedVoucher>> {
        Ok(self.user_vouchers().list_owned(user_id).await?)
    }

    async fn create_user_voucher(
        &self,
        user_id: &str,
        voucher_id: &str,
    ) -> StoreResult<UserVoucher> {
        let uv = UserVoucher::issue(user_id, voucher_id, Utc::now());
        self.user_vouchers().insert(&uv).await?;
        Ok(uv)
    }

    async fn mark_user_voucher_used(
        &self,
        id: &str,
        owner_id: &str,
        used_at: DateTime<Utc>,
    ) -> StoreResult<UserVoucher> {
        Ok(self.user_vouchers().mark_used(id, owner_id, used_at).await?)
    }

    async fn create_transaction(&self, record: &Transaction) -> StoreResult<String> {
        self.transactions().insert(record).await?;
        Ok(record.id.clone())
    }

    async fn recent_transactions(
        &self,
        user_id: &str,
        limit: u32,
    ) -> StoreResult<Vec<TransactionSummary>> {
        Ok(self.transactions().recent_for_user(user_id, limit).await?)
    }

    async fn redeem(&self, redemption: &Redemption) -> StoreResult<(i64, UserVoucher)> {
        Ok(self.ledger().redeem(redemption).await?)
    }

    async fn commit_purchase(&self, commit: &PurchaseCommit) -> StoreResult<Transaction> {
        Ok(self.ledger().commit_purchase(commit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_mapping() {
        let err: StoreError = DbError::AlreadyUsed("uv-1".into()).into();
        assert_eq!(err, StoreError::AlreadyUsed("uv-1".into()));

        let err: StoreError = DbError::InsufficientPoints {
            user_id: "user-1".into(),
            required: 100,
            available: 40,
        }
        .into();
        assert_eq!(
            err,
            StoreError::InsufficientPoints {
                required: 100,
                available: 40
            }
        );

        let err: StoreError = DbError::PoolExhausted.into();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_closed_database_is_unavailable() {
        let db = Database::new(topup_db::DbConfig::in_memory()).await.unwrap();
        db.close().await;

        let err = db.list_games().await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
