//! # In-Memory Store
//!
//! A [`TopupStore`] over mutex-guarded maps, for tests and demos.
//!
//! Each atomic unit runs under one lock acquisition, which gives the same
//! all-or-nothing behavior as the SQLite ledger. [`MemoryStore::set_unavailable`]
//! and [`MemoryStore::fail_commits`] inject store failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::store::{StoreError, StoreResult, TopupStore};
use topup_core::loyalty::Redemption;
use topup_core::{
    Game, OwnedVoucher, Product, Profile, Transaction, TransactionStatus, TransactionSummary,
    UserVoucher, Voucher,
};
use topup_db::PurchaseCommit;

#[derive(Debug, Default)]
struct MemoryState {
    games: HashMap<String, Game>,
    products: HashMap<String, Product>,
    vouchers: HashMap<String, Voucher>,
    profiles: HashMap<String, Profile>,
    user_vouchers: HashMap<String, UserVoucher>,
    transactions: HashMap<String, Transaction>,
}

impl MemoryState {
    fn profile_mut(&mut self, user_id: &str) -> StoreResult<&mut Profile> {
        self.profiles
            .get_mut(user_id)
            .ok_or_else(|| StoreError::not_found("Profile", user_id))
    }

    fn owned_voucher_mut(&mut self, id: &str, owner_id: &str) -> StoreResult<&mut UserVoucher> {
        self.user_vouchers
            .get_mut(id)
            .filter(|uv| uv.user_id == owner_id)
            .ok_or_else(|| StoreError::not_found("UserVoucher", id))
    }
}

/// In-memory [`TopupStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    unavailable: AtomicBool,
    fail_commits: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes [`TopupStore::commit_purchase`] fail without writing anything.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Adds a game to the catalog.
    pub fn insert_game(&self, game: Game) -> StoreResult<()> {
        self.state()?.games.insert(game.id.clone(), game);
        Ok(())
    }

    /// Adds a product to the catalog.
    pub fn insert_product(&self, product: Product) -> StoreResult<()> {
        self.state()?.products.insert(product.id.clone(), product);
        Ok(())
    }

    /// Adds a voucher template to the catalog.
    pub fn insert_voucher(&self, voucher: Voucher) -> StoreResult<()> {
        self.state()?.vouchers.insert(voucher.id.clone(), voucher);
        Ok(())
    }

    /// Number of stored transactions, any status.
    pub fn transaction_count(&self) -> StoreResult<usize> {
        Ok(self.state()?.transactions.len())
    }

    /// Catalog setup and inspection ignore the offline flag.
    fn state(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".to_string()))
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        self.state()
    }
}

#[async_trait]
impl TopupStore for MemoryStore {
    async fn list_games(&self) -> StoreResult<Vec<Game>> {
        let state = self.lock()?;
        let mut games: Vec<Game> = state.games.values().filter(|g| g.is_active).cloned().collect();
        games.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(games)
    }

    async fn get_game(&self, id: &str) -> StoreResult<Game> {
        let state = self.lock()?;
        state
            .games
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Game", id))
    }

    async fn get_game_by_slug(&self, slug: &str) -> StoreResult<Game> {
        let state = self.lock()?;
        state
            .games
            .values()
            .find(|g| g.slug == slug && g.is_active)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Game", slug))
    }

    async fn list_products(&self, game_id: &str) -> StoreResult<Vec<Product>> {
        let state = self.lock()?;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| p.game_id == game_id && p.is_active)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.name.cmp(&b.name)));
        Ok(products)
    }

    async fn get_product(&self, id: &str) -> StoreResult<Product> {
        let state = self.lock()?;
        state
            .products
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Product", id))
    }

    async fn get_voucher(&self, id: &str) -> StoreResult<Voucher> {
        let state = self.lock()?;
        state
            .vouchers
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Voucher", id))
    }

    async fn list_vouchers(&self) -> StoreResult<Vec<Voucher>> {
        let state = self.lock()?;
        let mut vouchers: Vec<Voucher> = state
            .vouchers
            .values()
            .filter(|v| v.is_active)
            .cloned()
            .collect();
        vouchers.sort_by(|a, b| {
            a.points_required
                .cmp(&b.points_required)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(vouchers)
    }

    async fn create_profile(&self, user_id: &str, name: &str) -> StoreResult<Profile> {
        let mut state = self.lock()?;
        if state.profiles.contains_key(user_id) {
            return Err(StoreError::Duplicate {
                entity: "profile".to_string(),
                id: user_id.to_string(),
            });
        }
        let now = Utc::now();
        let profile = Profile {
            id: user_id.to_string(),
            name: name.to_string(),
            loyalty_points: 0,
            created_at: now,
            updated_at: now,
        };
        state.profiles.insert(user_id.to_string(), profile.clone());
        Ok(profile)
    }

    async fn get_profile(&self, user_id: &str) -> StoreResult<Profile> {
        let mut state = self.lock()?;
        state.profile_mut(user_id).map(|p| p.clone())
    }

    async fn get_profile_balance(&self, user_id: &str) -> StoreResult<i64> {
        let mut state = self.lock()?;
        state.profile_mut(user_id).map(|p| p.loyalty_points)
    }

    async fn rename_profile(&self, user_id: &str, name: &str) -> StoreResult<Profile> {
        let mut state = self.lock()?;
        let profile = state.profile_mut(user_id)?;
        profile.name = name.to_string();
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn adjust_balance(&self, user_id: &str, delta: i64) -> StoreResult<i64> {
        let mut state = self.lock()?;
        let profile = state.profile_mut(user_id)?;
        let next = profile.loyalty_points + delta;
        if next < 0 {
            return Err(StoreError::InsufficientPoints {
                required: -delta,
                available: profile.loyalty_points,
            });
        }
        profile.loyalty_points = next;
        profile.updated_at = Utc::now();
        Ok(next)
    }

    async fn get_user_voucher(&self, id: &str, owner_id: &str) -> StoreResult<UserVoucher> {
        let mut state = self.lock()?;
        state.owned_voucher_mut(id, owner_id).map(|uv| uv.clone())
    }

    async fn list_user_vouchers(&self, user_id: &str) -> StoreResult<Vec<OwnedVoucher>> {
        let state = self.lock()?;
        let mut owned: Vec<OwnedVoucher> = state
            .user_vouchers
            .values()
            .filter(|uv| uv.user_id == user_id)
            .filter_map(|uv| {
                state.vouchers.get(&uv.voucher_id).map(|v| OwnedVoucher {
                    user_voucher: uv.clone(),
                    voucher: v.clone(),
                })
            })
            .collect();
        owned.sort_by(|a, b| b.user_voucher.created_at.cmp(&a.user_voucher.created_at));
        Ok(owned)
    }

    async fn create_user_voucher(
        &self,
        user_id: &str,
        voucher_id: &str,
    ) -> StoreResult<UserVoucher> {
        let mut state = self.lock()?;
        if !state.profiles.contains_key(user_id) {
            return Err(StoreError::not_found("Profile", user_id));
        }
        if !state.vouchers.contains_key(voucher_id) {
            return Err(StoreError::not_found("Voucher", voucher_id));
        }
        let uv = UserVoucher::issue(user_id, voucher_id, Utc::now());
        state.user_vouchers.insert(uv.id.clone(), uv.clone());
        Ok(uv)
    }

    async fn mark_user_voucher_used(
        &self,
        id: &str,
        owner_id: &str,
        used_at: DateTime<Utc>,
    ) -> StoreResult<UserVoucher> {
        let mut state = self.lock()?;
        let uv = state.owned_voucher_mut(id, owner_id)?;
        if uv.is_used {
            return Err(StoreError::AlreadyUsed(id.to_string()));
        }
        uv.is_used = true;
        uv.used_at = Some(used_at);
        Ok(uv.clone())
    }

    async fn create_transaction(&self, record: &Transaction) -> StoreResult<String> {
        let mut state = self.lock()?;
        if state.transactions.contains_key(&record.id) {
            return Err(StoreError::Duplicate {
                entity: "transaction".to_string(),
                id: record.id.clone(),
            });
        }
        state
            .transactions
            .insert(record.id.clone(), record.clone());
        Ok(record.id.clone())
    }

    async fn recent_transactions(
        &self,
        user_id: &str,
        limit: u32,
    ) -> StoreResult<Vec<TransactionSummary>> {
        let state = self.lock()?;
        let mut rows: Vec<TransactionSummary> = state
            .transactions
            .values()
            .filter(|t| t.user_id == user_id)
            .map(|t| TransactionSummary {
                transaction: t.clone(),
                game_name: state
                    .games
                    .get(&t.game_id)
                    .map(|g| g.name.clone())
                    .unwrap_or_default(),
                product_name: state
                    .products
                    .get(&t.product_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
            })
            .collect();
        rows.sort_by(|a, b| b.transaction.created_at.cmp(&a.transaction.created_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn redeem(&self, redemption: &Redemption) -> StoreResult<(i64, UserVoucher)> {
        let mut state = self.lock()?;
        if !state.vouchers.contains_key(&redemption.voucher_id) {
            return Err(StoreError::not_found("Voucher", &redemption.voucher_id));
        }

        let profile = state.profile_mut(&redemption.user_id)?;
        if profile.loyalty_points < redemption.points_spent {
            return Err(StoreError::InsufficientPoints {
                required: redemption.points_spent,
                available: profile.loyalty_points,
            });
        }
        profile.loyalty_points -= redemption.points_spent;
        profile.updated_at = redemption.issued.created_at;
        let balance = profile.loyalty_points;

        let uv = redemption.issued.clone();
        state.user_vouchers.insert(uv.id.clone(), uv.clone());
        Ok((balance, uv))
    }

    async fn commit_purchase(&self, commit: &PurchaseCommit) -> StoreResult<Transaction> {
        let mut state = self.lock()?;
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("commit failed".to_string()));
        }

        let txn = &commit.transaction;
        if state.transactions.contains_key(&txn.id) {
            return Err(StoreError::Duplicate {
                entity: "transaction".to_string(),
                id: txn.id.clone(),
            });
        }
        // Check every guard before the first write.
        if !state.profiles.contains_key(&txn.user_id) {
            return Err(StoreError::not_found("Profile", &txn.user_id));
        }
        if let Some(uv_id) = &txn.user_voucher_id {
            let uv = state.owned_voucher_mut(uv_id, &txn.user_id)?;
            if uv.is_used {
                return Err(StoreError::AlreadyUsed(uv_id.clone()));
            }
            uv.is_used = true;
            uv.used_at = Some(commit.consumed_at);
        }

        let profile = state.profile_mut(&txn.user_id)?;
        profile.loyalty_points += txn.points_earned;
        profile.updated_at = txn.created_at;

        let committed = Transaction {
            status: TransactionStatus::Success,
            ..txn.clone()
        };
        state
            .transactions
            .insert(committed.id.clone(), committed.clone());
        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topup_core::PaymentMethod;

    fn voucher() -> Voucher {
        Voucher {
            id: "v-20".to_string(),
            name: "Diskon 20%".to_string(),
            description: None,
            discount_percentage: 20,
            points_required: 100,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn transaction(id: &str, total_price: i64, status: TransactionStatus) -> Transaction {
        Transaction {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            game_id: "g-1".to_string(),
            product_id: "p-1".to_string(),
            user_game_id: "12345".to_string(),
            user_voucher_id: None,
            payment_method: PaymentMethod::Dana,
            total_price,
            points_earned: total_price / 10_000,
            status,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_adjust_balance_guard() {
        let store = MemoryStore::new();
        store.create_profile("user-1", "Rina").await.unwrap();

        assert_eq!(store.adjust_balance("user-1", 30).await.unwrap(), 30);
        let err = store.adjust_balance("user-1", -40).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::InsufficientPoints {
                required: 40,
                available: 30
            }
        );
        assert_eq!(store.get_profile_balance("user-1").await.unwrap(), 30);
    }

    #[tokio::test]
    async fn test_mark_used_twice() {
        let store = MemoryStore::new();
        store.insert_voucher(voucher()).unwrap();
        store.create_profile("user-1", "Rina").await.unwrap();
        let uv = store.create_user_voucher("user-1", "v-20").await.unwrap();

        store
            .mark_user_voucher_used(&uv.id, "user-1", Utc::now())
            .await
            .unwrap();
        let err = store
            .mark_user_voucher_used(&uv.id, "user-1", Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::AlreadyUsed(uv.id.clone()));

        let err = store.get_user_voucher(&uv.id, "user-2").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_transaction_records_are_immutable() {
        let store = MemoryStore::new();
        let original = transaction("t-1", 80_000, TransactionStatus::Success);
        store.create_transaction(&original).await.unwrap();

        let err = store
            .create_transaction(&transaction("t-1", 1, TransactionStatus::Failed))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::Duplicate {
                entity: "transaction".to_string(),
                id: "t-1".to_string()
            }
        );

        let history = store.recent_transactions("user-1", 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].transaction, original);
    }

    #[tokio::test]
    async fn test_catalog_setup_ignores_offline_flag() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        store.insert_voucher(voucher()).unwrap();
        assert_eq!(store.transaction_count().unwrap(), 0);

        store.set_unavailable(false);
        assert_eq!(store.list_vouchers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_store() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        let err = store.list_games().await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));

        store.set_unavailable(false);
        assert!(store.list_games().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_commit_writes_nothing() {
        let store = MemoryStore::new();
        store.create_profile("user-1", "Rina").await.unwrap();
        store.fail_commits(true);

        let txn = transaction("t-1", 50_000, TransactionStatus::Pending);
        let err = store
            .commit_purchase(&PurchaseCommit {
                transaction: txn,
                consumed_at: Utc::now(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.transaction_count().unwrap(), 0);
        assert_eq!(store.get_profile_balance("user-1").await.unwrap(), 0);
    }
}
