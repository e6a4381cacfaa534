//! # Storage Collaborator
//!
//! Everything the orchestration needs from persistent storage.
//!
//! Single-row reads and writes mirror the storage contract one to one. The
//! two multi-row units, [`TopupStore::redeem`] and
//! [`TopupStore::commit_purchase`], must be atomic: either every write
//! lands or none does, and their guards are evaluated at write time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use topup_core::loyalty::Redemption;
use topup_core::{
    Game, OwnedVoucher, Product, Profile, Transaction, TransactionSummary, UserVoucher, Voucher,
};
use topup_db::PurchaseCommit;

// =============================================================================
// Store Error
// =============================================================================

/// Failures reported by a [`TopupStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The referenced row does not exist or is not visible to the caller.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A guarded balance decrement found too few points.
    #[error("Insufficient points: required {required}, available {available}")]
    InsufficientPoints { required: i64, available: i64 },

    /// A guarded voucher consumption found the instance already used.
    #[error("User voucher already used: {0}")]
    AlreadyUsed(String),

    /// A row with the same key already exists.
    #[error("{entity} already exists: {id}")]
    Duplicate { entity: String, id: String },

    /// The store refused the write (constraint violation).
    #[error("Rejected by store: {0}")]
    Rejected(String),

    /// The store could not be reached or failed internally.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Store Trait
// =============================================================================

/// Persistent storage behind [`TopupService`](crate::TopupService).
#[async_trait]
pub trait TopupStore: Send + Sync {
    // ---- catalog -----------------------------------------------------------

    /// Active games, ordered by name.
    async fn list_games(&self) -> StoreResult<Vec<Game>>;

    /// Game by id, active or not.
    async fn get_game(&self, id: &str) -> StoreResult<Game>;

    /// Active game by slug.
    async fn get_game_by_slug(&self, slug: &str) -> StoreResult<Game>;

    /// Active products of a game, cheapest first.
    async fn list_products(&self, game_id: &str) -> StoreResult<Vec<Product>>;

    /// Product by ID, active or not.
    async fn get_product(&self, id: &str) -> StoreResult<Product>;

    /// Voucher template by ID, active or not.
    async fn get_voucher(&self, id: &str) -> StoreResult<Voucher>;

    /// Active voucher templates, fewest points first.
    async fn list_vouchers(&self) -> StoreResult<Vec<Voucher>>;

    // ---- profiles ----------------------------------------------------------

    async fn create_profile(&self, user_id: &str, name: &str) -> StoreResult<Profile>;

    async fn get_profile(&self, user_id: &str) -> StoreResult<Profile>;

    async fn get_profile_balance(&self, user_id: &str) -> StoreResult<i64>;

    async fn rename_profile(&self, user_id: &str, name: &str) -> StoreResult<Profile>;

    /// Adds `delta` and returns the new balance. Rejects with
    /// [`StoreError::InsufficientPoints`] if the result would be negative.
    async fn adjust_balance(&self, user_id: &str, delta: i64) -> StoreResult<i64>;

    // ---- redeemed vouchers -------------------------------------------------

    /// Instance by ID, only if owned by `owner_id`.
    async fn get_user_voucher(&self, id: &str, owner_id: &str) -> StoreResult<UserVoucher>;

    /// Owned instances with templates, newest first.
    async fn list_user_vouchers(&self, user_id: &str) -> StoreResult<Vec<OwnedVoucher>>;

    /// Issues an Available instance without touching the balance.
    async fn create_user_voucher(&self, user_id: &str, voucher_id: &str)
        -> StoreResult<UserVoucher>;

    /// Available → Used, guarded on `is_used = false` at write time.
    async fn mark_user_voucher_used(
        &self,
        id: &str,
        owner_id: &str,
        used_at: DateTime<Utc>,
    ) -> StoreResult<UserVoucher>;

    // ---- transactions ------------------------------------------------------

    /// Stores a record as-is and returns its ID.
    async fn create_transaction(&self, record: &Transaction) -> StoreResult<String>;

    /// Most recent transactions of a user, newest first.
    async fn recent_transactions(
        &self,
        user_id: &str,
        limit: u32,
    ) -> StoreResult<Vec<TransactionSummary>>;

    // ---- atomic units ------------------------------------------------------

    /// Conditional decrement of `points_spent` plus insert of the issued
    /// instance. Returns the balance after the decrement.
    async fn redeem(&self, redemption: &Redemption) -> StoreResult<(i64, UserVoucher)>;

    /// Transaction insert, voucher consumption (if any), points credit and
    /// finalization to `Success`.
    async fn commit_purchase(&self, commit: &PurchaseCommit) -> StoreResult<Transaction>;
}
