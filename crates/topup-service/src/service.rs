//! # Top-up Service
//!
//! Orchestrates the storefront flows over a [`TopupStore`].
//!
//! ## Purchase Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  purchase(user_id, request)                                             │
//! │       │                                                                 │
//! │       ├── 1. validate request fields         (no store calls yet)       │
//! │       ├── 2. load product, must be active                               │
//! │       ├── 3. load user voucher, must be owned and Available             │
//! │       ├── 4. compute final price             (pricing::compute_price)   │
//! │       ├── 5. points = accrue_points(final)                              │
//! │       └── 6. store.commit_purchase           (one atomic unit)          │
//! │                 insert Pending → consume voucher → credit → Success     │
//! │                                                                         │
//! │  Success is reported only when step 6 returns Ok.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::store::TopupStore;
use topup_core::loyalty::{self, accrue_points};
use topup_core::pricing::{self, Quote};
use topup_core::validation::{
    validate_payment_method, validate_profile_name, validate_user_game_id, validate_uuid,
};
use topup_core::{
    CoreError, Game, OwnedVoucher, Product, Profile, Transaction, TransactionStatus,
    TransactionSummary, UserVoucher, ValidationError, Voucher, DEFAULT_HISTORY_LIMIT,
};
use topup_db::PurchaseCommit;

// =============================================================================
// Requests & Views
// =============================================================================

/// Raw checkout input, validated by [`TopupService::purchase`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseRequest {
    pub product_id: String,
    /// The player's account id inside the game.
    pub user_game_id: String,
    /// Wire name: `gopay`, `ovo`, `dana` or `bank`.
    pub payment_method: String,
    /// A previously redeemed, unused voucher instance.
    pub user_voucher_id: Option<String>,
}

/// Result of a completed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseReceipt {
    /// The stored record, status `Success`.
    pub transaction: Transaction,
    pub product: Product,
    pub quote: Quote,
    /// The consumed instance, now Used.
    pub consumed_voucher: Option<UserVoucher>,
}

/// Result of exchanging points for a voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RedemptionReceipt {
    pub user_voucher: UserVoucher,
    pub voucher: Voucher,
    pub points_spent: i64,
    pub new_balance: i64,
}

/// Everything the vault screen shows for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Vault {
    pub loyalty_points: i64,
    /// Templates that can be redeemed, fewest points first.
    pub available_vouchers: Vec<Voucher>,
    /// Redeemed instances, newest first.
    pub owned_vouchers: Vec<OwnedVoucher>,
    /// Recent purchases, newest first.
    pub history: Vec<TransactionSummary>,
}

/// A profile with its recent purchases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProfileView {
    pub profile: Profile,
    pub history: Vec<TransactionSummary>,
}

/// A game page: the game and its active packages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameProducts {
    pub game: Game,
    pub products: Vec<Product>,
}

// =============================================================================
// Service
// =============================================================================

/// Storefront flows. Every operation takes the acting user explicitly.
#[derive(Debug, Clone)]
pub struct TopupService<S> {
    store: S,
    history_limit: u32,
}

impl<S: TopupStore> TopupService<S> {
    /// Creates a service over `store`.
    pub fn new(store: S) -> Self {
        TopupService {
            store,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Sets how many transactions history views return.
    pub fn with_history_limit(mut self, limit: u32) -> Self {
        self.history_limit = limit;
        self
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // -------------------------------------------------------------------------
    // Browsing
    // -------------------------------------------------------------------------

    /// Active games, by name.
    pub async fn catalog(&self) -> ServiceResult<Vec<Game>> {
        Ok(self.store.list_games().await?)
    }

    /// A game and its active products, cheapest first.
    pub async fn game_products(&self, slug: &str) -> ServiceResult<GameProducts> {
        let game = self.store.get_game_by_slug(slug.trim()).await?;
        let products = self.store.list_products(&game.id).await?;
        Ok(GameProducts { game, products })
    }

    // -------------------------------------------------------------------------
    // Pricing
    // -------------------------------------------------------------------------

    /// Price preview for a checkout. No side effects.
    pub async fn quote(
        &self,
        user_id: &str,
        product_id: &str,
        user_voucher_id: Option<&str>,
    ) -> ServiceResult<Quote> {
        let user_id = require_user(user_id)?;
        validate_uuid("product_id", product_id)?;
        if let Some(id) = user_voucher_id {
            validate_uuid("user_voucher_id", id)?;
        }

        let product = self.active_product(product_id.trim()).await?;
        let voucher = match user_voucher_id {
            Some(id) => Some(self.applicable_voucher(user_id, id.trim()).await?.1),
            None => None,
        };

        Ok(pricing::quote(
            product.price(),
            voucher.map(|v| v.discount()),
        ))
    }

    /// Buys a product, optionally consuming a redeemed voucher.
    ///
    /// Nothing is persisted unless every step succeeds; the returned
    /// transaction is `Success` and already stored.
    #[instrument(skip(self, request), fields(product_id = %request.product_id))]
    pub async fn purchase(
        &self,
        user_id: &str,
        request: PurchaseRequest,
    ) -> ServiceResult<PurchaseReceipt> {
        // 1. Validate
        let user_id = require_user(user_id)?;
        validate_uuid("product_id", &request.product_id)?;
        let user_game_id = validate_user_game_id(&request.user_game_id)?;
        let payment_method = validate_payment_method(&request.payment_method)?;
        let user_voucher_id = match request.user_voucher_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => {
                validate_uuid("user_voucher_id", id)?;
                Some(id.to_string())
            }
            _ => None,
        };

        // 2. Product
        let product = self.active_product(request.product_id.trim()).await?;

        // 3. Voucher
        let selected = match &user_voucher_id {
            Some(id) => Some(self.applicable_voucher(user_id, id).await?),
            None => None,
        };

        // 4. Price, 5. points
        let quote = pricing::quote(
            product.price(),
            selected.as_ref().map(|(_, v)| v.discount()),
        );
        let points_earned = accrue_points(quote.final_price);

        debug!(
            base = %quote.base_price,
            final_price = %quote.final_price,
            points_earned,
            "Purchase priced"
        );

        // 6. Commit
        let now = Utc::now();
        let commit = PurchaseCommit {
            transaction: Transaction {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                game_id: product.game_id.clone(),
                product_id: product.id.clone(),
                user_game_id,
                user_voucher_id,
                payment_method,
                total_price: quote.final_price.units(),
                points_earned,
                status: TransactionStatus::Pending,
                created_at: now,
            },
            consumed_at: now,
        };

        let transaction = self.store.commit_purchase(&commit).await.map_err(|e| {
            warn!(user_id = %user_id, error = %e, "Purchase not committed");
            ServiceError::from(e)
        })?;

        let consumed_voucher = selected.map(|(mut uv, _)| {
            uv.is_used = true;
            uv.used_at = Some(commit.consumed_at);
            uv
        });

        info!(
            transaction_id = %transaction.id,
            user_id = %user_id,
            total = %transaction.total(),
            points_earned,
            "Purchase completed"
        );

        Ok(PurchaseReceipt {
            transaction,
            product,
            quote,
            consumed_voucher,
        })
    }

    // -------------------------------------------------------------------------
    // Loyalty
    // -------------------------------------------------------------------------

    /// Exchanges loyalty points for a new instance of `voucher_id`.
    ///
    /// The balance read here only decides eligibility; the store re-checks it
    /// when decrementing, so a concurrent spend surfaces as
    /// [`ServiceError::InsufficientPoints`] rather than a negative balance.
    #[instrument(skip(self))]
    pub async fn redeem_voucher(
        &self,
        user_id: &str,
        voucher_id: &str,
    ) -> ServiceResult<RedemptionReceipt> {
        let user_id = require_user(user_id)?;
        validate_uuid("voucher_id", voucher_id)?;

        let voucher = self.store.get_voucher(voucher_id.trim()).await?;
        let balance = self.store.get_profile_balance(user_id).await?;

        let redemption = loyalty::redeem_voucher(user_id, balance, &voucher, Utc::now())?;
        let points_spent = redemption.points_spent;
        let (new_balance, user_voucher) = self.store.redeem(&redemption).await?;

        info!(
            user_id = %user_id,
            voucher = %voucher.name,
            points_spent,
            new_balance,
            "Voucher redeemed"
        );

        Ok(RedemptionReceipt {
            user_voucher,
            voucher,
            points_spent,
            new_balance,
        })
    }

    /// Balance, redeemable templates, owned instances and recent purchases.
    pub async fn vault(&self, user_id: &str) -> ServiceResult<Vault> {
        let user_id = require_user(user_id)?;

        let loyalty_points = self.store.get_profile_balance(user_id).await?;
        let available_vouchers = self.store.list_vouchers().await?;
        let owned_vouchers = self.store.list_user_vouchers(user_id).await?;
        let history = self
            .store
            .recent_transactions(user_id, self.history_limit)
            .await?;

        Ok(Vault {
            loyalty_points,
            available_vouchers,
            owned_vouchers,
            history,
        })
    }

    // -------------------------------------------------------------------------
    // Profiles
    // -------------------------------------------------------------------------

    /// Creates a profile with a zero balance.
    pub async fn create_profile(&self, user_id: &str, name: &str) -> ServiceResult<Profile> {
        let user_id = require_user(user_id)?;
        let name = validate_profile_name(name)?;
        let profile = self.store.create_profile(user_id, &name).await?;
        info!(user_id = %user_id, "Profile created");
        Ok(profile)
    }

    /// A profile with its recent purchases.
    pub async fn profile(&self, user_id: &str) -> ServiceResult<ProfileView> {
        let user_id = require_user(user_id)?;
        let profile = self.store.get_profile(user_id).await?;
        let history = self
            .store
            .recent_transactions(user_id, self.history_limit)
            .await?;
        Ok(ProfileView { profile, history })
    }

    /// Changes the display name. The name is trimmed and must not be empty.
    pub async fn rename_profile(&self, user_id: &str, name: &str) -> ServiceResult<Profile> {
        let user_id = require_user(user_id)?;
        let name = validate_profile_name(name)?;
        Ok(self.store.rename_profile(user_id, &name).await?)
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    /// A product is on sale only while it and its game are both active.
    async fn active_product(&self, product_id: &str) -> ServiceResult<Product> {
        let product = self.store.get_product(product_id).await?;
        if !product.is_active {
            return Err(CoreError::ProductInactive(product.id).into());
        }
        let game = self.store.get_game(&product.game_id).await?;
        if !game.is_active {
            return Err(CoreError::ProductInactive(product.id).into());
        }
        Ok(product)
    }

    /// Loads an owned instance and its template, rejecting used ones.
    async fn applicable_voucher(
        &self,
        user_id: &str,
        user_voucher_id: &str,
    ) -> ServiceResult<(UserVoucher, Voucher)> {
        let uv = self.store.get_user_voucher(user_voucher_id, user_id).await?;
        loyalty::ensure_applicable(&uv, user_id)?;
        let voucher = self.store.get_voucher(&uv.voucher_id).await?;
        Ok((uv, voucher))
    }
}

/// Returns the trimmed acting user id.
fn require_user(user_id: &str) -> Result<&str, ValidationError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(ValidationError::Required {
            field: "user_id".to_string(),
        });
    }
    Ok(user_id)
}
