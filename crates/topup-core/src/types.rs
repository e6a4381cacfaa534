//! # Domain Types
//!
//! Core domain types for the top-up storefront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog (read-only here)          Loyalty (mutable, per user)         │
//! │  ┌─────────────────┐               ┌─────────────────┐                 │
//! │  │      Game       │               │     Profile     │                 │
//! │  │  ─────────────  │               │  ─────────────  │                 │
//! │  │  id, slug       │               │  loyalty_points │                 │
//! │  └────────┬────────┘               └────────┬────────┘                 │
//! │           │ 1..n                            │ 1..n                      │
//! │  ┌────────▼────────┐               ┌────────▼────────┐                 │
//! │  │    Product      │               │   UserVoucher   │                 │
//! │  │  price          │               │  is_used        │                 │
//! │  │  currency_amount│               │  used_at        │                 │
//! │  └─────────────────┘               └────────┬────────┘                 │
//! │                                             │ n..1                      │
//! │  ┌─────────────────┐               ┌────────▼────────┐                 │
//! │  │  Transaction    │               │     Voucher     │                 │
//! │  │  total_price    │               │  discount %     │                 │
//! │  │  points_earned  │               │  points_required│                 │
//! │  └─────────────────┘               └─────────────────┘                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Discount Percentage
// =============================================================================

/// Whole-number discount percentage in `0..=100`.
///
/// Validation happens once, when the catalog entry is created. The Pricing
/// Engine trusts any value of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, TS)]
#[ts(export)]
pub struct DiscountPercentage(u8);

impl DiscountPercentage {
    /// Largest allowed percentage.
    pub const MAX: u8 = 100;

    /// Creates a discount percentage, rejecting values above 100.
    pub fn try_new(percent: u8) -> Result<Self, ValidationError> {
        if percent > Self::MAX {
            return Err(ValidationError::OutOfRange {
                field: "discount_percentage".to_string(),
                min: 0,
                max: Self::MAX as i64,
            });
        }
        Ok(DiscountPercentage(percent))
    }

    /// No discount.
    #[inline]
    pub const fn zero() -> Self {
        DiscountPercentage(0)
    }

    /// Returns the raw percentage.
    #[inline]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for DiscountPercentage {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        DiscountPercentage::try_new(value)
    }
}

impl From<DiscountPercentage> for u8 {
    fn from(value: DiscountPercentage) -> Self {
        value.0
    }
}

impl<'de> Deserialize<'de> for DiscountPercentage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = u8::deserialize(deserializer)?;
        DiscountPercentage::try_new(raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for DiscountPercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

// =============================================================================
// Game
// =============================================================================

/// A game listed in the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Game {
    pub id: String,
    pub name: String,
    /// URL-safe identifier used by the storefront (`/games/{slug}`).
    pub slug: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A purchasable in-game currency package. Immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub game_id: String,
    /// Display name, e.g. "86 Diamonds".
    pub name: String,
    /// Price in the smallest currency unit. Always positive.
    pub price: i64,
    /// Amount of in-game currency delivered.
    pub currency_amount: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_units(self.price)
    }
}

// =============================================================================
// Voucher (template)
// =============================================================================

/// Catalog definition of a discount, shared by every user who redeems it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Voucher {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Discount in whole percent, `0..=100`.
    pub discount_percentage: u8,
    /// Loyalty points spent to redeem one instance.
    pub points_required: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Voucher {
    /// Returns the discount this voucher grants.
    ///
    /// The catalog guarantees `0..=100`; the clamp keeps the pricing result
    /// inside `[0, base]` even for a corrupted row.
    #[inline]
    pub fn discount(&self) -> DiscountPercentage {
        DiscountPercentage(self.discount_percentage.min(DiscountPercentage::MAX))
    }
}

// =============================================================================
// User Voucher (redeemed instance)
// =============================================================================

/// Lifecycle of a redeemed voucher instance.
///
/// ```text
///   redeem ──► Available ──(applied to completed purchase)──► Used
/// ```
/// There is no way back from `Used`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum VoucherState {
    Available,
    Used,
}

/// One user's single-use claim on a voucher template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct UserVoucher {
    pub id: String,
    pub user_id: String,
    pub voucher_id: String,
    pub is_used: bool,
    #[ts(as = "Option<String>")]
    pub used_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl UserVoucher {
    /// Issues a fresh, Available instance of `voucher_id` to `user_id`.
    pub fn issue(user_id: &str, voucher_id: &str, issued_at: DateTime<Utc>) -> Self {
        UserVoucher {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            voucher_id: voucher_id.to_string(),
            is_used: false,
            used_at: None,
            created_at: issued_at,
        }
    }

    /// Returns the lifecycle state.
    #[inline]
    pub fn state(&self) -> VoucherState {
        if self.is_used {
            VoucherState::Used
        } else {
            VoucherState::Available
        }
    }

    /// Checks if the instance can still be applied.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.state() == VoucherState::Available
    }
}

/// A redeemed instance together with its template, as shown in the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OwnedVoucher {
    pub user_voucher: UserVoucher,
    pub voucher: Voucher,
}

// =============================================================================
// Profile
// =============================================================================

/// A user's profile and loyalty balance. `id` equals the user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Profile {
    pub id: String,
    pub name: String,
    /// Never negative.
    pub loyalty_points: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Payment Method
// =============================================================================

/// Simulated payment methods offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum PaymentMethod {
    #[serde(rename = "gopay")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "gopay"))]
    GoPay,
    #[serde(rename = "ovo")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "ovo"))]
    Ovo,
    #[serde(rename = "dana")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "dana"))]
    Dana,
    #[serde(rename = "bank")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "bank"))]
    BankTransfer,
}

impl PaymentMethod {
    /// All methods in checkout display order.
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::GoPay,
        PaymentMethod::Ovo,
        PaymentMethod::Dana,
        PaymentMethod::BankTransfer,
    ];

    /// Wire name stored in the database and accepted from callers.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::GoPay => "gopay",
            PaymentMethod::Ovo => "ovo",
            PaymentMethod::Dana => "dana",
            PaymentMethod::BankTransfer => "bank",
        }
    }

    /// Name shown at checkout.
    pub const fn display_name(&self) -> &'static str {
        match self {
            PaymentMethod::GoPay => "GoPay",
            PaymentMethod::Ovo => "OVO",
            PaymentMethod::Dana => "DANA",
            PaymentMethod::BankTransfer => "Transfer Bank",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// Outcome of a purchase attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Recorded, but not every mutation is confirmed yet.
    Pending,
    /// Price persisted, voucher consumed (if any), points credited.
    Success,
    /// The attempt was rejected.
    Failed,
}

impl Default for TransactionStatus {
    fn default() -> Self {
        TransactionStatus::Pending
    }
}

/// One purchase attempt and its outcome. Immutable once finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub game_id: String,
    pub product_id: String,
    /// The player's account id inside the game.
    pub user_game_id: String,
    /// The redeemed voucher instance consumed by this purchase, if any.
    pub user_voucher_id: Option<String>,
    pub payment_method: PaymentMethod,
    /// Final, post-discount price.
    pub total_price: i64,
    pub points_earned: i64,
    pub status: TransactionStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Returns the charged amount as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_units(self.total_price)
    }
}

/// A transaction with the catalog names needed for history listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransactionSummary {
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub transaction: Transaction,
    pub game_name: String,
    pub product_name: String,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn voucher(discount: u8) -> Voucher {
        Voucher {
            id: "v-1".to_string(),
            name: "Diskon".to_string(),
            description: None,
            discount_percentage: discount,
            points_required: 100,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_discount_percentage_bounds() {
        assert_eq!(DiscountPercentage::try_new(0).unwrap().value(), 0);
        assert_eq!(DiscountPercentage::try_new(100).unwrap().value(), 100);
        assert!(DiscountPercentage::try_new(101).is_err());
    }

    #[test]
    fn test_discount_percentage_serde_rejects_out_of_range() {
        let ok: DiscountPercentage = serde_json::from_str("25").unwrap();
        assert_eq!(ok.value(), 25);
        assert!(serde_json::from_str::<DiscountPercentage>("150").is_err());
    }

    #[test]
    fn test_voucher_discount_is_clamped() {
        assert_eq!(voucher(20).discount().value(), 20);
        assert_eq!(voucher(250).discount().value(), 100);
    }

    #[test]
    fn test_issued_voucher_starts_available() {
        let uv = UserVoucher::issue("user-1", "v-1", Utc::now());
        assert_eq!(uv.state(), VoucherState::Available);
        assert!(uv.used_at.is_none());
        assert_eq!(uv.user_id, "user-1");

        let other = UserVoucher::issue("user-1", "v-1", Utc::now());
        assert_ne!(uv.id, other.id);
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("gopay".parse::<PaymentMethod>().unwrap(), PaymentMethod::GoPay);
        assert_eq!(" OVO ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Ovo);
        assert_eq!(
            "bank".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::BankTransfer
        );

        let err = "cash".parse::<PaymentMethod>().unwrap_err();
        assert!(matches!(err, ValidationError::NotAllowed { .. }));
    }

    #[test]
    fn test_payment_method_serde_matches_wire_name() {
        for method in PaymentMethod::ALL {
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.as_str()));
        }
    }

    #[test]
    fn test_transaction_status_default() {
        assert_eq!(TransactionStatus::default(), TransactionStatus::Pending);
    }
}
