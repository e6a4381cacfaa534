//! # Loyalty Ledger
//!
//! Points accrual, points-for-voucher redemption and single-use voucher
//! consumption.
//!
//! ## Points Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Purchase completed (final price)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  accrue_points ──► +floor(price / 10000) ──► Profile.loyalty_points     │
//! │                                                     │                   │
//! │                                                     ▼                   │
//! │  Vault: redeem_voucher ──► -points_required ──► UserVoucher(Available)  │
//! │                                                     │                   │
//! │                                                     ▼                   │
//! │  Next purchase: ensure_applicable ──► consume ──► UserVoucher(Used)     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! These functions decide; they do not persist. The store applies the
//! decision atomically (see `topup-service`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{UserVoucher, Voucher};
use crate::POINTS_UNIT;

// =============================================================================
// Accrual
// =============================================================================

/// Points earned for a completed purchase.
///
/// One point per [`POINTS_UNIT`] spent, floor-rounded. Always called with the
/// final post-discount price. Non-positive totals earn nothing.
///
/// ## Example
/// ```rust
/// use topup_core::loyalty::accrue_points;
/// use topup_core::money::Money;
///
/// assert_eq!(accrue_points(Money::from_units(9_999)), 0);
/// assert_eq!(accrue_points(Money::from_units(10_000)), 1);
/// assert_eq!(accrue_points(Money::from_units(25_000)), 2);
/// ```
pub fn accrue_points(total_price: Money) -> i64 {
    if !total_price.is_positive() {
        return 0;
    }
    total_price.units() / POINTS_UNIT
}

// =============================================================================
// Redemption
// =============================================================================

/// Decision to exchange points for a voucher instance.
///
/// `new_balance` is what the balance becomes if nothing else touched it in
/// between. The store must apply `points_spent` as a conditional decrement,
/// not write `new_balance` back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Redemption {
    pub user_id: String,
    pub voucher_id: String,
    pub points_spent: i64,
    pub new_balance: i64,
    pub issued: UserVoucher,
}

/// Checks redemption eligibility and prepares the resulting state.
///
/// Fails with [`CoreError::InsufficientPoints`] when
/// `current_balance < points_required`, and with
/// [`CoreError::VoucherInactive`] for retired templates. There is no cap on
/// how many instances of one voucher a user may hold.
pub fn redeem_voucher(
    user_id: &str,
    current_balance: i64,
    voucher: &Voucher,
    at: DateTime<Utc>,
) -> CoreResult<Redemption> {
    if !voucher.is_active {
        return Err(CoreError::VoucherInactive(voucher.id.clone()));
    }

    let required = voucher.points_required.max(0);
    if current_balance < required {
        return Err(CoreError::InsufficientPoints {
            required,
            available: current_balance,
        });
    }

    Ok(Redemption {
        user_id: user_id.to_string(),
        voucher_id: voucher.id.clone(),
        points_spent: required,
        new_balance: current_balance - required,
        issued: UserVoucher::issue(user_id, &voucher.id, at),
    })
}

// =============================================================================
// Consumption
// =============================================================================

/// Checks that `user_id` may apply this voucher instance to a purchase.
pub fn ensure_applicable(user_voucher: &UserVoucher, user_id: &str) -> CoreResult<()> {
    if user_voucher.user_id != user_id {
        return Err(CoreError::VoucherNotOwned(user_voucher.id.clone()));
    }
    if !user_voucher.is_available() {
        return Err(CoreError::VoucherAlreadyUsed(user_voucher.id.clone()));
    }
    Ok(())
}

/// Transitions Available → Used and stamps `used_at`.
///
/// Terminal: a second call fails and leaves the record untouched.
pub fn consume(user_voucher: &mut UserVoucher, at: DateTime<Utc>) -> CoreResult<()> {
    if !user_voucher.is_available() {
        return Err(CoreError::VoucherAlreadyUsed(user_voucher.id.clone()));
    }
    user_voucher.is_used = true;
    user_voucher.used_at = Some(at);
    Ok(())
}
