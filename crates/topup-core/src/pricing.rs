//! # Pricing Engine
//!
//! Turns a catalog price plus an optional voucher into the chargeable amount.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Checkout: "86 Diamonds" Rp 100.000, voucher "Diskon 20%" selected      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  compute_price(100000, Some(20%)) ← THIS MODULE                         │
//! │       │                                                                 │
//! │       ├── discount = round(100000 × 20 / 100) = 20000                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Final price: Rp 80.000 ──► loyalty::accrue_points ──► 8 points         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pure functions only: same inputs, same output, no hidden state.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::DiscountPercentage;

/// Computes the final chargeable amount.
///
/// Without a voucher the base price is returned unchanged. With one, the
/// discount amount is rounded half-up before subtraction. The percentage is
/// trusted as already validated. A zero base price yields zero.
///
/// ## Example
/// ```rust
/// use topup_core::money::Money;
/// use topup_core::pricing::compute_price;
/// use topup_core::types::DiscountPercentage;
///
/// let base = Money::from_units(100_000);
/// assert_eq!(compute_price(base, None), base);
///
/// let twenty = DiscountPercentage::try_new(20).unwrap();
/// assert_eq!(compute_price(base, Some(twenty)).units(), 80_000);
/// ```
pub fn compute_price(base_price: Money, voucher: Option<DiscountPercentage>) -> Money {
    match voucher {
        None => base_price,
        Some(discount) => base_price.apply_percentage_discount(discount.value()),
    }
}

/// Breakdown of a price computation, for checkout previews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Quote {
    pub base_price: Money,
    /// Percentage applied, `None` when no voucher was selected.
    pub discount_percentage: Option<DiscountPercentage>,
    /// Amount taken off the base price.
    pub discount: Money,
    pub final_price: Money,
}

/// Computes a [`Quote`]. `final_price` always equals [`compute_price`].
pub fn quote(base_price: Money, voucher: Option<DiscountPercentage>) -> Quote {
    let final_price = compute_price(base_price, voucher);
    Quote {
        base_price,
        discount_percentage: voucher,
        discount: base_price - final_price,
        final_price,
    }
}
