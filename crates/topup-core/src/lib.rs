//! # topup-core: Pure Business Logic for the Top-up Storefront
//!
//! Everything here is a deterministic function of its inputs. Persistence,
//! authentication and presentation live in other crates.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Top-up Storefront Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Presentation (web / CLI / batch)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │           topup-service (purchase / redemption flow)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ topup-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  pricing  │  │  loyalty  │  │ validation│  │   │
//! │  │   │  Product  │  │  Quote    │  │  accrue   │  │   rules   │  │   │
//! │  │   │  Voucher  │  │  compute  │  │  redeem   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Catalog, loyalty and transaction records
//! - [`money`] - Integer money in the smallest currency unit
//! - [`pricing`] - Pricing Engine (voucher discount application)
//! - [`loyalty`] - Loyalty Ledger (accrual, redemption, consumption)
//! - [`validation`] - Purchase and catalog input rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use topup_core::money::Money;
//! use topup_core::pricing::compute_price;
//! use topup_core::loyalty::accrue_points;
//! use topup_core::types::DiscountPercentage;
//!
//! let base = Money::from_units(100_000);
//! let twenty = DiscountPercentage::try_new(20).unwrap();
//!
//! let total = compute_price(base, Some(twenty));
//! assert_eq!(total.units(), 80_000);
//! assert_eq!(accrue_points(total), 8);
//! ```

pub mod error;
pub mod loyalty;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

/// Currency units spent per loyalty point earned.
///
/// Partial units do not earn a point: 9,999 spent earns nothing.
pub const POINTS_UNIT: i64 = 10_000;

/// Number of transactions shown in a user's recent history by default.
pub const DEFAULT_HISTORY_LIMIT: u32 = 10;
