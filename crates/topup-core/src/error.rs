//! # Domain Errors
//!
//! ```text
//! ValidationError ─┐
//!                  ├─► CoreError ─► ServiceError (topup-service)
//! loyalty rules ───┘                     ▲
//!                        DbError ─► StoreError
//! ```

use thiserror::Error;

/// Business rule violations raised by the pricing and loyalty logic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Redemption attempted without enough loyalty points.
    ///
    /// ## User Workflow
    /// ```text
    /// Vault: Redeem "Diskon 20%" (100 poin)
    ///      │
    ///      ▼
    /// Check balance: available=50
    ///      │
    ///      ▼
    /// InsufficientPoints { required: 100, available: 50 }
    ///      │
    ///      ▼
    /// Balance stays at 50, no voucher issued
    /// ```
    #[error("Insufficient points: required {required}, available {available}")]
    InsufficientPoints { required: i64, available: i64 },

    /// A redeemed voucher instance has already been applied to a purchase.
    #[error("Voucher {0} has already been used")]
    VoucherAlreadyUsed(String),

    /// A redeemed voucher instance belongs to someone else.
    #[error("Voucher {0} is not owned by this user")]
    VoucherNotOwned(String),

    /// The voucher template is no longer offered for redemption.
    #[error("Voucher {0} is not active")]
    VoucherInactive(String),

    /// The product is no longer offered for purchase.
    #[error("Product {0} is not active")]
    ProductInactive(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Rejected input. Raised before any store call, so nothing is half-written.
///
/// Every variant names the offending `field` so a form can highlight it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} needs at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} allows at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Inclusive bounds.
    #[error("{field} must lie in {min}..={max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be greater than zero")]
    MustBePositive { field: String },

    #[error("{field} is malformed: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of {}", .allowed.join(", "))]
    NotAllowed { field: String, allowed: Vec<String> },
}

pub type CoreResult<T> = Result<T, CoreError>;
