//! # Service Errors
//!
//! What a caller of a flow sees. Every failure is returned synchronously;
//! nothing is retried and nothing is swallowed.

use thiserror::Error;

use crate::store::StoreError;
use topup_core::{CoreError, ValidationError};

/// Errors returned by [`TopupService`](crate::TopupService).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Malformed or missing input. Raised before any store call.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Referenced row missing, inactive, or owned by someone else.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Not enough loyalty points for the redemption.
    #[error("Insufficient points: required {required}, available {available}")]
    InsufficientPoints { required: i64, available: i64 },

    /// The redeemed voucher instance was already applied to a purchase.
    #[error("Voucher already used: {0}")]
    AlreadyUsed(String),

    /// The row being created already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store refused the write on a constraint. Retrying the same
    /// request fails the same way.
    #[error("Rejected by store: {0}")]
    Rejected(String),

    /// The store could not be reached or failed internally. Nothing is
    /// assumed to have been persisted.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl ServiceError {
    pub(crate) fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientPoints {
                required,
                available,
            } => ServiceError::InsufficientPoints {
                required,
                available,
            },
            CoreError::VoucherAlreadyUsed(id) => ServiceError::AlreadyUsed(id),
            CoreError::VoucherNotOwned(id) => ServiceError::not_found("UserVoucher", id),
            CoreError::VoucherInactive(id) => ServiceError::not_found("Voucher", id),
            CoreError::ProductInactive(id) => ServiceError::not_found("Product", id),
            CoreError::Validation(e) => ServiceError::Validation(e),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            StoreError::InsufficientPoints {
                required,
                available,
            } => ServiceError::InsufficientPoints {
                required,
                available,
            },
            StoreError::AlreadyUsed(id) => ServiceError::AlreadyUsed(id),
            StoreError::Duplicate { entity, id } => {
                ServiceError::Conflict(format!("{entity} already exists: {id}"))
            }
            StoreError::Rejected(msg) => ServiceError::Rejected(msg),
            StoreError::Unavailable(msg) => ServiceError::StoreUnavailable(msg),
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
