//! # Validation Module
//!
//! Input validation for purchase requests, profile edits and catalog seeding.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Presentation                                                 │
//! │  └── Immediate form feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: topup-service                                                │
//! │  └── THIS MODULE: runs before any store interaction                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (loyalty_points >= 0)                                       │
//! │  ├── CHECK (discount_percentage BETWEEN 0 AND 100)                     │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use topup_core::validation::{validate_user_game_id, validate_payment_method};
//! use topup_core::PaymentMethod;
//!
//! assert!(validate_user_game_id("12345678").is_ok());
//! assert_eq!(validate_payment_method("dana").unwrap(), PaymentMethod::Dana);
//! ```

use crate::error::ValidationError;
use crate::types::{DiscountPercentage, PaymentMethod};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Minimum length of an in-game account id.
pub const USER_GAME_ID_MIN: usize = 3;

/// Maximum length of an in-game account id.
pub const USER_GAME_ID_MAX: usize = 50;

/// Maximum length of a profile display name.
pub const PROFILE_NAME_MAX: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates the player's in-game account id and returns it trimmed.
///
/// ## Rules
/// - 3 to 50 characters after trimming
pub fn validate_user_game_id(user_game_id: &str) -> ValidationResult<String> {
    let trimmed = user_game_id.trim();
    let len = trimmed.chars().count();

    if len == 0 {
        return Err(ValidationError::Required {
            field: "user_game_id".to_string(),
        });
    }

    if len < USER_GAME_ID_MIN {
        return Err(ValidationError::TooShort {
            field: "user_game_id".to_string(),
            min: USER_GAME_ID_MIN,
        });
    }

    if len > USER_GAME_ID_MAX {
        return Err(ValidationError::TooLong {
            field: "user_game_id".to_string(),
            max: USER_GAME_ID_MAX,
        });
    }

    Ok(trimmed.to_string())
}

/// Validates a profile display name and returns it trimmed.
pub fn validate_profile_name(name: &str) -> ValidationResult<String> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if trimmed.chars().count() > PROFILE_NAME_MAX {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: PROFILE_NAME_MAX,
        });
    }

    Ok(trimmed.to_string())
}

/// Parses a payment method wire name.
pub fn validate_payment_method(method: &str) -> ValidationResult<PaymentMethod> {
    if method.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "payment_method".to_string(),
        });
    }
    method.parse()
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string for the named field.
///
/// ## Example
/// ```rust
/// use topup_core::validation::validate_uuid;
///
/// assert!(validate_uuid("product_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("product_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a product price. Catalog prices are strictly positive.
pub fn validate_price(price: i64) -> ValidationResult<()> {
    if price <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    Ok(())
}

/// Validates a voucher's point cost. Zero is allowed (free voucher).
pub fn validate_points_required(points: i64) -> ValidationResult<()> {
    if points < 0 {
        return Err(ValidationError::OutOfRange {
            field: "points_required".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a discount percentage coming from catalog input.
pub fn validate_discount_percentage(percent: i64) -> ValidationResult<DiscountPercentage> {
    let out_of_range = || ValidationError::OutOfRange {
        field: "discount_percentage".to_string(),
        min: 0,
        max: DiscountPercentage::MAX as i64,
    };
    let raw = u8::try_from(percent).map_err(|_| out_of_range())?;
    DiscountPercentage::try_new(raw).map_err(|_| out_of_range())
}
