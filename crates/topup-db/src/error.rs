//! # Database Errors
//!
//! ```text
//! sqlx::Error ──► DbError ──► StoreError (topup-service)
//! ```
//!
//! Constraint failures keep their own variants because the ledger turns some
//! of them into domain outcomes: a UNIQUE hit on
//! `transactions.user_voucher_id` means the voucher was already spent.

use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// No row with this id, or not one the caller may see.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A guarded decrement found the balance too low at write time.
    #[error("Insufficient points for {user_id}: required {required}, available {available}")]
    InsufficientPoints {
        user_id: String,
        required: i64,
        available: i64,
    },

    /// A guarded `is_used = 0` flip matched nothing.
    #[error("User voucher already used: {0}")]
    AlreadyUsed(String),

    /// `field` is the constrained column as SQLite reports it, e.g. `games.slug`.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True when the database itself failed, as opposed to the request.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            DbError::ConnectionFailed(_)
                | DbError::MigrationFailed(_)
                | DbError::QueryFailed(_)
                | DbError::PoolExhausted
                | DbError::Internal(_)
        )
    }
}

/// `"UNIQUE constraint failed: games.slug"` → `"games.slug"`.
fn constrained_column(message: &str) -> &str {
    message
        .split_once(": ")
        .map(|(_, column)| column.trim())
        .unwrap_or(message)
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            sqlx::Error::Io(e) => DbError::ConnectionFailed(e.to_string()),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => {
                        DbError::duplicate(constrained_column(&message), "unknown")
                    }
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message },
                    ErrorKind::CheckViolation => DbError::CheckViolation { message },
                    _ => DbError::QueryFailed(message),
                }
            }
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = DbError::not_found("Product", "p-1");
        assert_eq!(err.to_string(), "Product not found: p-1");
        assert!(!err.is_unavailable());
    }

    #[test]
    fn test_unavailable_classification() {
        assert!(DbError::PoolExhausted.is_unavailable());
        assert!(DbError::ConnectionFailed("gone".into()).is_unavailable());
        assert!(!DbError::AlreadyUsed("uv-1".into()).is_unavailable());
    }

    #[test]
    fn test_constrained_column() {
        assert_eq!(
            constrained_column("UNIQUE constraint failed: transactions.user_voucher_id"),
            "transactions.user_voucher_id"
        );
        assert_eq!(constrained_column("odd message"), "odd message");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
