//! # Profile Repository
//!
//! Profiles and loyalty balances.
//!
//! ## Balance Writes
//! The balance is never written as an absolute value. Every change goes
//! through [`ProfileRepository::adjust_balance`], a single conditional
//! `UPDATE` that refuses to take the balance below zero.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use topup_core::Profile;

/// Repository for profile operations.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    /// Creates a new ProfileRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProfileRepository { pool }
    }

    /// Creates a profile with a zero balance.
    pub async fn create(&self, user_id: &str, name: &str) -> DbResult<Profile> {
        let now = Utc::now();
        let profile = Profile {
            id: user_id.to_string(),
            name: name.to_string(),
            loyalty_points: 0,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO profiles (id, name, loyalty_points, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.name)
        .bind(profile.loyalty_points)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("profile", user_id),
            other => other,
        })?;

        info!(user_id = %user_id, "Profile created");
        Ok(profile)
    }

    /// Gets a profile by user ID.
    pub async fn get(&self, user_id: &str) -> DbResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, name, loyalty_points, created_at, updated_at
            FROM profiles
            WHERE id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Reads the current loyalty balance.
    pub async fn balance(&self, user_id: &str) -> DbResult<i64> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT loyalty_points FROM profiles WHERE id = ?1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        balance.ok_or_else(|| DbError::not_found("Profile", user_id))
    }

    /// Renames a profile. The caller validates the name.
    pub async fn rename(&self, user_id: &str, name: &str) -> DbResult<Profile> {
        let result = sqlx::query("UPDATE profiles SET name = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(user_id)
            .bind(name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Profile", user_id));
        }

        debug!(user_id = %user_id, "Profile renamed");
        self.get(user_id)
            .await?
            .ok_or_else(|| DbError::not_found("Profile", user_id))
    }

    /// Adds `delta` to the balance and returns the new balance.
    ///
    /// A negative delta only applies when the balance covers it; otherwise
    /// nothing is written and [`DbError::InsufficientPoints`] reports the
    /// balance observed afterwards.
    pub async fn adjust_balance(&self, user_id: &str, delta: i64) -> DbResult<i64> {
        let new_balance: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE profiles
            SET loyalty_points = loyalty_points + ?2, updated_at = ?3
            WHERE id = ?1 AND loyalty_points + ?2 >= 0
            RETURNING loyalty_points
            "#,
        )
        .bind(user_id)
        .bind(delta)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match new_balance {
            Some(balance) => {
                debug!(user_id = %user_id, delta, balance, "Balance adjusted");
                Ok(balance)
            }
            None => {
                let available = self.balance(user_id).await?;
                Err(DbError::InsufficientPoints {
                    user_id: user_id.to_string(),
                    required: -delta,
                    available,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::empty_db;

    #[tokio::test]
    async fn test_create_and_get() {
        let db = empty_db().await;
        let created = db.profiles().create("user-1", "Rina").await.unwrap();
        assert_eq!(created.loyalty_points, 0);

        let loaded = db.profiles().get("user-1").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Rina");
        assert!(db.profiles().get("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate() {
        let db = empty_db().await;
        db.profiles().create("user-1", "Rina").await.unwrap();
        let err = db.profiles().create("user-1", "Again").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_balance_missing_profile() {
        let db = empty_db().await;
        let err = db.profiles().balance("ghost").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_adjust_balance_credit_and_debit() {
        let db = empty_db().await;
        db.profiles().create("user-1", "Rina").await.unwrap();

        assert_eq!(db.profiles().adjust_balance("user-1", 150).await.unwrap(), 150);
        assert_eq!(db.profiles().adjust_balance("user-1", -100).await.unwrap(), 50);
        assert_eq!(db.profiles().balance("user-1").await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_adjust_balance_never_negative() {
        let db = empty_db().await;
        db.profiles().create("user-1", "Rina").await.unwrap();
        db.profiles().adjust_balance("user-1", 50).await.unwrap();

        let err = db.profiles().adjust_balance("user-1", -100).await.unwrap_err();
        match err {
            DbError::InsufficientPoints {
                required,
                available,
                ..
            } => {
                assert_eq!(required, 100);
                assert_eq!(available, 50);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(db.profiles().balance("user-1").await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_adjust_balance_missing_profile() {
        let db = empty_db().await;
        let err = db.profiles().adjust_balance("ghost", 10).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_rename() {
        let db = empty_db().await;
        db.profiles().create("user-1", "Rina").await.unwrap();
        let renamed = db.profiles().rename("user-1", "Rina S.").await.unwrap();
        assert_eq!(renamed.name, "Rina S.");

        let err = db.profiles().rename("ghost", "x").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
