//! # User Voucher Repository
//!
//! Redeemed voucher instances. Each row is a single-use claim; the only
//! mutation after insert is the Available → Used flip in [`mark_used`].
//!
//! [`mark_used`]: UserVoucherRepository::mark_used

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use topup_core::{OwnedVoucher, UserVoucher, Voucher};

/// Vault listing row: instance columns plus the joined template.
#[derive(Debug, FromRow)]
struct OwnedVoucherRow {
    id: String,
    user_id: String,
    voucher_id: String,
    is_used: bool,
    used_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    voucher_name: String,
    voucher_description: Option<String>,
    discount_percentage: u8,
    points_required: i64,
    voucher_is_active: bool,
    voucher_created_at: DateTime<Utc>,
}

impl From<OwnedVoucherRow> for OwnedVoucher {
    fn from(row: OwnedVoucherRow) -> Self {
        OwnedVoucher {
            voucher: Voucher {
                id: row.voucher_id.clone(),
                name: row.voucher_name,
                description: row.voucher_description,
                discount_percentage: row.discount_percentage,
                points_required: row.points_required,
                is_active: row.voucher_is_active,
                created_at: row.voucher_created_at,
            },
            user_voucher: UserVoucher {
                id: row.id,
                user_id: row.user_id,
                voucher_id: row.voucher_id,
                is_used: row.is_used,
                used_at: row.used_at,
                created_at: row.created_at,
            },
        }
    }
}

/// Repository for redeemed voucher instances.
#[derive(Debug, Clone)]
pub struct UserVoucherRepository {
    pool: SqlitePool,
}

impl UserVoucherRepository {
    /// Creates a new UserVoucherRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserVoucherRepository { pool }
    }

    /// Gets an instance by ID regardless of owner.
    pub async fn get(&self, id: &str) -> DbResult<Option<UserVoucher>> {
        let uv = sqlx::query_as::<_, UserVoucher>(
            r#"
            SELECT id, user_id, voucher_id, is_used, used_at, created_at
            FROM user_vouchers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(uv)
    }

    /// Gets an instance only if `user_id` owns it.
    pub async fn get_owned(&self, id: &str, user_id: &str) -> DbResult<Option<UserVoucher>> {
        let uv = sqlx::query_as::<_, UserVoucher>(
            r#"
            SELECT id, user_id, voucher_id, is_used, used_at, created_at
            FROM user_vouchers
            WHERE id = ?1 AND user_id = ?2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(uv)
    }

    /// Lists a user's instances with their templates, newest first.
    pub async fn list_owned(&self, user_id: &str) -> DbResult<Vec<OwnedVoucher>> {
        let rows = sqlx::query_as::<_, OwnedVoucherRow>(
            r#"
            SELECT
                uv.id, uv.user_id, uv.voucher_id, uv.is_used, uv.used_at, uv.created_at,
                v.name AS voucher_name,
                v.description AS voucher_description,
                v.discount_percentage,
                v.points_required,
                v.is_active AS voucher_is_active,
                v.created_at AS voucher_created_at
            FROM user_vouchers uv
            JOIN vouchers v ON v.id = uv.voucher_id
            WHERE uv.user_id = ?1
            ORDER BY uv.created_at DESC, uv.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(user_id = %user_id, count = rows.len(), "Listed owned vouchers");
        Ok(rows.into_iter().map(OwnedVoucher::from).collect())
    }

    /// Inserts a freshly issued instance.
    ///
    /// Redemption goes through `LedgerRepository::redeem`, which pairs this
    /// insert with the balance decrement.
    pub async fn insert(&self, uv: &UserVoucher) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_vouchers (id, user_id, voucher_id, is_used, used_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&uv.id)
        .bind(&uv.user_id)
        .bind(&uv.voucher_id)
        .bind(uv.is_used)
        .bind(uv.used_at)
        .bind(uv.created_at)
        .execute(&self.pool)
        .await?;

        debug!(id = %uv.id, user_id = %uv.user_id, "User voucher inserted");
        Ok(())
    }

    /// Flips an owned, unused instance to Used.
    ///
    /// Exactly one concurrent caller wins; the others get
    /// [`DbError::AlreadyUsed`].
    pub async fn mark_used(
        &self,
        id: &str,
        user_id: &str,
        used_at: DateTime<Utc>,
    ) -> DbResult<UserVoucher> {
        let updated = sqlx::query_as::<_, UserVoucher>(
            r#"
            UPDATE user_vouchers
            SET is_used = 1, used_at = ?3
            WHERE id = ?1 AND user_id = ?2 AND is_used = 0
            RETURNING id, user_id, voucher_id, is_used, used_at, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(used_at)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(uv) => Ok(uv),
            None => match self.get_owned(id, user_id).await? {
                Some(_) => Err(DbError::AlreadyUsed(id.to_string())),
                None => Err(DbError::not_found("UserVoucher", id)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{seeded_db, SEED_USER};

    async fn issue(db: &crate::Database, voucher_id: &str) -> UserVoucher {
        let uv = UserVoucher::issue(SEED_USER, voucher_id, Utc::now());
        db.user_vouchers().insert(&uv).await.unwrap();
        uv
    }

    #[tokio::test]
    async fn test_get_owned_hides_other_users() {
        let db = seeded_db().await;
        let v = db.catalog().list_active_vouchers().await.unwrap().remove(0);
        let uv = issue(&db, &v.id).await;

        assert!(db.user_vouchers().get_owned(&uv.id, SEED_USER).await.unwrap().is_some());
        assert!(db.user_vouchers().get_owned(&uv.id, "intruder").await.unwrap().is_none());
        assert!(db.user_vouchers().get(&uv.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_owned_newest_first() {
        let db = seeded_db().await;
        let v = db.catalog().list_active_vouchers().await.unwrap().remove(0);

        let mut older = UserVoucher::issue(SEED_USER, &v.id, Utc::now() - chrono::Duration::hours(1));
        older.id = "uv-older".to_string();
        db.user_vouchers().insert(&older).await.unwrap();
        let newer = issue(&db, &v.id).await;

        let owned = db.user_vouchers().list_owned(SEED_USER).await.unwrap();
        assert_eq!(owned.len(), 2);
        assert_eq!(owned[0].user_voucher.id, newer.id);
        assert_eq!(owned[1].user_voucher.id, "uv-older");
        assert_eq!(owned[0].voucher.discount_percentage, 20);
    }

    #[tokio::test]
    async fn test_mark_used_is_single_use() {
        let db = seeded_db().await;
        let v = db.catalog().list_active_vouchers().await.unwrap().remove(0);
        let uv = issue(&db, &v.id).await;

        let used = db
            .user_vouchers()
            .mark_used(&uv.id, SEED_USER, Utc::now())
            .await
            .unwrap();
        assert!(used.is_used);
        assert!(used.used_at.is_some());

        let err = db
            .user_vouchers()
            .mark_used(&uv.id, SEED_USER, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::AlreadyUsed(_)));
    }

    #[tokio::test]
    async fn test_mark_used_wrong_owner() {
        let db = seeded_db().await;
        let v = db.catalog().list_active_vouchers().await.unwrap().remove(0);
        let uv = issue(&db, &v.id).await;

        let err = db
            .user_vouchers()
            .mark_used(&uv.id, "intruder", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let still = db.user_vouchers().get(&uv.id).await.unwrap().unwrap();
        assert!(!still.is_used);
    }
}
