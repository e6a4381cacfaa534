//! # Ledger Repository
//!
//! The two multi-row writes of the storefront, each in one SQLite
//! transaction:
//!
//! ```text
//! redeem          : profiles.loyalty_points -= cost   (only if covered)
//!                   INSERT user_vouchers              (Available)
//!
//! commit_purchase : INSERT transactions               (pending)
//!                   user_vouchers.is_used = 1         (only if still 0)
//!                   profiles.loyalty_points += earned
//!                   transactions.status = 'success'
//! ```
//!
//! Every guard is a conditional `UPDATE` evaluated at write time, so two
//! racing requests cannot both spend the same points or the same voucher.
//! A failed guard rolls back everything written before it.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use topup_core::loyalty::Redemption;
use topup_core::{Transaction, TransactionStatus, UserVoucher};

/// A priced purchase ready to be persisted.
///
/// `transaction.user_voucher_id`, when set, names the instance consumed by
/// this purchase; `consumed_at` becomes its `used_at`.
#[derive(Debug, Clone)]
pub struct PurchaseCommit {
    pub transaction: Transaction,
    pub consumed_at: DateTime<Utc>,
}

/// Repository for the atomic loyalty writes.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Spends points and issues the voucher instance described by `redemption`.
    ///
    /// Returns the balance after the decrement and the stored instance. The
    /// decrement uses `redemption.points_spent`; `redemption.new_balance` is
    /// advisory and may be stale.
    pub async fn redeem(&self, redemption: &Redemption) -> DbResult<(i64, UserVoucher)> {
        let mut tx = self.pool.begin().await?;

        let new_balance: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE profiles
            SET loyalty_points = loyalty_points - ?2, updated_at = ?3
            WHERE id = ?1 AND loyalty_points >= ?2
            RETURNING loyalty_points
            "#,
        )
        .bind(&redemption.user_id)
        .bind(redemption.points_spent)
        .bind(redemption.issued.created_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(new_balance) = new_balance else {
            tx.rollback().await?;
            return Err(self
                .insufficient_or_missing(&redemption.user_id, redemption.points_spent)
                .await);
        };

        let uv = &redemption.issued;
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
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            user_id = %redemption.user_id,
            voucher_id = %redemption.voucher_id,
            user_voucher_id = %uv.id,
            points_spent = redemption.points_spent,
            new_balance,
            "Voucher redeemed"
        );

        Ok((new_balance, uv.clone()))
    }

    /// Persists a purchase together with its loyalty side effects.
    ///
    /// On success the returned record has status `Success`. On any error
    /// nothing is written: no transaction row, no voucher flip, no credit.
    pub async fn commit_purchase(&self, commit: &PurchaseCommit) -> DbResult<Transaction> {
        let txn = &commit.transaction;
        let mut tx = self.pool.begin().await?;

        let buyer: Option<i64> = sqlx::query_scalar("SELECT 1 FROM profiles WHERE id = ?1")
            .bind(&txn.user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if buyer.is_none() {
            tx.rollback().await?;
            return Err(DbError::not_found("Profile", txn.user_id.as_str()));
        }

        insert_pending(&mut tx, txn).await.map_err(|e| match (e, &txn.user_voucher_id) {
            // transactions.user_voucher_id is UNIQUE: the instance already paid for another purchase
            (DbError::UniqueViolation { field, .. }, Some(uv_id))
                if field.contains("user_voucher_id") =>
            {
                DbError::AlreadyUsed(uv_id.clone())
            }
            (other, _) => other,
        })?;

        if let Some(uv_id) = &txn.user_voucher_id {
            let consumed = sqlx::query(
                r#"
                UPDATE user_vouchers
                SET is_used = 1, used_at = ?3
                WHERE id = ?1 AND user_id = ?2 AND is_used = 0
                "#,
            )
            .bind(uv_id)
            .bind(&txn.user_id)
            .bind(commit.consumed_at)
            .execute(&mut *tx)
            .await?;

            if consumed.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(self.used_or_missing(uv_id, &txn.user_id).await);
            }
        }

        let credited = sqlx::query(
            r#"
            UPDATE profiles
            SET loyalty_points = loyalty_points + ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(&txn.user_id)
        .bind(txn.points_earned)
        .bind(txn.created_at)
        .execute(&mut *tx)
        .await?;

        if credited.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DbError::not_found("Profile", txn.user_id.as_str()));
        }

        sqlx::query("UPDATE transactions SET status = ?2 WHERE id = ?1")
            .bind(&txn.id)
            .bind(TransactionStatus::Success)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            transaction_id = %txn.id,
            user_id = %txn.user_id,
            total_price = txn.total_price,
            points_earned = txn.points_earned,
            user_voucher_id = ?txn.user_voucher_id,
            "Purchase committed"
        );

        Ok(Transaction {
            status: TransactionStatus::Success,
            ..txn.clone()
        })
    }

    /// Explains why a guarded decrement matched no row.
    async fn insufficient_or_missing(&self, user_id: &str, required: i64) -> DbError {
        let available: Result<Option<i64>, sqlx::Error> =
            sqlx::query_scalar("SELECT loyalty_points FROM profiles WHERE id = ?1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await;

        match available {
            Ok(Some(available)) => {
                warn!(user_id = %user_id, required, available, "Redemption lost to concurrent spend");
                DbError::InsufficientPoints {
                    user_id: user_id.to_string(),
                    required,
                    available,
                }
            }
            Ok(None) => DbError::not_found("Profile", user_id),
            Err(e) => e.into(),
        }
    }

    /// Explains why a guarded voucher flip matched no row.
    async fn used_or_missing(&self, user_voucher_id: &str, user_id: &str) -> DbError {
        let owned: Result<Option<bool>, sqlx::Error> =
            sqlx::query_scalar("SELECT is_used FROM user_vouchers WHERE id = ?1 AND user_id = ?2")
                .bind(user_voucher_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await;

        match owned {
            Ok(Some(_)) => {
                warn!(user_voucher_id = %user_voucher_id, "Voucher consumed by a concurrent purchase");
                DbError::AlreadyUsed(user_voucher_id.to_string())
            }
            Ok(None) => DbError::not_found("UserVoucher", user_voucher_id),
            Err(e) => e.into(),
        }
    }
}

async fn insert_pending(tx: &mut sqlx::Transaction<'_, Sqlite>, txn: &Transaction) -> DbResult<()> {
    debug!(id = %txn.id, "Recording pending transaction");

    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, user_id, game_id, product_id, user_game_id, user_voucher_id,
            payment_method, total_price, points_earned, status, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&txn.id)
    .bind(&txn.user_id)
    .bind(&txn.game_id)
    .bind(&txn.product_id)
    .bind(&txn.user_game_id)
    .bind(&txn.user_voucher_id)
    .bind(txn.payment_method)
    .bind(txn.total_price)
    .bind(txn.points_earned)
    .bind(TransactionStatus::Pending)
    .bind(txn.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
