//! # Transaction Repository
//!
//! Purchase records and the per-user history feed.
//!
//! A successful purchase is written by `LedgerRepository::commit_purchase`
//! inside the same database transaction as the voucher and points updates.
//! The plain [`TransactionRepository::insert`] exists for records that have
//! no side effects, such as a `failed` attempt.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use topup_core::{Transaction, TransactionSummary};

/// Repository for transaction records.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Gets a transaction by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Transaction>> {
        let txn = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, game_id, product_id, user_game_id, user_voucher_id,
                   payment_method, total_price, points_earned, status, created_at
            FROM transactions
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(txn)
    }

    /// Inserts a transaction record as-is.
    pub async fn insert(&self, txn: &Transaction) -> DbResult<()> {
        debug!(id = %txn.id, user_id = %txn.user_id, status = ?txn.status, "Inserting transaction");

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
        .bind(txn.status)
        .bind(txn.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists a user's most recent transactions, newest first, with game and
    /// product names attached.
    pub async fn recent_for_user(
        &self,
        user_id: &str,
        limit: u32,
    ) -> DbResult<Vec<TransactionSummary>> {
        let rows = sqlx::query_as::<_, TransactionSummary>(
            r#"
            SELECT
                t.id, t.user_id, t.game_id, t.product_id, t.user_game_id, t.user_voucher_id,
                t.payment_method, t.total_price, t.points_earned, t.status, t.created_at,
                g.name AS game_name,
                p.name AS product_name
            FROM transactions t
            JOIN games g ON g.id = t.game_id
            JOIN products p ON p.id = t.product_id
            WHERE t.user_id = ?1
            ORDER BY t.created_at DESC, t.id
            LIMIT ?2
            "#,
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        debug!(user_id = %user_id, count = rows.len(), "Loaded transaction history");
        Ok(rows)
    }
}
