//! Repository for wallet balances and the transaction ledger
//!
//! Every balance change goes through [`apply_credit`] or [`apply_debit`], which
//! lock the user row, move the balance and append exactly one ledger row. They
//! take a bare connection so order flows can run them inside their own
//! transaction.

use crate::error::RepositoryError;
use crate::models::{LedgerEntry, TransactionStatus, TransactionType, WalletTransaction};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Result as SqlxResult};
use tracing::debug;
use uuid::Uuid;

const TRANSACTION_COLUMNS: &str = "id, user_id, amount, transaction_type, status, reference, \
     order_id, balance_before, balance_after, description, created_at";

pub struct WalletRepository {
    pool: PgPool,
}

impl WalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Current balance, or None for an unknown user
    pub async fn balance(&self, user_id: Uuid) -> SqlxResult<Option<Decimal>> {
        sqlx::query_scalar("SELECT wallet_balance FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Credit funds in a transaction of its own
    pub async fn credit(
        &self,
        entry: &LedgerEntry<'_>,
    ) -> Result<WalletTransaction, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let recorded = apply_credit(&mut *tx, entry).await?;
        tx.commit().await?;
        Ok(recorded)
    }

    /// Debit funds in a transaction of its own; fails on insufficient balance
    pub async fn debit(
        &self,
        entry: &LedgerEntry<'_>,
    ) -> Result<WalletTransaction, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let recorded = apply_debit(&mut *tx, entry).await?;
        tx.commit().await?;
        Ok(recorded)
    }

    /// Credit a deposit at most once per reference.
    ///
    /// Returns the ledger row and whether it was created by this call. When
    /// the reference was already recorded, the original row comes back
    /// untouched. A concurrent replay that loses the race on the unique
    /// reference rolls back and also gets the original row.
    pub async fn record_deposit(
        &self,
        entry: &LedgerEntry<'_>,
    ) -> Result<(WalletTransaction, bool), RepositoryError> {
        let reference = entry.reference.ok_or_else(|| {
            RepositoryError::InvalidInput("Deposit requires a payment reference".to_string())
        })?;

        if let Some(existing) = self.find_by_reference(reference).await? {
            return Ok((existing, false));
        }

        let mut tx = self.pool.begin().await?;
        match apply_credit(&mut *tx, entry).await {
            Ok(recorded) => {
                tx.commit().await?;
                Ok((recorded, true))
            }
            Err(RepositoryError::Duplicate(_)) => {
                tx.rollback().await?;
                debug!("Deposit reference {} raced with a replay", reference);
                let existing = self.find_by_reference(reference).await?.ok_or_else(|| {
                    RepositoryError::NotFound(format!("Transaction {} not found", reference))
                })?;
                Ok((existing, false))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn find_by_reference(
        &self,
        reference: &str,
    ) -> SqlxResult<Option<WalletTransaction>> {
        sqlx::query_as::<_, WalletTransaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM wallet_transactions WHERE reference = $1"
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
    }

    /// Most recent ledger rows of a user
    pub async fn transactions(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> SqlxResult<Vec<WalletTransaction>> {
        sqlx::query_as::<_, WalletTransaction>(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM wallet_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Ledger rows tied to an order, oldest first
    pub async fn transactions_for_order(
        &self,
        order_id: Uuid,
    ) -> SqlxResult<Vec<WalletTransaction>> {
        sqlx::query_as::<_, WalletTransaction>(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM wallet_transactions
            WHERE order_id = $1
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
    }
}

/// Add `entry.amount` to the user's balance and record it
pub async fn apply_credit(
    conn: &mut PgConnection,
    entry: &LedgerEntry<'_>,
) -> Result<WalletTransaction, RepositoryError> {
    apply_entry(conn, entry, true).await
}

/// Subtract `entry.amount` from the user's balance and record it
pub async fn apply_debit(
    conn: &mut PgConnection,
    entry: &LedgerEntry<'_>,
) -> Result<WalletTransaction, RepositoryError> {
    apply_entry(conn, entry, false).await
}

async fn apply_entry(
    conn: &mut PgConnection,
    entry: &LedgerEntry<'_>,
    credit: bool,
) -> Result<WalletTransaction, RepositoryError> {
    if entry.amount <= Decimal::ZERO {
        return Err(RepositoryError::InvalidInput(
            "Amount must be positive".to_string(),
        ));
    }
    if credit != entry.tx_type.is_credit() {
        return Err(RepositoryError::InvalidInput(format!(
            "{} cannot be applied as a {}",
            entry.tx_type.as_str(),
            if credit { "credit" } else { "debit" }
        )));
    }

    // Get current balance with lock
    let balance_before: Decimal =
        sqlx::query_scalar("SELECT wallet_balance FROM users WHERE id = $1 FOR UPDATE")
            .bind(entry.user_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("User {} not found", entry.user_id)))?;

    let balance_after = if credit {
        balance_before + entry.amount
    } else {
        if balance_before < entry.amount {
            return Err(RepositoryError::BusinessRule(format!(
                "Insufficient balance: available {}, required {}",
                balance_before, entry.amount
            )));
        }
        balance_before - entry.amount
    };

    sqlx::query("UPDATE users SET wallet_balance = $2, updated_at = NOW() WHERE id = $1")
        .bind(entry.user_id)
        .bind(balance_after)
        .execute(&mut *conn)
        .await?;

    // Record transaction
    let recorded = sqlx::query_as::<_, WalletTransaction>(&format!(
        r#"
        INSERT INTO wallet_transactions
            (user_id, amount, transaction_type, status, reference, order_id,
             balance_before, balance_after, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {TRANSACTION_COLUMNS}
        "#
    ))
    .bind(entry.user_id)
    .bind(entry.amount)
    .bind(entry.tx_type.as_str())
    .bind(TransactionStatus::Completed.as_str())
    .bind(entry.reference)
    .bind(entry.order_id)
    .bind(balance_before)
    .bind(balance_after)
    .bind(entry.description)
    .fetch_one(&mut *conn)
    .await?;

    debug!(
        "Ledger {} of {} for user {}: {} -> {}",
        entry.tx_type.as_str(),
        entry.amount,
        entry.user_id,
        balance_before,
        balance_after
    );

    Ok(recorded)
}

/// Ledger entry tied to an order
pub fn order_entry<'a>(
    user_id: Uuid,
    amount: Decimal,
    tx_type: TransactionType,
    order_id: Uuid,
    description: &'a str,
) -> LedgerEntry<'a> {
    LedgerEntry {
        user_id,
        amount,
        tx_type,
        reference: None,
        order_id: Some(order_id),
        description: Some(description),
    }
}
