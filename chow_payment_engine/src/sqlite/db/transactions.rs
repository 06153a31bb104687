use chrono::Duration;
use log::*;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Naira, Principal, Transaction, TransactionDirection, TransactionStatus},
    traits::LedgerError,
};

pub struct NewTransaction<'a> {
    pub owner: &'a Principal,
    pub amount: Naira,
    pub direction: TransactionDirection,
    pub status: TransactionStatus,
    pub order_id: Option<i64>,
    pub description: Option<String>,
}

pub async fn insert(tx: NewTransaction<'_>, conn: &mut SqliteConnection) -> Result<Transaction, LedgerError> {
    let transaction: Transaction = sqlx::query_as(
        r#"INSERT INTO transactions (owner_role, owner_id, amount, direction, status, order_id, description)
           VALUES ($1, $2, $3, $4, $5, $6, $7)
           RETURNING *"#,
    )
    .bind(tx.owner.role)
    .bind(&tx.owner.id)
    .bind(tx.amount)
    .bind(tx.direction)
    .bind(tx.status)
    .bind(tx.order_id)
    .bind(tx.description)
    .fetch_one(conn)
    .await?;
    trace!(
        "🗃️ Transaction #{} ({} {} for {}) recorded as {}",
        transaction.id,
        transaction.direction,
        transaction.amount,
        tx.owner,
        transaction.status
    );
    Ok(transaction)
}

pub async fn fetch_transaction(id: i64, conn: &mut SqliteConnection) -> Result<Option<Transaction>, LedgerError> {
    let transaction = sqlx::query_as("SELECT * FROM transactions WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(transaction)
}

pub async fn fetch_for_owner(owner: &Principal, conn: &mut SqliteConnection) -> Result<Vec<Transaction>, LedgerError> {
    let transactions = sqlx::query_as(
        "SELECT * FROM transactions WHERE owner_role = $1 AND owner_id = $2 ORDER BY created_at DESC, id DESC",
    )
    .bind(owner.role)
    .bind(&owner.id)
    .fetch_all(conn)
    .await?;
    Ok(transactions)
}

pub async fn set_reference(
    id: i64,
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, LedgerError> {
    let transaction = sqlx::query_as(
        "UPDATE transactions SET reference = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(reference)
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => {
            LedgerError::ReferenceAlreadyExists(reference.to_string())
        },
        _ => LedgerError::from(e),
    })?;
    Ok(transaction)
}

/// Completes a *pending credit*. The guard on the current status makes this a compare-and-set: of any number of
/// concurrent callers, exactly one gets the row back.
///
/// The settled amount reported by the gateway replaces the requested amount. The reference is only filled in if the
/// transaction does not have one yet.
pub async fn complete_pending_credit(
    id: i64,
    settled: Naira,
    reference: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, LedgerError> {
    let transaction = sqlx::query_as(
        r#"UPDATE transactions
           SET status = 'completed', amount = $1, reference = COALESCE(reference, $2), updated_at = CURRENT_TIMESTAMP
           WHERE id = $3 AND status = 'pending' AND direction = 'credit'
           RETURNING *"#,
    )
    .bind(settled)
    .bind(reference)
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => {
            LedgerError::ReferenceAlreadyExists(reference.unwrap_or_default().to_string())
        },
        _ => LedgerError::from(e),
    })?;
    Ok(transaction)
}

pub async fn fail_pending_credit(id: i64, conn: &mut SqliteConnection) -> Result<Option<Transaction>, LedgerError> {
    let transaction = sqlx::query_as(
        r#"UPDATE transactions SET status = 'failed', updated_at = CURRENT_TIMESTAMP
           WHERE id = $1 AND status = 'pending' AND direction = 'credit'
           RETURNING *"#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(transaction)
}

/// Fails all pending credits created more than `older_than` ago.
pub async fn expire_pending_credits(
    older_than: Duration,
    conn: &mut SqliteConnection,
) -> Result<Vec<Transaction>, LedgerError> {
    let modifier = format!("-{} seconds", older_than.num_seconds().max(0));
    let expired = sqlx::query_as(
        r#"UPDATE transactions SET status = 'failed', updated_at = CURRENT_TIMESTAMP
           WHERE status = 'pending' AND direction = 'credit' AND created_at < datetime('now', $1)
           RETURNING *"#,
    )
    .bind(modifier)
    .fetch_all(conn)
    .await?;
    Ok(expired)
}
