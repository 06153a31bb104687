use log::*;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Naira, Principal, Wallet},
    traits::LedgerError,
};

/// Creates the wallet if it does not exist yet and returns it either way.
pub async fn idempotent_insert(owner: &Principal, conn: &mut SqliteConnection) -> Result<Wallet, LedgerError> {
    let inserted = sqlx::query(
        r#"INSERT INTO wallets (owner_role, owner_id) VALUES ($1, $2)
           ON CONFLICT (owner_role, owner_id) DO NOTHING"#,
    )
    .bind(owner.role)
    .bind(&owner.id)
    .execute(&mut *conn)
    .await?
    .rows_affected();
    if inserted > 0 {
        debug!("🗃️ Created a new wallet for {owner}");
    } else {
        trace!("🗃️ Wallet for {owner} already exists");
    }
    fetch_wallet(owner, conn).await?.ok_or_else(|| LedgerError::WalletNotFound(owner.clone()))
}

pub async fn fetch_wallet(owner: &Principal, conn: &mut SqliteConnection) -> Result<Option<Wallet>, LedgerError> {
    let wallet = sqlx::query_as("SELECT * FROM wallets WHERE owner_role = $1 AND owner_id = $2")
        .bind(owner.role)
        .bind(&owner.id)
        .fetch_optional(conn)
        .await?;
    Ok(wallet)
}

/// Adds `amount` to the wallet. Returns `None` if the wallet does not exist.
pub async fn credit(
    owner: &Principal,
    amount: Naira,
    conn: &mut SqliteConnection,
) -> Result<Option<Wallet>, LedgerError> {
    let wallet = sqlx::query_as(
        r#"UPDATE wallets SET balance = balance + $1, updated_at = CURRENT_TIMESTAMP
           WHERE owner_role = $2 AND owner_id = $3
           RETURNING *"#,
    )
    .bind(amount)
    .bind(owner.role)
    .bind(&owner.id)
    .fetch_optional(conn)
    .await?;
    Ok(wallet)
}

/// Subtracts `amount` from the wallet, but only if the balance covers it. The check and the write are one statement,
/// so two concurrent debits can never both pass a stale balance check.
///
/// Returns `None` if the wallet does not exist or the balance is too low.
pub async fn debit_if_sufficient(
    owner: &Principal,
    amount: Naira,
    conn: &mut SqliteConnection,
) -> Result<Option<Wallet>, LedgerError> {
    let wallet = sqlx::query_as(
        r#"UPDATE wallets SET balance = balance - $1, updated_at = CURRENT_TIMESTAMP
           WHERE owner_role = $2 AND owner_id = $3 AND balance >= $1
           RETURNING *"#,
    )
    .bind(amount)
    .bind(owner.role)
    .bind(&owner.id)
    .fetch_optional(conn)
    .await?;
    Ok(wallet)
}
