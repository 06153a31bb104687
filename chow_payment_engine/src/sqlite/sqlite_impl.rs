//! `SqliteDatabase` is the SQLite backend for the payment engine.
//!
//! It implements [`LedgerManagement`] and [`OrderManagement`] on top of the plain functions in [`super::db`].
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{db_url, new_pool, orders, transactions, wallets};
use crate::{
    cpe_api::order_objects::OrderTransition,
    db_types::{
        Naira,
        NewOrder,
        Order,
        Principal,
        Transaction,
        TransactionDirection,
        TransactionStatus,
        Wallet,
    },
    traits::{
        FundingOutcome,
        LedgerError,
        LedgerManagement,
        OrderManagement,
        OrderStoreError,
        Settlement,
        SettlementReceipt,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using `CHOW_DATABASE_URL`
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Safe to call on every start.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn create_wallet(&self, owner: &Principal) -> Result<Wallet, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        wallets::idempotent_insert(owner, &mut conn).await
    }

    async fn fetch_wallet(&self, owner: &Principal) -> Result<Option<Wallet>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        wallets::fetch_wallet(owner, &mut conn).await
    }

    async fn insert_pending_funding(&self, owner: &Principal, amount: Naira) -> Result<Transaction, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let mut tx = self.pool.begin().await?;
        if wallets::fetch_wallet(owner, &mut tx).await?.is_none() {
            return Err(LedgerError::WalletNotFound(owner.clone()));
        }
        let new_tx = transactions::NewTransaction {
            owner,
            amount,
            direction: TransactionDirection::Credit,
            status: TransactionStatus::Pending,
            order_id: None,
            description: Some("Wallet funding".to_string()),
        };
        let transaction = transactions::insert(new_tx, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Pending funding #{} of {amount} recorded for {owner}", transaction.id);
        Ok(transaction)
    }

    async fn attach_reference(&self, transaction_id: i64, reference: &str) -> Result<Transaction, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        transactions::set_reference(transaction_id, reference, &mut conn)
            .await?
            .ok_or(LedgerError::TransactionNotFound(transaction_id))
    }

    async fn fetch_transaction(&self, transaction_id: i64) -> Result<Option<Transaction>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        transactions::fetch_transaction(transaction_id, &mut conn).await
    }

    async fn fetch_transactions_for_owner(&self, owner: &Principal) -> Result<Vec<Transaction>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        transactions::fetch_for_owner(owner, &mut conn).await
    }

    async fn complete_funding(
        &self,
        transaction_id: i64,
        settled: Naira,
        reference: Option<&str>,
    ) -> Result<FundingOutcome, LedgerError> {
        if !settled.is_positive() {
            return Err(LedgerError::InvalidAmount(settled));
        }
        let mut tx = self.pool.begin().await?;
        let Some(transaction) = transactions::complete_pending_credit(transaction_id, settled, reference, &mut tx).await?
        else {
            let existing = transactions::fetch_transaction(transaction_id, &mut tx).await?;
            return match existing {
                None => Err(LedgerError::TransactionNotFound(transaction_id)),
                Some(t) if t.direction != TransactionDirection::Credit => {
                    Err(LedgerError::NotAFundingTransaction(transaction_id))
                },
                Some(t) if t.status == TransactionStatus::Completed => {
                    debug!("🗃️ Transaction #{transaction_id} is already completed. Nothing to do.");
                    Ok(FundingOutcome::Unchanged { transaction: t })
                },
                Some(t) if t.status == TransactionStatus::Failed => {
                    Err(LedgerError::TransactionAlreadyFinalized { id: transaction_id, status: t.status })
                },
                Some(_) => Err(LedgerError::Conflict(format!("Transaction {transaction_id} changed underfoot"))),
            };
        };
        let owner = transaction.owner();
        let wallet = wallets::credit(&owner, settled, &mut tx).await?.ok_or(LedgerError::WalletNotFound(owner))?;
        tx.commit().await?;
        info!("🗃️ Transaction #{transaction_id} completed. {settled} credited. New balance: {}", wallet.balance);
        Ok(FundingOutcome::Credited { transaction, wallet })
    }

    async fn fail_funding(&self, transaction_id: i64) -> Result<FundingOutcome, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        if let Some(transaction) = transactions::fail_pending_credit(transaction_id, &mut conn).await? {
            info!("🗃️ Transaction #{transaction_id} marked as failed");
            return Ok(FundingOutcome::Failed { transaction });
        }
        match transactions::fetch_transaction(transaction_id, &mut conn).await? {
            None => Err(LedgerError::TransactionNotFound(transaction_id)),
            Some(t) if t.direction != TransactionDirection::Credit => {
                Err(LedgerError::NotAFundingTransaction(transaction_id))
            },
            Some(t) if t.status.is_terminal() => Ok(FundingOutcome::Unchanged { transaction: t }),
            Some(_) => Err(LedgerError::Conflict(format!("Transaction {transaction_id} changed underfoot"))),
        }
    }

    async fn settle_order_payment(&self, settlement: Settlement) -> Result<SettlementReceipt, LedgerError> {
        let Settlement { order_id, leg, payer, payee, amount } = settlement;
        let mut tx = self.pool.begin().await?;
        // Claim the leg first. Dropping `tx` on any error below rolls the claim back.
        if !orders::mark_leg_paid(order_id, leg, &mut tx).await? {
            let err = match orders::fetch_order_row(order_id, &mut tx).await? {
                None => LedgerError::OrderNotFound(order_id),
                Some(order) if order.is_settled(leg) => LedgerError::AlreadySettled { order_id, leg },
                Some(_) => LedgerError::OrderNotSettleable(order_id),
            };
            return Err(err);
        }
        let payee_wallet = wallets::idempotent_insert(&payee, &mut tx).await?;
        if amount.is_zero() {
            let payer_wallet =
                wallets::fetch_wallet(&payer, &mut tx).await?.ok_or_else(|| LedgerError::WalletNotFound(payer.clone()))?;
            tx.commit().await?;
            debug!("🗃️ The {leg} leg of order #{order_id} carries no funds. Marked as settled.");
            return Ok(SettlementReceipt { order_id, leg, amount, debit: None, credit: None, payer_wallet, payee_wallet });
        }
        let Some(payer_wallet) = wallets::debit_if_sufficient(&payer, amount, &mut tx).await? else {
            let err = match wallets::fetch_wallet(&payer, &mut tx).await? {
                None => LedgerError::WalletNotFound(payer),
                Some(w) => LedgerError::InsufficientBalance { available: w.balance, required: amount },
            };
            return Err(err);
        };
        let payee_wallet =
            wallets::credit(&payee, amount, &mut tx).await?.ok_or(LedgerError::WalletNotFound(payee_wallet.owner()))?;
        let description = format!("Order #{order_id} {leg} payment");
        let debit = transactions::insert(
            transactions::NewTransaction {
                owner: &payer,
                amount,
                direction: TransactionDirection::Debit,
                status: TransactionStatus::Completed,
                order_id: Some(order_id),
                description: Some(description.clone()),
            },
            &mut tx,
        )
        .await?;
        let credit = transactions::insert(
            transactions::NewTransaction {
                owner: &payee,
                amount,
                direction: TransactionDirection::Credit,
                status: TransactionStatus::Completed,
                order_id: Some(order_id),
                description: Some(description),
            },
            &mut tx,
        )
        .await?;
        tx.commit().await?;
        info!("🗃️ Order #{order_id} {leg} leg settled. {amount} moved from {payer} to {payee}");
        Ok(SettlementReceipt {
            order_id,
            leg,
            amount,
            debit: Some(debit),
            credit: Some(credit),
            payer_wallet,
            payee_wallet,
        })
    }

    async fn expire_pending_funding(&self, older_than: Duration) -> Result<Vec<Transaction>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let expired = transactions::expire_pending_credits(older_than, &mut conn).await?;
        if !expired.is_empty() {
            info!("🗃️ {} pending funding transactions expired", expired.len());
        }
        Ok(expired)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, &mut conn).await
    }

    async fn fetch_orders_for_party(&self, party: &Principal) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders_for_party(party, &mut conn).await
    }

    async fn fetch_orders_available_for_pickup(&self) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders_available_for_pickup(&mut conn).await
    }

    async fn apply_transition(&self, order_id: i64, transition: &OrderTransition) -> Result<Order, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        if let Some(order) = orders::try_transition(order_id, transition, &mut conn).await? {
            debug!("📦️ Order #{order_id}: {transition}");
            return Ok(order);
        }
        // Nothing was written. Work out why from the current state.
        let current = orders::fetch_order(order_id, &mut conn).await?.ok_or(OrderStoreError::OrderNotFound(order_id))?;
        transition.check(&current)?;
        Err(OrderStoreError::Conflict(format!("Order {order_id} changed while applying {transition}")))
    }
}
