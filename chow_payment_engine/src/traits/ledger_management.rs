use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{Naira, Principal, SettlementLeg, Transaction, TransactionStatus, Wallet},
    helpers::is_lock_contention,
    traits::data_objects::{FundingOutcome, Settlement, SettlementReceipt},
};

/// The ledger store: wallets and the transaction log.
///
/// Every method that changes a balance does so in a single atomic unit together with the transaction row that
/// explains the change. Implementations must express state changes as conditional updates on the expected prior state
/// so that concurrent callers cannot interleave into an inconsistent balance.
#[allow(async_fn_in_trait)]
pub trait LedgerManagement: Clone {
    /// Creates a zero-balance wallet for the principal. If one already exists, it is returned unchanged.
    async fn create_wallet(&self, owner: &Principal) -> Result<Wallet, LedgerError>;

    async fn fetch_wallet(&self, owner: &Principal) -> Result<Option<Wallet>, LedgerError>;

    /// Records a pending credit for `owner`. The wallet must exist.
    async fn insert_pending_funding(&self, owner: &Principal, amount: Naira) -> Result<Transaction, LedgerError>;

    /// Stores the gateway's reference on a transaction. References are unique across the ledger.
    async fn attach_reference(&self, transaction_id: i64, reference: &str) -> Result<Transaction, LedgerError>;

    async fn fetch_transaction(&self, transaction_id: i64) -> Result<Option<Transaction>, LedgerError>;

    /// All transactions for the owner, newest first.
    async fn fetch_transactions_for_owner(&self, owner: &Principal) -> Result<Vec<Transaction>, LedgerError>;

    /// Moves a pending credit to `completed` and adds `settled` to the owner's wallet, atomically.
    ///
    /// * Already completed: `FundingOutcome::Unchanged`. This is what makes duplicate webhooks harmless.
    /// * Already failed: `LedgerError::TransactionAlreadyFinalized`.
    async fn complete_funding(
        &self,
        transaction_id: i64,
        settled: Naira,
        reference: Option<&str>,
    ) -> Result<FundingOutcome, LedgerError>;

    /// Moves a pending credit to `failed`. Terminal transactions are returned as `FundingOutcome::Unchanged`.
    async fn fail_funding(&self, transaction_id: i64) -> Result<FundingOutcome, LedgerError>;

    /// Debits the payer, credits the payee, writes both transaction rows and marks the order leg as paid, all in one
    /// database transaction. The order must be delivered and confirmed, and the leg not yet settled; this is
    /// re-checked inside the database transaction.
    async fn settle_order_payment(&self, settlement: Settlement) -> Result<SettlementReceipt, LedgerError>;

    /// Fails every pending funding transaction older than `older_than`. Returns the transactions that were expired.
    async fn expire_pending_funding(&self, older_than: Duration) -> Result<Vec<Transaction>, LedgerError>;
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The ledger is busy. Try again. {0}")]
    Conflict(String),
    #[error("No wallet exists for {0}")]
    WalletNotFound(Principal),
    #[error("Transaction {0} does not exist")]
    TransactionNotFound(i64),
    #[error("Transaction {0} is not a wallet funding transaction")]
    NotAFundingTransaction(i64),
    #[error("Transaction {id} is already {status}")]
    TransactionAlreadyFinalized { id: i64, status: TransactionStatus },
    #[error("The reference {0} is already attached to another transaction")]
    ReferenceAlreadyExists(String),
    #[error("Insufficient balance. Available: {available}, required: {required}")]
    InsufficientBalance { available: Naira, required: Naira },
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Order {0} is not delivered and confirmed, so it cannot be settled")]
    OrderNotSettleable(i64),
    #[error("The {leg} leg of order {order_id} has already been settled")]
    AlreadySettled { order_id: i64, leg: SettlementLeg },
    #[error("Amount must be positive. Got {0}")]
    InvalidAmount(Naira),
}

impl LedgerError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        if is_lock_contention(&e) {
            LedgerError::Conflict(e.to_string())
        } else {
            LedgerError::DatabaseError(e.to_string())
        }
    }
}
