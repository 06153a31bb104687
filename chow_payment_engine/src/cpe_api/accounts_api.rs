use std::fmt::Debug;

use log::*;

use crate::{
    cpe_api::errors::AccountApiError,
    db_types::{Principal, Transaction, Wallet},
    traits::{LedgerError, LedgerManagement},
};

/// Wallet creation and read-only queries over wallets and their transaction history.
pub struct AccountApi<B> {
    db: B,
}

impl<B> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi")
    }
}

impl<B> AccountApi<B>
where B: LedgerManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Creates the principal's wallet. Calling this again returns the existing wallet.
    pub async fn create_wallet(&self, owner: &Principal) -> Result<Wallet, AccountApiError> {
        let wallet = self.db.create_wallet(owner).await?;
        debug!("💻️ Wallet #{} ready for {owner}", wallet.id);
        Ok(wallet)
    }

    pub async fn wallet(&self, owner: &Principal) -> Result<Wallet, AccountApiError> {
        let wallet = self.db.fetch_wallet(owner).await?.ok_or_else(|| LedgerError::WalletNotFound(owner.clone()))?;
        Ok(wallet)
    }

    pub async fn transactions(&self, owner: &Principal) -> Result<Vec<Transaction>, AccountApiError> {
        Ok(self.db.fetch_transactions_for_owner(owner).await?)
    }

    /// Fetches a transaction. `viewer` is `None` for administrators; otherwise it must own the transaction.
    pub async fn transaction(&self, id: i64, viewer: Option<&Principal>) -> Result<Transaction, AccountApiError> {
        let transaction = self.db.fetch_transaction(id).await?.ok_or(LedgerError::TransactionNotFound(id))?;
        match viewer {
            Some(p) if !transaction.is_owned_by(p) => {
                Err(AccountApiError::Forbidden(format!("{p} may not view transaction {id}")))
            },
            _ => Ok(transaction),
        }
    }
}
