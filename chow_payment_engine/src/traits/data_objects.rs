use serde::{Deserialize, Serialize};

use crate::db_types::{Naira, Order, Principal, SettlementLeg, Transaction, Wallet};

/// The result of applying a gateway outcome to a pending funding transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum FundingOutcome {
    /// The transaction moved from pending to completed and the wallet was credited.
    Credited { transaction: Transaction, wallet: Wallet },
    /// The transaction moved from pending to failed. The balance is untouched.
    Failed { transaction: Transaction },
    /// The transaction was already in the requested terminal state. Nothing changed.
    Unchanged { transaction: Transaction },
}

impl FundingOutcome {
    pub fn transaction(&self) -> &Transaction {
        match self {
            Self::Credited { transaction, .. } => transaction,
            Self::Failed { transaction } => transaction,
            Self::Unchanged { transaction } => transaction,
        }
    }
}

/// An internal transfer of funds for one leg of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub order_id: i64,
    pub leg: SettlementLeg,
    pub payer: Principal,
    pub payee: Principal,
    pub amount: Naira,
}

impl Settlement {
    /// Builds the settlement for the given leg: the item total goes to the vendor, the delivery fee to the rider.
    /// Returns `None` for the rider leg if no rider has been assigned.
    pub fn for_order(order: &Order, leg: SettlementLeg) -> Option<Self> {
        let (payee, amount) = match leg {
            SettlementLeg::Vendor => (order.vendor(), order.total_price),
            SettlementLeg::Rider => (order.rider()?, order.delivery_fee),
        };
        Some(Self { order_id: order.id, leg, payer: order.customer(), payee, amount })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub order_id: i64,
    pub leg: SettlementLeg,
    pub amount: Naira,
    /// `None` when the leg carried no money (e.g. a free delivery)
    pub debit: Option<Transaction>,
    pub credit: Option<Transaction>,
    pub payer_wallet: Wallet,
    pub payee_wallet: Wallet,
}
