use serde::{Deserialize, Serialize};

use crate::{
    cpe_api::order_objects::OrderTransition,
    db_types::{Order, Transaction, Wallet},
    traits::SettlementReceipt,
};

/// A pending funding transaction completed and the wallet was credited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletFundedEvent {
    pub transaction: Transaction,
    pub wallet: Wallet,
}

impl WalletFundedEvent {
    pub fn new(transaction: Transaction, wallet: Wallet) -> Self {
        Self { transaction, wallet }
    }
}

/// A pending funding transaction failed, either at the gateway or because it expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingFailedEvent {
    pub transaction: Transaction,
    pub expired: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub order: Order,
    pub transition: OrderTransition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSettledEvent {
    pub receipt: SettlementReceipt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    WalletFunded(WalletFundedEvent),
    FundingFailed(FundingFailedEvent),
    OrderStatusChanged(OrderStatusChangedEvent),
    OrderSettled(OrderSettledEvent),
}
