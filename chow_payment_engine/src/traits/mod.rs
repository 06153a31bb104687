//! # Backend contracts
//!
//! The engine APIs are generic over these traits, so the storage and gateway backends can be swapped out (or mocked).
//!
//! * [`LedgerManagement`] is the ledger store: wallets, the transaction log, and the atomic operations that move money.
//! * [`OrderManagement`] is the order store and applies the order lifecycle transitions.
//! * [`PaymentGatewayClient`] opens hosted checkouts with the payment provider and verifies their outcome.
mod data_objects;
mod ledger_management;
mod order_management;
mod payment_gateway_client;

pub use data_objects::{FundingOutcome, Settlement, SettlementReceipt};
pub use ledger_management::{LedgerError, LedgerManagement};
pub use order_management::{OrderManagement, OrderStoreError};
pub use payment_gateway_client::{
    GatewayClientError,
    GatewayPaymentRequest,
    GatewayPaymentStatus,
    GatewaySession,
    GatewayVerification,
    PaymentGatewayClient,
};
