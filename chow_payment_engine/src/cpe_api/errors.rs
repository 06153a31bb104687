use thiserror::Error;

use crate::{
    cpe_api::order_objects::TransitionError,
    helpers::WebhookSignatureError,
    traits::{GatewayClientError, LedgerError, OrderStoreError},
};

#[derive(Debug, Clone, Error)]
pub enum WalletApiError {
    #[error("Invalid request. {0}")]
    Validation(String),
    #[error("Webhook signature is invalid. {0}")]
    SignatureInvalid(#[from] WebhookSignatureError),
    #[error("Unhandled gateway event: {0}")]
    UnhandledEvent(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("Payment gateway error. {0}")]
    Gateway(#[from] GatewayClientError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Invalid order. {0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Order store error. {0}")]
    Store(String),
    #[error("The order changed while it was being updated. {0}")]
    Conflict(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<OrderStoreError> for OrderFlowError {
    fn from(e: OrderStoreError) -> Self {
        match e {
            OrderStoreError::OrderNotFound(id) => Self::OrderNotFound(id),
            OrderStoreError::InvalidOrder(msg) => Self::Validation(msg),
            OrderStoreError::Transition(t) => Self::Transition(t),
            OrderStoreError::DatabaseError(msg) => Self::Store(msg),
            OrderStoreError::Conflict(msg) => Self::Conflict(msg),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("{0}")]
    Forbidden(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
