use thiserror::Error;

use crate::{
    cpe_api::order_objects::{OrderTransition, TransitionError},
    db_types::{NewOrder, Order, Principal},
    helpers::is_lock_contention,
};

/// The order store.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    /// Stores a new order with its line items. The total price is computed from the items and frozen.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderStoreError>;

    /// Orders where the principal is the customer, vendor or rider, newest first.
    async fn fetch_orders_for_party(&self, party: &Principal) -> Result<Vec<Order>, OrderStoreError>;

    /// Orders that a rider could pick up right now.
    async fn fetch_orders_available_for_pickup(&self) -> Result<Vec<Order>, OrderStoreError>;

    /// Applies the transition as a single conditional update guarded on the order's current state.
    ///
    /// If the guard does not hold, nothing is written and the reason is reported as a [`TransitionError`].
    async fn apply_transition(&self, order_id: i64, transition: &OrderTransition) -> Result<Order, OrderStoreError>;
}

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The order store is busy. Try again. {0}")]
    Conflict(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Invalid order. {0}")]
    InvalidOrder(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl OrderStoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        if is_lock_contention(&e) {
            OrderStoreError::Conflict(e.to_string())
        } else {
            OrderStoreError::DatabaseError(e.to_string())
        }
    }
}
