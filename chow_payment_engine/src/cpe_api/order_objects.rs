//! The order lifecycle rules.
//!
//! Every transition is described by an [`OrderTransition`]. [`OrderTransition::check`] decides whether the transition
//! is legal for an order's *current* state without touching the database. Storage backends apply the same guard as a
//! single conditional update, so a transition that races another one can never be applied on top of a stale read.
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{AcceptedStatus, Order, OrderStatus, SettlementLeg};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Order {order_id} cannot be modified by {actor}")]
    Forbidden { order_id: i64, actor: String },
    #[error("Order {order_id} is not in a valid state for this action. {reason}")]
    InvalidOrderState { order_id: i64, reason: String },
    #[error("The {leg} leg of order {order_id} has already been settled")]
    AlreadySettled { order_id: i64, leg: SettlementLeg },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderTransition {
    /// The vendor accepts (`true`) or declines (`false`) a new order.
    Respond { vendor_id: String, accept: bool },
    /// The vendor flags that the food is (or is no longer) ready to be collected.
    SetAvailability { vendor_id: String, available: bool },
    /// A rider claims the order. This is also what assigns the rider to the order.
    AcceptPickup { rider_id: String },
    MarkDelivered { rider_id: String },
    ConfirmDelivery { customer_id: String },
}

impl Display for OrderTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Respond { accept: true, .. } => write!(f, "vendor accept"),
            Self::Respond { accept: false, .. } => write!(f, "vendor decline"),
            Self::SetAvailability { available, .. } => write!(f, "set available for pickup = {available}"),
            Self::AcceptPickup { .. } => write!(f, "rider pickup"),
            Self::MarkDelivered { .. } => write!(f, "rider delivered"),
            Self::ConfirmDelivery { .. } => write!(f, "customer confirms delivery"),
        }
    }
}

impl OrderTransition {
    pub fn check(&self, order: &Order) -> Result<(), TransitionError> {
        let invalid = |reason: String| Err(TransitionError::InvalidOrderState { order_id: order.id, reason });
        let forbidden = |actor: String| Err(TransitionError::Forbidden { order_id: order.id, actor });
        match self {
            Self::Respond { vendor_id, .. } => {
                if &order.vendor_id != vendor_id {
                    return forbidden(format!("vendor {vendor_id}"));
                }
                if order.order_status != OrderStatus::New {
                    return invalid(format!("Order status is {}, not new", order.order_status));
                }
                if order.accepted_status != AcceptedStatus::Pending {
                    return invalid(format!("Order has already been {}", order.accepted_status));
                }
            },
            Self::SetAvailability { vendor_id, available } => {
                if &order.vendor_id != vendor_id {
                    return forbidden(format!("vendor {vendor_id}"));
                }
                if order.order_status != OrderStatus::New {
                    return invalid(format!("Order status is {}, not new", order.order_status));
                }
                if *available && order.accepted_status == AcceptedStatus::Declined {
                    return invalid("A declined order cannot be offered for pickup".to_string());
                }
            },
            Self::AcceptPickup { .. } => {
                if order.order_status != OrderStatus::New {
                    return invalid(format!("Order status is {}, not new", order.order_status));
                }
                if order.accepted_status == AcceptedStatus::Declined {
                    return invalid("The vendor declined this order".to_string());
                }
                if !order.available_for_pickup {
                    return invalid("Order is not available for pickup".to_string());
                }
            },
            Self::MarkDelivered { rider_id } => {
                if order.rider_id.as_ref() != Some(rider_id) {
                    return forbidden(format!("rider {rider_id}"));
                }
                if order.order_status != OrderStatus::InTransit {
                    return invalid(format!("Order status is {}, not in-transit", order.order_status));
                }
            },
            Self::ConfirmDelivery { customer_id } => {
                if &order.customer_id != customer_id {
                    return forbidden(format!("customer {customer_id}"));
                }
                if order.order_status != OrderStatus::Delivered {
                    return invalid(format!("Order status is {}, not delivered", order.order_status));
                }
                if order.confirm_delivered_by_customer {
                    return invalid("Delivery has already been confirmed".to_string());
                }
            },
        }
        Ok(())
    }
}

/// Money may only move once the food has been delivered *and* the customer has said so.
pub fn check_settleable(order: &Order, leg: SettlementLeg) -> Result<(), TransitionError> {
    if order.order_status != OrderStatus::Delivered || !order.confirm_delivered_by_customer {
        return Err(TransitionError::InvalidOrderState {
            order_id: order.id,
            reason: format!(
                "Settlement requires a delivered order confirmed by the customer. Status: {}, confirmed: {}",
                order.order_status, order.confirm_delivered_by_customer
            ),
        });
    }
    if leg == SettlementLeg::Rider && order.rider_id.is_none() {
        return Err(TransitionError::InvalidOrderState {
            order_id: order.id,
            reason: "No rider is assigned to this order".to_string(),
        });
    }
    if order.is_settled(leg) {
        return Err(TransitionError::AlreadySettled { order_id: order.id, leg });
    }
    Ok(())
}
