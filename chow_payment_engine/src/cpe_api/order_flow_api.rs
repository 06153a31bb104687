use std::fmt::Debug;

use log::*;

use crate::{
    cpe_api::{
        errors::OrderFlowError,
        order_objects::{check_settleable, OrderTransition},
    },
    db_types::{NewOrder, Order, Principal, Role, SettlementLeg},
    events::{EventProducers, OrderSettledEvent, OrderStatusChangedEvent},
    helpers::retry_on_conflict,
    traits::{LedgerManagement, OrderManagement, Settlement, SettlementReceipt},
};

/// `OrderFlowApi` drives an order through its lifecycle and pays out the vendor and rider once the customer has
/// confirmed delivery.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement + LedgerManagement
{
    /// Stores a new order. Unit prices are taken as given and frozen, and the total price is computed from them.
    pub async fn place_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        validate_new_order(&order)?;
        let order = retry_on_conflict("place order", || self.db.insert_order(order.clone())).await?;
        info!("📦️ Order #{} placed by customer {} with vendor {}", order.id, order.customer_id, order.vendor_id);
        Ok(order)
    }

    async fn transition(&self, order_id: i64, transition: OrderTransition) -> Result<Order, OrderFlowError> {
        let order = retry_on_conflict("order transition", || self.db.apply_transition(order_id, &transition)).await?;
        info!("📦️ Order #{order_id}: {transition}. Status is now {}", order.order_status);
        let event = OrderStatusChangedEvent { order: order.clone(), transition };
        self.producers.publish_order_status_changed(event).await;
        Ok(order)
    }

    pub async fn respond(&self, order_id: i64, vendor_id: &str, accept: bool) -> Result<Order, OrderFlowError> {
        self.transition(order_id, OrderTransition::Respond { vendor_id: vendor_id.to_string(), accept }).await
    }

    pub async fn set_availability(
        &self,
        order_id: i64,
        vendor_id: &str,
        available: bool,
    ) -> Result<Order, OrderFlowError> {
        self.transition(order_id, OrderTransition::SetAvailability { vendor_id: vendor_id.to_string(), available }).await
    }

    /// A rider claims an order that is available for pickup. Only one rider can win.
    pub async fn accept_pickup(&self, order_id: i64, rider_id: &str) -> Result<Order, OrderFlowError> {
        self.transition(order_id, OrderTransition::AcceptPickup { rider_id: rider_id.to_string() }).await
    }

    pub async fn mark_delivered(&self, order_id: i64, rider_id: &str) -> Result<Order, OrderFlowError> {
        self.transition(order_id, OrderTransition::MarkDelivered { rider_id: rider_id.to_string() }).await
    }

    pub async fn confirm_delivery(&self, order_id: i64, customer_id: &str) -> Result<Order, OrderFlowError> {
        self.transition(order_id, OrderTransition::ConfirmDelivery { customer_id: customer_id.to_string() }).await
    }

    /// Pays out one leg of an order from the customer's wallet.
    ///
    /// `actor` is `None` for administrators. Otherwise it must be the order's customer. The order state is checked
    /// here and again by the ledger inside the settlement transaction.
    pub async fn settle(
        &self,
        order_id: i64,
        leg: SettlementLeg,
        actor: Option<&Principal>,
    ) -> Result<SettlementReceipt, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if let Some(actor) = actor {
            if actor.role != Role::Customer || actor.id != order.customer_id {
                return Err(OrderFlowError::Forbidden(format!("{actor} may not settle order {order_id}")));
            }
        }
        check_settleable(&order, leg)?;
        let settlement = Settlement::for_order(&order, leg)
            .ok_or_else(|| OrderFlowError::Validation(format!("Order {order_id} has no {leg} to pay")))?;
        let receipt = retry_on_conflict("settle order", || self.db.settle_order_payment(settlement.clone())).await?;
        info!("📦️ Order #{order_id}: {leg} leg settled for {}", receipt.amount);
        self.producers.publish_order_settled(OrderSettledEvent { receipt: receipt.clone() }).await;
        Ok(receipt)
    }

    /// Fetches an order. `viewer` is `None` for administrators; otherwise it must be a party to the order.
    pub async fn order_for(&self, order_id: i64, viewer: Option<&Principal>) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        match viewer {
            Some(p) if !order.is_party(p) => Err(OrderFlowError::Forbidden(format!("{p} may not view order {order_id}"))),
            _ => Ok(order),
        }
    }

    pub async fn orders_for(&self, party: &Principal) -> Result<Vec<Order>, OrderFlowError> {
        Ok(self.db.fetch_orders_for_party(party).await?)
    }

    pub async fn available_for_pickup(&self) -> Result<Vec<Order>, OrderFlowError> {
        Ok(self.db.fetch_orders_available_for_pickup().await?)
    }
}

fn validate_new_order(order: &NewOrder) -> Result<(), OrderFlowError> {
    let invalid = |msg: &str| Err(OrderFlowError::Validation(msg.to_string()));
    if order.customer_id.trim().is_empty() || order.vendor_id.trim().is_empty() {
        return invalid("Customer and vendor ids are required");
    }
    if order.items.is_empty() {
        return invalid("An order needs at least one item");
    }
    if order.items.iter().any(|i| i.quantity <= 0) {
        return invalid("Item quantities must be positive");
    }
    if order.items.iter().any(|i| i.unit_price.value() < 0 || i.menu_item_id.trim().is_empty()) {
        return invalid("Every item needs a menu item id and a non-negative price");
    }
    if order.delivery_fee.value() < 0 {
        return invalid("The delivery fee cannot be negative");
    }
    let total = order.total_price().and_then(|t| t.checked_add(order.delivery_fee));
    if total.is_none() {
        return invalid("The order total is too large");
    }
    Ok(())
}
