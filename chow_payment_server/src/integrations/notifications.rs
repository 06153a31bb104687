use chow_payment_engine::events::{
    EventHandlers,
    EventHooks,
    FundingFailedEvent,
    OrderSettledEvent,
    OrderStatusChangedEvent,
    WalletFundedEvent,
};
use futures::{future::ready, FutureExt};
use log::*;

pub const NOTIFICATION_EVENT_BUFFER_SIZE: usize = 25;

/// Assigns the event handlers that report money movements and order progress.
///
/// They only write to the log for now. Push notifications to the mobile apps will hang off the same hooks.
pub fn create_notification_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks
        .on_wallet_funded(|ev: WalletFundedEvent| {
            let WalletFundedEvent { transaction, wallet } = ev;
            info!(
                "📬️ Wallet of {} funded with {} (transaction {}). New balance: {}",
                wallet.owner(),
                transaction.amount,
                transaction.id,
                wallet.balance
            );
            ready(()).boxed()
        })
        .on_funding_failed(|ev: FundingFailedEvent| {
            let reason = if ev.expired { "it expired" } else { "the payment failed" };
            info!(
                "📬️ Funding transaction {} for {} was marked as failed because {reason}",
                ev.transaction.id,
                ev.transaction.owner()
            );
            ready(()).boxed()
        })
        .on_order_status_changed(|ev: OrderStatusChangedEvent| {
            let order = ev.order;
            info!(
                "📬️ Order #{} ({}): {}. Status: {}, vendor: {}, rider: {}",
                order.id,
                order.customer_id,
                ev.transition,
                order.order_status,
                order.accepted_status,
                order.rider_id.as_deref().unwrap_or("unassigned")
            );
            ready(()).boxed()
        })
        .on_order_settled(|ev: OrderSettledEvent| {
            let receipt = ev.receipt;
            info!(
                "📬️ Order #{} {} leg paid: {} from {} to {}",
                receipt.order_id,
                receipt.leg,
                receipt.amount,
                receipt.payer_wallet.owner(),
                receipt.payee_wallet.owner()
            );
            ready(()).boxed()
        });
    EventHandlers::new(NOTIFICATION_EVENT_BUFFER_SIZE, hooks)
}
