use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    FundingFailedEvent,
    Handler,
    OrderSettledEvent,
    OrderStatusChangedEvent,
    WalletFundedEvent,
};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub wallet_funded_producer: Vec<EventProducer<WalletFundedEvent>>,
    pub funding_failed_producer: Vec<EventProducer<FundingFailedEvent>>,
    pub order_status_changed_producer: Vec<EventProducer<OrderStatusChangedEvent>>,
    pub order_settled_producer: Vec<EventProducer<OrderSettledEvent>>,
}

impl EventProducers {
    pub async fn publish_wallet_funded(&self, event: WalletFundedEvent) {
        for producer in &self.wallet_funded_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_funding_failed(&self, event: FundingFailedEvent) {
        for producer in &self.funding_failed_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_order_status_changed(&self, event: OrderStatusChangedEvent) {
        for producer in &self.order_status_changed_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_order_settled(&self, event: OrderSettledEvent) {
        for producer in &self.order_settled_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_wallet_funded: Option<EventHandler<WalletFundedEvent>>,
    pub on_funding_failed: Option<EventHandler<FundingFailedEvent>>,
    pub on_order_status_changed: Option<EventHandler<OrderStatusChangedEvent>>,
    pub on_order_settled: Option<EventHandler<OrderSettledEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_wallet_funded = hooks.on_wallet_funded.map(|f| EventHandler::new(buffer_size, f));
        let on_funding_failed = hooks.on_funding_failed.map(|f| EventHandler::new(buffer_size, f));
        let on_order_status_changed = hooks.on_order_status_changed.map(|f| EventHandler::new(buffer_size, f));
        let on_order_settled = hooks.on_order_settled.map(|f| EventHandler::new(buffer_size, f));
        Self { on_wallet_funded, on_funding_failed, on_order_status_changed, on_order_settled }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_wallet_funded {
            result.wallet_funded_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_funding_failed {
            result.funding_failed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_status_changed {
            result.order_status_changed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_settled {
            result.order_settled_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a task per registered handler. Each one runs until every producer it handed out has been dropped.
    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_wallet_funded {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_funding_failed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_status_changed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_settled {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_wallet_funded: Option<Handler<WalletFundedEvent>>,
    pub on_funding_failed: Option<Handler<FundingFailedEvent>>,
    pub on_order_status_changed: Option<Handler<OrderStatusChangedEvent>>,
    pub on_order_settled: Option<Handler<OrderSettledEvent>>,
}

impl EventHooks {
    pub fn on_wallet_funded<F>(&mut self, f: F) -> &mut Self
    where F: Fn(WalletFundedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static {
        self.on_wallet_funded = Some(Arc::new(f));
        self
    }

    pub fn on_funding_failed<F>(&mut self, f: F) -> &mut Self
    where F: Fn(FundingFailedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static {
        self.on_funding_failed = Some(Arc::new(f));
        self
    }

    pub fn on_order_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: Fn(OrderStatusChangedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static {
        self.on_order_status_changed = Some(Arc::new(f));
        self
    }

    pub fn on_order_settled<F>(&mut self, f: F) -> &mut Self
    where F: Fn(OrderSettledEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static {
        self.on_order_settled = Some(Arc::new(f));
        self
    }
}
