use std::time::Duration;

use chow_payment_engine::{
    db_types::{LineItem, Naira, NewOrder, OrderStatus, Principal, SettlementLeg, TransactionStatus},
    traits::LedgerManagement,
};
use cucumber::{then, when};

use crate::cucumber::{
    world::{account_kind, charge_event, order_kind, principal, wallet_kind},
    ChowWorld,
};

//--------------------------------------        Funding       ---------------------------------------------------------

#[when(expr = "{word} {string} starts a funding of {int} naira")]
async fn start_funding(world: &mut ChowWorld, role: String, id: String, naira: i64) {
    let owner = principal(&role, &id);
    let email = format!("{id}@chow.test");
    let result = world.system().wallets.initialize_funding(&owner, &email, Naira::from_naira(naira)).await;
    if let Some(session) = world.record(result, wallet_kind) {
        world.last_funding = Some(session.transaction.id);
    }
}

#[when("the gateway is offline")]
async fn gateway_offline(world: &mut ChowWorld) {
    world.system().gateway.set_offline(true);
}

async fn send_webhook(world: &mut ChowWorld, event: &str, status: &str, kobo: i64, tamper: bool) {
    let tx_id = world.last_funding();
    let tx = world.system().db.fetch_transaction(tx_id).await.expect("db error").expect("funding not found");
    let body = charge_event(event, status, tx_id, &tx.owner(), kobo);
    let signature = world.system().verifier.sign(body.as_bytes()).expect("Could not sign");
    let body = if tamper { body.replace(&kobo.to_string(), &(kobo * 10).to_string()) } else { body };
    let result = world.system().wallets.apply_gateway_event(body.as_bytes(), Some(&signature)).await;
    world.record(result, wallet_kind);
}

#[when(expr = "the gateway sends {string} for the last funding with amount {int} kobo")]
async fn gateway_sends(world: &mut ChowWorld, event: String, kobo: i64) {
    send_webhook(world, &event, "success", kobo, false).await;
}

#[when(expr = "the gateway sends {string} with status {string} for the last funding")]
async fn gateway_sends_status(world: &mut ChowWorld, event: String, status: String) {
    send_webhook(world, &event, &status, 100, false).await;
}

#[when(expr = "a tampered {string} for the last funding with amount {int} kobo arrives")]
async fn tampered_webhook(world: &mut ChowWorld, event: String, kobo: i64) {
    send_webhook(world, &event, "success", kobo, true).await;
}

#[when("a webhook arrives without a signature")]
async fn unsigned_webhook(world: &mut ChowWorld) {
    let tx_id = world.last_funding();
    let body = charge_event("charge.success", "success", tx_id, &Principal::customer("anyone"), 100);
    let result = world.system().wallets.apply_gateway_event(body.as_bytes(), None).await;
    world.record(result, wallet_kind);
}

#[when("abandoned fundings are expired")]
async fn expire_fundings(world: &mut ChowWorld) {
    // timestamps have one-second resolution
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let result = world.system().wallets.expire_pending_funding(chrono::Duration::zero()).await;
    world.record(result, wallet_kind);
}

#[when("the last funding is verified with the gateway")]
async fn verify_last_funding(world: &mut ChowWorld) {
    let tx_id = world.last_funding();
    let result = world.system().wallets.verify_funding(tx_id, None).await;
    world.record(result, wallet_kind);
}

#[when(expr = "the gateway reports the last funding as {word}")]
async fn gateway_reports(world: &mut ChowWorld, status: String) {
    let tx_id = world.last_funding();
    let status = match status.as_str() {
        "success" => chow_payment_engine::traits::GatewayPaymentStatus::Success,
        "failed" => chow_payment_engine::traits::GatewayPaymentStatus::Failed,
        _ => chow_payment_engine::traits::GatewayPaymentStatus::Pending,
    };
    let reference = chow_payment_engine::test_utils::stub_gateway::StubGateway::reference_for(tx_id);
    world.system().gateway.set_outcome(&reference, status);
}

#[then(expr = "the last funding is {word}")]
async fn funding_status(world: &mut ChowWorld, status: String) {
    let tx_id = world.last_funding();
    let tx = world.system().db.fetch_transaction(tx_id).await.expect("db error").expect("funding not found");
    let expected = status.parse::<TransactionStatus>().expect("Unknown status");
    assert_eq!(tx.status, expected);
}

#[then(expr = "the last funding has a gateway reference")]
async fn funding_has_reference(world: &mut ChowWorld) {
    let tx_id = world.last_funding();
    let tx = world.system().db.fetch_transaction(tx_id).await.expect("db error").expect("funding not found");
    assert!(tx.reference.is_some());
}

#[then(expr = "no checkout was opened")]
async fn no_checkout(world: &mut ChowWorld) {
    assert_eq!(world.system().gateway.checkouts(), 0);
}

#[then(expr = "{word} {string} has a balance of {int} naira")]
async fn check_balance(world: &mut ChowWorld, role: String, id: String, naira: i64) {
    let owner = principal(&role, &id);
    assert_eq!(world.balance(&owner).await, Naira::from_naira(naira));
}

#[then(expr = "{word} {string} has a balance of {int} kobo")]
async fn check_balance_kobo(world: &mut ChowWorld, role: String, id: String, kobo: i64) {
    let owner = principal(&role, &id);
    assert_eq!(world.balance(&owner).await, Naira::from(kobo));
}

#[then(expr = "{word} {string} has {int} transaction(s)")]
async fn transaction_count(world: &mut ChowWorld, role: String, id: String, count: usize) {
    let owner = principal(&role, &id);
    let result = world.system().accounts.transactions(&owner).await;
    let txs = world.record(result, account_kind).expect("Could not fetch transactions");
    assert_eq!(txs.len(), count);
}

//--------------------------------------        Orders        ---------------------------------------------------------

#[when(
    expr = "customer {string} orders {int} x {string} at {int} naira from vendor {string} with a delivery fee of {int} \
            naira"
)]
async fn place_order(
    world: &mut ChowWorld,
    customer: String,
    qty: i64,
    item: String,
    price: i64,
    vendor: String,
    fee: i64,
) {
    let order = NewOrder::new(customer, vendor, Naira::from_naira(fee)).with_item(LineItem::new(
        item,
        qty,
        Naira::from_naira(price),
    ));
    let result = world.system().orders.place_order(order).await;
    if let Some(order) = world.record(result, order_kind) {
        world.last_order = Some(order.id);
    }
}

#[when(expr = "vendor {string} {word} the order")]
async fn vendor_responds(world: &mut ChowWorld, vendor: String, verb: String) {
    let order_id = world.last_order();
    let orders = &world.system().orders;
    let result = match verb.as_str() {
        "accepts" => orders.respond(order_id, &vendor, true).await,
        "declines" => orders.respond(order_id, &vendor, false).await,
        "offers" => orders.set_availability(order_id, &vendor, true).await,
        "withdraws" => orders.set_availability(order_id, &vendor, false).await,
        _ => panic!("Unknown vendor action: {verb}"),
    };
    world.record(result, order_kind);
}

#[when(expr = "rider {string} {word} the order")]
async fn rider_acts(world: &mut ChowWorld, rider: String, verb: String) {
    let order_id = world.last_order();
    let orders = &world.system().orders;
    let result = match verb.as_str() {
        "collects" => orders.accept_pickup(order_id, &rider).await,
        "delivers" => orders.mark_delivered(order_id, &rider).await,
        _ => panic!("Unknown rider action: {verb}"),
    };
    world.record(result, order_kind);
}

#[when(expr = "customer {string} confirms delivery")]
async fn customer_confirms(world: &mut ChowWorld, customer: String) {
    let order_id = world.last_order();
    let result = world.system().orders.confirm_delivery(order_id, &customer).await;
    world.record(result, order_kind);
}

#[when(expr = "customer {string} settles the {word} leg")]
async fn customer_settles(world: &mut ChowWorld, customer: String, leg: String) {
    let order_id = world.last_order();
    let leg = leg.parse::<SettlementLeg>().expect("Unknown leg");
    let actor = Principal::customer(customer);
    let result = world.system().orders.settle(order_id, leg, Some(&actor)).await;
    world.record(result, order_kind);
}

#[then(expr = "the order status is {string}")]
async fn order_status(world: &mut ChowWorld, status: String) {
    let order = world.system().orders.order_for(world.last_order(), None).await.expect("Order not found");
    assert_eq!(order.order_status, status.parse::<OrderStatus>().expect("Unknown status"));
}

#[then(expr = "the order is picked up by {string} and no longer available")]
async fn picked_up(world: &mut ChowWorld, rider: String) {
    let order = world.system().orders.order_for(world.last_order(), None).await.expect("Order not found");
    assert!(order.picked_up);
    assert!(!order.available_for_pickup);
    assert_eq!(order.rider_id.as_deref(), Some(rider.as_str()));
}

#[then(expr = "the order totals {int} naira")]
async fn order_total(world: &mut ChowWorld, naira: i64) {
    let order = world.system().orders.order_for(world.last_order(), None).await.expect("Order not found");
    assert_eq!(order.total_price, Naira::from_naira(naira));
}

#[then(expr = "{int} order(s) is/are available for pickup")]
async fn available_count(world: &mut ChowWorld, count: usize) {
    let orders = world.system().orders.available_for_pickup().await.expect("Could not list orders");
    assert_eq!(orders.len(), count);
}

#[then(expr = "the {word} leg is settled")]
async fn leg_settled(world: &mut ChowWorld, leg: String) {
    let leg = leg.parse::<SettlementLeg>().expect("Unknown leg");
    let order = world.system().orders.order_for(world.last_order(), None).await.expect("Order not found");
    assert!(order.is_settled(leg));
}

//--------------------------------------       Outcomes       ---------------------------------------------------------

#[then("the operation succeeds")]
async fn succeeds(world: &mut ChowWorld) {
    assert_eq!(world.last_error, None);
}

#[then(expr = "the operation fails with {word}")]
async fn fails_with(world: &mut ChowWorld, kind: String) {
    assert_eq!(world.last_error.as_deref(), Some(kind.as_str()));
}
