use actix_web::{http::StatusCode, web::ServiceConfig};
use chow_payment_engine::{
    db_types::{Naira, Principal},
    SqliteDatabase,
};
use serde_json::{json, Value};

use super::{
    helpers::{funded_wallet, get_request, issue_token, json_body, new_db, post_request, register_apis},
    mocks::MockGateway,
};
use crate::{
    auth::{JwtClaims, UserRole},
    routes::{
        AcceptPickupRoute,
        AvailableOrdersRoute,
        ConfirmDeliveryRoute,
        MarkDeliveredRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        PlaceOrderRoute,
        RespondToOrderRoute,
        SetAvailabilityRoute,
        SettleRiderRoute,
        SettleVendorRoute,
    },
};

fn order_routes(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        register_apis(cfg, db, MockGateway::new());
        cfg.service(PlaceOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(AvailableOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(RespondToOrderRoute::<SqliteDatabase>::new())
            .service(SetAvailabilityRoute::<SqliteDatabase>::new())
            .service(AcceptPickupRoute::<SqliteDatabase>::new())
            .service(MarkDeliveredRoute::<SqliteDatabase>::new())
            .service(ConfirmDeliveryRoute::<SqliteDatabase>::new())
            .service(SettleVendorRoute::<SqliteDatabase>::new())
            .service(SettleRiderRoute::<SqliteDatabase>::new());
    }
}

fn customer() -> String {
    issue_token(JwtClaims::new("c-1", UserRole::Customer))
}

fn vendor() -> String {
    issue_token(JwtClaims::new("v-1", UserRole::Vendor))
}

fn rider() -> String {
    issue_token(JwtClaims::new("r-1", UserRole::Rider))
}

fn admin() -> String {
    issue_token(JwtClaims::new("admin-1", UserRole::Admin))
}

async fn post(db: &SqliteDatabase, path: &str, body: Value, token: &str) -> (StatusCode, Value) {
    let (status, body) = post_request(path, body, Some(token), order_routes(db.clone())).await;
    (status, json_body(&body))
}

/// Jollof (2 x 1,500) and a drink (500), plus 700 for delivery.
async fn place_order(db: &SqliteDatabase) -> i64 {
    let body = json!({
        "vendor_id": "v-1",
        "items": [
            {"menu_item_id": "jollof", "quantity": 2, "unit_price": 1500},
            {"menu_item_id": "zobo", "quantity": 1, "unit_price": 500}
        ],
        "delivery_fee": 700
    });
    let (status, order) = post(db, "/api/orders", body, &customer()).await;
    assert_eq!(status, StatusCode::OK, "{order}");
    order["id"].as_i64().expect("order id")
}

/// Takes a fresh order all the way to a confirmed delivery.
async fn deliver_order(db: &SqliteDatabase, id: i64) {
    let steps = [
        (format!("/api/order/{id}/respond"), json!({"accept": true}), vendor()),
        (format!("/api/order/{id}/availability"), json!({"available": true}), vendor()),
        (format!("/api/order/{id}/pickup"), json!({}), rider()),
        (format!("/api/order/{id}/deliver"), json!({}), rider()),
        (format!("/api/order/{id}/confirm"), json!({}), customer()),
    ];
    for (path, body, token) in steps {
        let (status, order) = post(db, &path, body, &token).await;
        assert_eq!(status, StatusCode::OK, "{path}: {order}");
    }
}

#[actix_web::test]
async fn place_order_computes_total() {
    let db = new_db().await;
    let id = place_order(&db).await;
    let (status, body) = get_request(&format!("/api/order/{id}"), Some(&customer()), order_routes(db)).await;
    assert_eq!(status, StatusCode::OK);
    let order = json_body(&body);
    assert_eq!(order["total_price"], 3500);
    assert_eq!(order["delivery_fee"], 700);
    assert_eq!(order["order_status"], "new");
    assert_eq!(order["accepted_status"], "pending");
    assert_eq!(order["vendor_paid"], false);
}

#[actix_web::test]
async fn vendors_cannot_place_orders() {
    let db = new_db().await;
    let body = json!({"vendor_id": "v-1", "items": [{"menu_item_id": "jollof", "quantity": 1, "unit_price": 100}]});
    let (status, _) = post(&db, "/api/orders", body, &vendor()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn orders_too_large_to_total_are_rejected() {
    let db = new_db().await;
    let body = json!({
        "vendor_id": "v-1",
        "items": [{"menu_item_id": "jollof", "quantity": 2, "unit_price": 90_000_000_000_000_000i64}]
    });
    let (status, body) = post(&db, "/api/orders", body, &customer()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(body.to_string().contains("too large"), "{body}");
}

#[actix_web::test]
async fn empty_orders_are_rejected() {
    let db = new_db().await;
    let (status, _) = post(&db, "/api/orders", json!({"vendor_id": "v-1", "items": []}), &customer()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn strangers_cannot_see_an_order() {
    let db = new_db().await;
    let id = place_order(&db).await;
    let stranger = issue_token(JwtClaims::new("c-2", UserRole::Customer));
    let (status, _) = get_request(&format!("/api/order/{id}"), Some(&stranger), order_routes(db.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = get_request(&format!("/api/order/{id}"), Some(&admin()), order_routes(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get_request("/api/order/9999", Some(&admin()), order_routes(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn order_lifecycle() {
    let db = new_db().await;
    let id = place_order(&db).await;

    // Not on the pickup board until the vendor accepts and marks it ready
    let (status, body) = get_request("/api/orders/available", Some(&rider()), order_routes(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!([]));

    let (status, order) = post(&db, &format!("/api/order/{id}/respond"), json!({"accept": true}), &vendor()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["accepted_status"], "accepted");
    let (status, order) =
        post(&db, &format!("/api/order/{id}/availability"), json!({"available": true}), &vendor()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["available_for_pickup"], true);

    let (_, body) = get_request("/api/orders/available", Some(&rider()), order_routes(db.clone())).await;
    assert_eq!(json_body(&body).as_array().map(Vec::len), Some(1));

    let (status, order) = post(&db, &format!("/api/order/{id}/pickup"), json!({}), &rider()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["order_status"], "in-transit");
    assert_eq!(order["rider_id"], "r-1");

    // Someone else got there first
    let late_rider = issue_token(JwtClaims::new("r-2", UserRole::Rider));
    let (status, _) = post(&db, &format!("/api/order/{id}/pickup"), json!({}), &late_rider).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, order) = post(&db, &format!("/api/order/{id}/deliver"), json!({}), &rider()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["order_status"], "delivered");
    assert_eq!(order["delivered_status"], true);

    let (status, order) = post(&db, &format!("/api/order/{id}/confirm"), json!({}), &customer()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["confirm_delivered_by_customer"], true);

    let (_, body) = get_request("/api/orders", Some(&rider()), order_routes(db)).await;
    assert_eq!(json_body(&body)[0]["id"], id);
}

#[actix_web::test]
async fn only_the_vendor_can_respond() {
    let db = new_db().await;
    let id = place_order(&db).await;
    let other_vendor = issue_token(JwtClaims::new("v-2", UserRole::Vendor));
    let (status, _) = post(&db, &format!("/api/order/{id}/respond"), json!({"accept": true}), &other_vendor).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn cannot_settle_before_delivery() {
    let db = new_db().await;
    funded_wallet(&db, &Principal::customer("c-1"), Naira::from_naira(10_000)).await;
    let id = place_order(&db).await;
    let (status, body) = post(&db, &format!("/api/order/{id}/settle/vendor"), json!({}), &customer()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[actix_web::test]
async fn settle_both_legs() {
    let db = new_db().await;
    funded_wallet(&db, &Principal::customer("c-1"), Naira::from_naira(10_000)).await;
    let id = place_order(&db).await;
    deliver_order(&db, id).await;

    let (status, receipt) = post(&db, &format!("/api/order/{id}/settle/vendor"), json!({}), &customer()).await;
    assert_eq!(status, StatusCode::OK, "{receipt}");
    assert_eq!(receipt["amount"], 3500);
    let (status, receipt) = post(&db, &format!("/api/order/{id}/settle/rider"), json!({}), &admin()).await;
    assert_eq!(status, StatusCode::OK, "{receipt}");
    assert_eq!(receipt["amount"], 700);

    // Each leg is paid once
    let (status, _) = post(&db, &format!("/api/order/{id}/settle/vendor"), json!({}), &customer()).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = get_request(&format!("/api/order/{id}"), Some(&customer()), order_routes(db)).await;
    let order = json_body(&body);
    assert_eq!(order["vendor_paid"], true);
    assert_eq!(order["rider_paid"], true);
}

#[actix_web::test]
async fn settlement_needs_funds() {
    let db = new_db().await;
    funded_wallet(&db, &Principal::customer("c-1"), Naira::from_naira(100)).await;
    let id = place_order(&db).await;
    deliver_order(&db, id).await;
    let (status, body) = post(&db, &format!("/api/order/{id}/settle/vendor"), json!({}), &customer()).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED, "{body}");
}

#[actix_web::test]
async fn riders_cannot_settle() {
    let db = new_db().await;
    funded_wallet(&db, &Principal::customer("c-1"), Naira::from_naira(10_000)).await;
    let id = place_order(&db).await;
    deliver_order(&db, id).await;
    let (status, _) = post(&db, &format!("/api/order/{id}/settle/rider"), json!({}), &rider()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
