use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chow_common::Secret;
use chow_payment_engine::{
    db_types::{Naira, Principal},
    events::EventProducers,
    helpers::{WebhookVerifier, PAYSTACK_SIGNATURE_HEADER},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::LedgerManagement,
    AccountApi,
    OrderFlowApi,
    SqliteDatabase,
    WalletApi,
};
use log::debug;
use serde_json::json;

use super::mocks::MockGateway;
use crate::{
    auth::{JwtClaims, TokenIssuer, TokenValidator, ACCESS_TOKEN_HEADER},
    config::{AuthConfig, ServerOptions},
    middleware::JwtAuthFactory,
    paystack_routes::PaystackWebhookRoute,
};

pub const WEBHOOK_SECRET: &str = "sk_test_endpoint_tests_only";

// Test keys. DO NOT re-use them anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig { jwt_secret: Secret::new("endpoint-tests-only-0123456789abcdefghijklmnop".to_string()) }
}

pub fn issue_token(claims: JwtClaims) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(claims, None).expect("Failed to sign token")
}

pub fn verifier() -> WebhookVerifier {
    WebhookVerifier::new(Secret::new(WEBHOOK_SECRET.to_string()))
}

pub async fn new_db() -> SqliteDatabase {
    prepare_test_env(&random_db_path()).await
}

/// Registers the three engine APIs over `db`, with `gateway` standing in for Paystack.
pub fn register_apis(cfg: &mut ServiceConfig, db: SqliteDatabase, gateway: MockGateway) {
    cfg.app_data(web::Data::new(AccountApi::new(db.clone())))
        .app_data(web::Data::new(WalletApi::new(db.clone(), gateway, verifier(), EventProducers::default())))
        .app_data(web::Data::new(OrderFlowApi::new(db, EventProducers::default())))
        .app_data(web::Data::new(ServerOptions { use_x_forwarded_for: false, use_forwarded: false }));
}

/// Sends `req` to an app that has the given routes mounted under the authenticated `/api` scope.
///
/// Errors raised by middleware are turned into their HTTP responses, so the caller always gets a status and a body.
pub async fn api_request<F>(req: TestRequest, token: Option<&str>, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) + 'static {
    let req = match token {
        Some(t) => req.insert_header((ACCESS_TOKEN_HEADER, t)),
        None => req,
    };
    let validator = TokenValidator::new(&get_auth_config());
    let app = App::new().service(web::scope("/api").wrap(JwtAuthFactory::new(validator)).configure(configure));
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = res.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned());
            (status, body.unwrap_or_default())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = res.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned());
            (status, body.unwrap_or_default())
        },
    }
}

pub async fn get_request<F>(path: &str, token: Option<&str>, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) + 'static {
    api_request(TestRequest::get().uri(path), token, configure).await
}

pub async fn post_request<F>(path: &str, body: serde_json::Value, token: Option<&str>, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) + 'static {
    api_request(TestRequest::post().uri(path).set_json(body), token, configure).await
}

/// Posts a raw Paystack webhook body. The signature header is only added if `signature` is given.
pub async fn post_webhook(db: SqliteDatabase, body: &str, signature: Option<&str>) -> (StatusCode, String) {
    let mut req = TestRequest::post().uri("/paystack/webhook").set_payload(body.to_string());
    if let Some(sig) = signature {
        req = req.insert_header((PAYSTACK_SIGNATURE_HEADER, sig));
    }
    let app = App::new().service(
        web::scope("/paystack")
            .configure(move |cfg| register_apis(cfg, db, MockGateway::new()))
            .service(PaystackWebhookRoute::<SqliteDatabase, MockGateway>::new()),
    );
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = res.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned());
    (status, body.unwrap_or_default())
}

pub fn sign(body: &str) -> String {
    verifier().sign(body.as_bytes()).expect("Failed to sign webhook body")
}

pub fn charge_event(event: &str, status: &str, owner: &Principal, transaction_id: i64, kobo: i64) -> String {
    json!({
        "event": event,
        "data": {
            "id": 302961,
            "status": status,
            "reference": format!("ref-{transaction_id}"),
            "amount": kobo,
            "metadata": {
                "userId": owner.id,
                "userType": owner.role.to_string(),
                "transactionId": transaction_id.to_string()
            }
        }
    })
    .to_string()
}

/// Gives `owner` a wallet holding `amount`, funded through the ledger the same way a webhook would.
pub async fn funded_wallet(db: &SqliteDatabase, owner: &Principal, amount: Naira) {
    db.create_wallet(owner).await.expect("Failed to create wallet");
    if amount.is_positive() {
        let pending = db.insert_pending_funding(owner, amount).await.expect("Failed to insert pending funding");
        db.complete_funding(pending.id, amount, None).await.expect("Failed to complete funding");
    }
}

pub fn json_body(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response is not JSON ({e}): {body}"))
}
