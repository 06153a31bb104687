use actix_web::http::StatusCode;
use chow_payment_engine::{
    db_types::{Naira, Principal, TransactionStatus},
    traits::{GatewayClientError, GatewayPaymentStatus, GatewaySession, GatewayVerification, LedgerManagement},
    SqliteDatabase,
};
use serde_json::json;

use super::{
    helpers::{funded_wallet, get_request, issue_token, json_body, new_db, post_request, register_apis},
    mocks::MockGateway,
};
use crate::{
    auth::{JwtClaims, UserRole},
    routes::{
        CheckTokenRoute,
        CreateWalletRoute,
        FundWalletRoute,
        MyTransactionsRoute,
        MyWalletRoute,
        TransactionByIdRoute,
        VerifyFundingRoute,
        WalletForPrincipalRoute,
    },
};

fn wallet_routes(db: SqliteDatabase, gateway: MockGateway) -> impl FnOnce(&mut actix_web::web::ServiceConfig) {
    move |cfg| {
        register_apis(cfg, db, gateway);
        cfg.service(CheckTokenRoute::new())
            .service(CreateWalletRoute::<SqliteDatabase>::new())
            .service(MyWalletRoute::<SqliteDatabase>::new())
            .service(MyTransactionsRoute::<SqliteDatabase>::new())
            .service(TransactionByIdRoute::<SqliteDatabase>::new())
            .service(VerifyFundingRoute::<SqliteDatabase, MockGateway>::new())
            .service(FundWalletRoute::<SqliteDatabase, MockGateway>::new())
            .service(WalletForPrincipalRoute::<SqliteDatabase>::new());
    }
}

#[actix_web::test]
async fn no_access_token() {
    let db = new_db().await;
    let (status, body) = get_request("/api/wallet", None, wallet_routes(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("No access token"), "{body}");
}

#[actix_web::test]
async fn tampered_access_token() {
    let db = new_db().await;
    let mut token = issue_token(JwtClaims::new("c-1", UserRole::Customer));
    token.replace_range(token.len() - 10..token.len() - 5, "AAAAA");
    let (status, _) = get_request("/api/wallet", Some(&token), wallet_routes(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn check_token_echoes_claims() {
    let db = new_db().await;
    let token = issue_token(JwtClaims::new("admin-1", UserRole::Admin).with_email("ops@chow.ng"));
    let (status, body) = get_request("/api/check_token", Some(&token), wallet_routes(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::OK);
    let claims = json_body(&body);
    assert_eq!(claims["sub"], "admin-1");
    assert_eq!(claims["role"], "admin");
    assert_eq!(claims["email"], "ops@chow.ng");
}

#[actix_web::test]
async fn create_and_fetch_wallet() {
    let db = new_db().await;
    let token = issue_token(JwtClaims::new("v-7", UserRole::Vendor));
    let (status, body) =
        post_request("/api/wallet", json!({}), Some(&token), wallet_routes(db.clone(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let created = json_body(&body);
    assert_eq!(created["owner_role"], "vendor");
    assert_eq!(created["owner_id"], "v-7");
    assert_eq!(created["balance"], 0);

    let (status, body) = get_request("/api/wallet", Some(&token), wallet_routes(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["id"], created["id"]);
}

#[actix_web::test]
async fn missing_wallet_is_not_found() {
    let db = new_db().await;
    let token = issue_token(JwtClaims::new("r-1", UserRole::Rider));
    let (status, _) = get_request("/api/wallet", Some(&token), wallet_routes(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn admins_do_not_have_wallets() {
    let db = new_db().await;
    let token = issue_token(JwtClaims::new("admin-1", UserRole::Admin));
    let (status, _) = get_request("/api/wallet", Some(&token), wallet_routes(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn only_admins_can_look_up_other_wallets() {
    let db = new_db().await;
    funded_wallet(&db, &Principal::customer("c-9"), Naira::from_naira(250)).await;
    let customer = issue_token(JwtClaims::new("c-1", UserRole::Customer));
    let (status, _) =
        get_request("/api/wallets/customer/c-9", Some(&customer), wallet_routes(db.clone(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = issue_token(JwtClaims::new("admin-1", UserRole::Admin));
    let (status, body) =
        get_request("/api/wallets/customer/c-9", Some(&admin), wallet_routes(db.clone(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["balance"], 250);

    let (status, _) = get_request("/api/wallets/chef/c-9", Some(&admin), wallet_routes(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn fund_wallet_opens_a_checkout() {
    let db = new_db().await;
    funded_wallet(&db, &Principal::customer("c-1"), Naira::default()).await;
    let mut gateway = MockGateway::new();
    gateway
        .expect_initialize_payment()
        .withf(|req| {
            req.email == "ada@chow.ng" && req.amount.to_minor_units() == 500_000 && req.principal.id == "c-1"
        })
        .times(1)
        .returning(|req| {
            Ok(GatewaySession {
                authorization_url: "https://checkout.paystack.com/abc".to_string(),
                access_code: Some("abc".to_string()),
                reference: format!("ref-{}", req.transaction_id),
            })
        });
    let token = issue_token(JwtClaims::new("c-1", UserRole::Customer).with_email("ada@chow.ng"));
    let (status, body) =
        post_request("/api/wallet/fund", json!({"amount": 5000}), Some(&token), wallet_routes(db, gateway)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let session = json_body(&body);
    assert_eq!(session["authorization_url"], "https://checkout.paystack.com/abc");
    assert_eq!(session["transaction"]["status"], "pending");
    assert_eq!(session["transaction"]["amount"], 5000);
    let id = session["transaction"]["id"].as_i64().expect("transaction id");
    assert_eq!(session["reference"], format!("ref-{id}"));
}

#[actix_web::test]
async fn fund_wallet_takes_naira_with_kobo() {
    let db = new_db().await;
    funded_wallet(&db, &Principal::customer("c-1"), Naira::default()).await;
    let mut gateway = MockGateway::new();
    gateway.expect_initialize_payment().withf(|req| req.amount.to_minor_units() == 1_250).times(1).returning(|req| {
        Ok(GatewaySession {
            authorization_url: "https://checkout.paystack.com/def".to_string(),
            access_code: None,
            reference: format!("ref-{}", req.transaction_id),
        })
    });
    let token = issue_token(JwtClaims::new("c-1", UserRole::Customer).with_email("ada@chow.ng"));
    let (status, body) = post_request(
        "/api/wallet/fund",
        json!({"amount": 12.5}),
        Some(&token),
        wallet_routes(db.clone(), gateway),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body)["transaction"]["amount"], 12.5);

    // Fractions of a kobo are not money
    let (status, _) =
        post_request("/api/wallet/fund", json!({"amount": 1.005}), Some(&token), wallet_routes(db, MockGateway::new()))
            .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn fund_wallet_needs_an_email() {
    let db = new_db().await;
    funded_wallet(&db, &Principal::customer("c-1"), Naira::default()).await;
    let token = issue_token(JwtClaims::new("c-1", UserRole::Customer));
    let (status, body) =
        post_request("/api/wallet/fund", json!({"amount": 5000}), Some(&token), wallet_routes(db, MockGateway::new()))
            .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("email"), "{body}");
}

#[actix_web::test]
async fn fund_wallet_rejects_non_positive_amounts() {
    let db = new_db().await;
    funded_wallet(&db, &Principal::customer("c-1"), Naira::default()).await;
    let token = issue_token(JwtClaims::new("c-1", UserRole::Customer));
    let (status, _) = post_request(
        "/api/wallet/fund",
        json!({"amount": 0, "email": "ada@chow.ng"}),
        Some(&token),
        wallet_routes(db, MockGateway::new()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn fund_wallet_when_paystack_is_down() {
    let db = new_db().await;
    funded_wallet(&db, &Principal::customer("c-1"), Naira::default()).await;
    let mut gateway = MockGateway::new();
    gateway
        .expect_initialize_payment()
        .times(1)
        .returning(|_| Err(GatewayClientError::Unavailable("connection refused".to_string())));
    let token = issue_token(JwtClaims::new("c-1", UserRole::Customer).with_email("ada@chow.ng"));
    let (status, _) =
        post_request("/api/wallet/fund", json!({"amount": 5000}), Some(&token), wallet_routes(db.clone(), gateway))
            .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let history = db.fetch_transactions_for_owner(&Principal::customer("c-1")).await.expect("history");
    let failed = history.iter().filter(|t| t.status == TransactionStatus::Failed).count();
    assert_eq!(failed, 1, "the pending credit is failed straight away");
}

#[actix_web::test]
async fn verify_funding_applies_the_gateway_outcome() {
    let db = new_db().await;
    let owner = Principal::rider("r-1");
    funded_wallet(&db, &owner, Naira::default()).await;
    let pending = db.insert_pending_funding(&owner, Naira::from_naira(80)).await.expect("pending");
    let reference = format!("ref-{}", pending.id);
    db.attach_reference(pending.id, &reference).await.expect("reference");

    let mut gateway = MockGateway::new();
    let id = pending.id;
    gateway.expect_verify_payment().withf(move |r| r == format!("ref-{id}")).times(1).returning(move |r| {
        Ok(GatewayVerification {
            reference: r.to_string(),
            status: GatewayPaymentStatus::Success,
            amount: Naira::from_naira(80),
            transaction_id: Some(id),
        })
    });
    let token = issue_token(JwtClaims::new("r-1", UserRole::Rider));
    let path = format!("/api/transaction/{id}/verify");
    let (status, body) = post_request(&path, json!({}), Some(&token), wallet_routes(db.clone(), gateway)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let outcome = json_body(&body);
    assert_eq!(outcome["result"], "credited");
    assert_eq!(outcome["wallet"]["balance"], 80);

    // Already completed, so Paystack is not asked again
    let (status, body) = post_request(&path, json!({}), Some(&token), wallet_routes(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["result"], "unchanged");
}

#[actix_web::test]
async fn transactions_are_private() {
    let db = new_db().await;
    let owner = Principal::customer("c-1");
    funded_wallet(&db, &owner, Naira::from_naira(10)).await;
    let history = db.fetch_transactions_for_owner(&owner).await.expect("history");
    let id = history[0].id;

    let token = issue_token(JwtClaims::new("c-1", UserRole::Customer));
    let routes = wallet_routes(db.clone(), MockGateway::new());
    let (status, body) = get_request("/api/wallet/transactions", Some(&token), routes).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body).as_array().map(Vec::len), Some(1));

    let path = format!("/api/transaction/{id}");
    let (status, _) = get_request(&path, Some(&token), wallet_routes(db.clone(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::OK);
    // Same id, different role
    let vendor = issue_token(JwtClaims::new("c-1", UserRole::Vendor));
    let (status, _) = get_request(&path, Some(&vendor), wallet_routes(db.clone(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let admin = issue_token(JwtClaims::new("admin-1", UserRole::Admin));
    let (status, _) = get_request(&path, Some(&admin), wallet_routes(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::OK);
}
