use std::collections::HashMap;

use chow_common::Secret;
use chow_payment_engine::{
    db_types::{Naira, Principal, Role},
    events::EventProducers,
    helpers::WebhookVerifier,
    order_objects::TransitionError,
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        stub_gateway::StubGateway,
    },
    traits::{LedgerError, LedgerManagement},
    AccountApi,
    AccountApiError,
    OrderFlowApi,
    OrderFlowError,
    SqliteDatabase,
    WalletApi,
    WalletApiError,
};
use cucumber::World;
use log::*;
use serde_json::json;

pub const WEBHOOK_SECRET: &str = "sk_test_cucumber_secret";

#[derive(Default, Debug, World)]
pub struct ChowWorld {
    pub system: Option<ChowSystem>,
    /// The kind of error returned by the last operation, if it failed
    pub last_error: Option<String>,
    pub last_funding: Option<i64>,
    pub last_order: Option<i64>,
    pub orders_by_name: HashMap<String, i64>,
}

#[derive(Debug)]
pub struct ChowSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub gateway: StubGateway,
    pub verifier: WebhookVerifier,
    pub accounts: AccountApi<SqliteDatabase>,
    pub wallets: WalletApi<SqliteDatabase, StubGateway>,
    pub orders: OrderFlowApi<SqliteDatabase>,
}

impl ChowSystem {
    pub async fn new() -> Self {
        let db_path = random_db_path();
        let db = prepare_test_env(&db_path).await;
        debug!("Created database: {db_path}");
        let gateway = StubGateway::default();
        let verifier = WebhookVerifier::new(Secret::from(WEBHOOK_SECRET));
        let accounts = AccountApi::new(db.clone());
        let wallets = WalletApi::new(db.clone(), gateway.clone(), verifier.clone(), EventProducers::default());
        let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
        Self { db_path, db, gateway, verifier, accounts, wallets, orders }
    }
}

impl ChowWorld {
    pub fn system(&self) -> &ChowSystem {
        self.system.as_ref().expect("System not initialised. Start the scenario with 'Given a fresh install'")
    }

    pub fn last_funding(&self) -> i64 {
        self.last_funding.expect("No funding has been started in this scenario")
    }

    pub fn last_order(&self) -> i64 {
        self.last_order.expect("No order has been placed in this scenario")
    }

    pub fn record<T, E, F>(&mut self, result: Result<T, E>, kind: F) -> Option<T>
    where
        E: std::fmt::Display,
        F: Fn(&E) -> &'static str,
    {
        match result {
            Ok(v) => {
                self.last_error = None;
                Some(v)
            },
            Err(e) => {
                info!("Operation failed: {e}");
                self.last_error = Some(kind(&e).to_string());
                None
            },
        }
    }

    /// Funds a wallet directly through the ledger, as if a checkout had completed.
    pub async fn give_balance(&self, owner: &Principal, amount: Naira) {
        let db = &self.system().db;
        db.create_wallet(owner).await.expect("Could not create wallet");
        let pending = db.insert_pending_funding(owner, amount).await.expect("Could not create funding");
        db.complete_funding(pending.id, amount, None).await.expect("Could not complete funding");
    }

    pub async fn balance(&self, owner: &Principal) -> Naira {
        self.system().accounts.wallet(owner).await.expect("Wallet not found").balance
    }
}

pub fn principal(role: &str, id: &str) -> Principal {
    let role = role.parse::<Role>().expect("Unknown role");
    Principal::new(role, id)
}

pub fn charge_event(event: &str, status: &str, transaction_id: i64, owner: &Principal, kobo: i64) -> String {
    json!({
        "event": event,
        "data": {
            "id": 1_000_000 + transaction_id,
            "status": status,
            "reference": StubGateway::reference_for(transaction_id),
            "amount": kobo,
            "currency": "NGN",
            "metadata": {
                "userId": owner.id,
                "userType": owner.role.to_string(),
                "transactionId": transaction_id.to_string(),
            }
        }
    })
    .to_string()
}

pub fn ledger_kind(e: &LedgerError) -> &'static str {
    match e {
        LedgerError::WalletNotFound(_) | LedgerError::TransactionNotFound(_) | LedgerError::OrderNotFound(_) => {
            "NotFound"
        },
        LedgerError::InsufficientBalance { .. } => "InsufficientBalance",
        LedgerError::AlreadySettled { .. } => "AlreadySettled",
        LedgerError::OrderNotSettleable(_) => "InvalidOrderState",
        LedgerError::TransactionAlreadyFinalized { .. } => "AlreadyFinalized",
        LedgerError::InvalidAmount(_) | LedgerError::NotAFundingTransaction(_) => "Validation",
        LedgerError::ReferenceAlreadyExists(_) | LedgerError::Conflict(_) => "Conflict",
        LedgerError::DatabaseError(_) => "DatabaseError",
    }
}

pub fn wallet_kind(e: &WalletApiError) -> &'static str {
    match e {
        WalletApiError::Validation(_) => "Validation",
        WalletApiError::SignatureInvalid(_) => "SignatureInvalid",
        WalletApiError::UnhandledEvent(_) => "UnhandledEvent",
        WalletApiError::Forbidden(_) => "Forbidden",
        WalletApiError::Gateway(_) => "GatewayError",
        WalletApiError::Ledger(e) => ledger_kind(e),
    }
}

pub fn order_kind(e: &OrderFlowError) -> &'static str {
    match e {
        OrderFlowError::Validation(_) => "Validation",
        OrderFlowError::Forbidden(_) | OrderFlowError::Transition(TransitionError::Forbidden { .. }) => "Forbidden",
        OrderFlowError::OrderNotFound(_) => "NotFound",
        OrderFlowError::Transition(TransitionError::InvalidOrderState { .. }) => "InvalidOrderState",
        OrderFlowError::Transition(TransitionError::AlreadySettled { .. }) => "AlreadySettled",
        OrderFlowError::Store(_) => "DatabaseError",
        OrderFlowError::Conflict(_) => "Conflict",
        OrderFlowError::Ledger(e) => ledger_kind(e),
    }
}

pub fn account_kind(e: &AccountApiError) -> &'static str {
    match e {
        AccountApiError::Forbidden(_) => "Forbidden",
        AccountApiError::Ledger(e) => ledger_kind(e),
    }
}
