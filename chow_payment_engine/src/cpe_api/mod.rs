//! # Payment engine public API
//!
//! The API is split by concern so that callers only need a backend that implements the traits a given API uses.
//!
//! * [`accounts_api`] creates wallets and answers queries about balances and transaction history.
//! * [`wallet_api`] reconciles wallet funding with the payment gateway: opening checkouts, applying verified webhooks,
//!   verifying by reference and expiring abandoned checkouts.
//! * [`order_flow_api`] applies the order lifecycle transitions and settles order payments.
//!
//! An API instance is created by handing it a backend:
//!
//! ```rust,ignore
//! use chow_payment_engine::{AccountApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/chow_store.db", 25).await?;
//! let api = AccountApi::new(db);
//! let wallet = api.wallet(&Principal::customer("c-1")).await?;
//! ```
pub mod accounts_api;
pub mod errors;
pub mod gateway_event;
pub mod order_flow_api;
pub mod order_objects;
pub mod wallet_api;
