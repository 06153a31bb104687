//! Chow Payment Engine
//!
//! The payment engine holds the money side of the Chow delivery platform: customer, vendor and rider wallets, wallet
//! funding through Paystack, and the order lifecycle that decides when money may move between wallets.
//!
//! The library is divided into three main sections:
//! 1. The backend contracts ([`mod@traits`]) and their SQLite implementation ([`SqliteDatabase`]). You should never
//!    need to touch the database directly. The data types that are stored are defined in [`mod@db_types`] and are
//!    public.
//! 2. The public API ([`mod@cpe_api`]): [`AccountApi`] for wallets and history, [`WalletApi`] for funding and webhook
//!    reconciliation, and [`OrderFlowApi`] for order transitions and settlement.
//! 3. Events ([`mod@events`]). The APIs publish an event whenever a wallet is funded, a funding fails, an order changes
//!    state or an order leg is settled. Hook into them with [`events::EventHooks`].
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

mod cpe_api;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use cpe_api::{
    accounts_api::AccountApi,
    errors::{AccountApiError, OrderFlowError, WalletApiError},
    gateway_event,
    order_flow_api::OrderFlowApi,
    order_objects,
    wallet_api::{FundingSession, WalletApi},
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
