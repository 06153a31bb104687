//! # Paystack tools
//!
//! A small client for the two Paystack endpoints the payment server needs:
//! * `POST /transaction/initialize` opens a hosted checkout session and hands back an authorization URL and reference.
//! * `GET /transaction/verify/{reference}` reports the gateway's view of a transaction. It is used to reconcile
//!   transactions whose webhook never arrived.
mod api;
mod config;
mod data_objects;
mod error;

pub use api::PaystackApi;
pub use config::PaystackConfig;
pub use data_objects::{
    InitializeTransactionRequest,
    InitializedTransaction,
    PaystackResponse,
    TransactionMetadata,
    VerifiedTransaction,
};
pub use error::PaystackApiError;
