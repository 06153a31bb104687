use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{Naira, Principal};

/// The outbound half of the payment gateway: opening hosted checkouts and asking about their outcome.
///
/// The payment server provides the Paystack implementation. The engine only depends on this trait.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayClient: Clone {
    async fn initialize_payment(&self, request: GatewayPaymentRequest) -> Result<GatewaySession, GatewayClientError>;

    async fn verify_payment(&self, reference: &str) -> Result<GatewayVerification, GatewayClientError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayPaymentRequest {
    pub email: String,
    pub amount: Naira,
    pub principal: Principal,
    /// Our transaction id. The gateway echoes it back in the webhook metadata.
    pub transaction_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySession {
    pub authorization_url: String,
    pub access_code: Option<String>,
    pub reference: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayPaymentStatus {
    Success,
    Failed,
    /// Not finished yet (ongoing, pending, processing, ...). Nothing should change.
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayVerification {
    pub reference: String,
    pub status: GatewayPaymentStatus,
    pub amount: Naira,
    /// The correlation id from the checkout metadata, if the gateway returned it.
    pub transaction_id: Option<i64>,
}

#[derive(Debug, Clone, Error)]
pub enum GatewayClientError {
    #[error("The payment gateway could not be reached: {0}")]
    Unavailable(String),
    #[error("The payment gateway rejected the request: {0}")]
    Rejected(String),
}
