use std::fmt::Display;

use chow_payment_engine::db_types::{LineItem, Naira};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Body of `POST /api/wallet/fund`. The amount is in naira, e.g. `5000` or `12.50`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundWalletRequest {
    pub amount: Naira,
    /// Paystack needs an email for the checkout. Defaults to the email in the access token.
    #[serde(default)]
    pub email: Option<String>,
}

/// Body of `POST /api/orders`. The customer is whoever holds the access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub vendor_id: String,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub delivery_fee: Naira,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RespondToOrderRequest {
    pub accept: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    pub available: bool,
}
