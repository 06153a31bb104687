//! Inbound Paystack webhook payloads.
//!
//! ```json
//! {
//!   "event": "charge.success",
//!   "data": { "id": 302961, "status": "success", "reference": "qTPrJoy9Bx", "amount": 500000,
//!             "metadata": { "userId": "c-1", "userType": "customer", "transactionId": "17" } }
//! }
//! ```
//! Amounts are in kobo.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    cpe_api::errors::WalletApiError,
    db_types::{Naira, Principal, Role},
    helpers::serde_number,
};

pub const CHARGE_SUCCESS: &str = "charge.success";
pub const CHARGE_FAILED: &str = "charge.failed";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEvent {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeData {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub metadata: Value,
}

/// The correlation data we attached when the checkout was opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeMetadata {
    pub user_id: String,
    pub user_type: String,
    #[serde(with = "serde_number")]
    pub transaction_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEventKind {
    ChargeSucceeded(ChargeData),
    ChargeFailed(ChargeData),
    Unhandled(String),
}

impl GatewayEvent {
    pub fn from_slice(raw: &[u8]) -> Result<Self, WalletApiError> {
        serde_json::from_slice(raw).map_err(|e| WalletApiError::Validation(format!("Malformed webhook payload. {e}")))
    }

    /// A `charge.success` whose data status is anything other than `success` is treated as a failure.
    pub fn classify(self) -> Result<GatewayEventKind, WalletApiError> {
        let parse = |data: Value| {
            serde_json::from_value::<ChargeData>(data)
                .map_err(|e| WalletApiError::Validation(format!("Malformed charge data. {e}")))
        };
        match self.event.as_str() {
            CHARGE_SUCCESS => {
                let data = parse(self.data)?;
                match data.status.as_deref() {
                    None | Some("success") => Ok(GatewayEventKind::ChargeSucceeded(data)),
                    Some(_) => Ok(GatewayEventKind::ChargeFailed(data)),
                }
            },
            CHARGE_FAILED => Ok(GatewayEventKind::ChargeFailed(parse(self.data)?)),
            _ => Ok(GatewayEventKind::Unhandled(self.event)),
        }
    }
}

impl ChargeData {
    pub fn settled_amount(&self) -> Naira {
        Naira::from_minor_units(self.amount)
    }

    /// Some integrations send the metadata as a JSON-encoded string rather than an object. Both are accepted.
    pub fn metadata(&self) -> Result<ChargeMetadata, WalletApiError> {
        let invalid = |e: serde_json::Error| WalletApiError::Validation(format!("Invalid charge metadata. {e}"));
        match &self.metadata {
            Value::String(s) => serde_json::from_str(s).map_err(invalid),
            Value::Null => Err(WalletApiError::Validation("Charge metadata is missing".to_string())),
            v => serde_json::from_value(v.clone()).map_err(invalid),
        }
    }
}

impl ChargeMetadata {
    pub fn principal(&self) -> Result<Principal, WalletApiError> {
        let role = self
            .user_type
            .parse::<Role>()
            .map_err(|e| WalletApiError::Validation(format!("Unknown user type in metadata. {e}")))?;
        Ok(Principal::new(role, self.user_id.clone()))
    }
}
