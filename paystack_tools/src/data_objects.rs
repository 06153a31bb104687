use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The envelope Paystack wraps around every response.
#[derive(Debug, Clone, Deserialize)]
pub struct PaystackResponse<T> {
    pub status: bool,
    pub message: String,
    pub data: Option<T>,
}

/// Metadata we attach to every checkout so that the webhook can be traced back to our pending transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMetadata {
    pub user_id: String,
    pub user_type: String,
    pub transaction_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitializeTransactionRequest {
    pub email: String,
    /// Amount in kobo
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    pub metadata: TransactionMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedTransaction {
    pub id: i64,
    /// One of `success`, `failed`, `abandoned`, `ongoing`, `pending`, `processing`, `queued` or `reversed`
    pub status: String,
    pub reference: String,
    /// Amount in kobo
    pub amount: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub gateway_response: Option<String>,
    /// Paystack hands metadata back exactly as it was sent, but it may also be an empty string when none was attached.
    #[serde(default)]
    pub metadata: Value,
}

impl VerifiedTransaction {
    pub fn metadata(&self) -> Option<TransactionMetadata> {
        serde_json::from_value(self.metadata.clone()).ok()
    }
}
