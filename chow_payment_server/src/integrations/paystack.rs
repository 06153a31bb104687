//! The Paystack side of the [`PaymentGatewayClient`] seam.
use chow_payment_engine::{
    db_types::Naira,
    traits::{
        GatewayClientError,
        GatewayPaymentRequest,
        GatewayPaymentStatus,
        GatewaySession,
        GatewayVerification,
        PaymentGatewayClient,
    },
};
use log::*;
use paystack_tools::{PaystackApi, PaystackApiError, PaystackConfig, TransactionMetadata};

#[derive(Clone)]
pub struct PaystackGateway {
    api: PaystackApi,
}

impl PaystackGateway {
    pub fn new(config: PaystackConfig) -> Result<Self, PaystackApiError> {
        let api = PaystackApi::new(config)?;
        Ok(Self { api })
    }
}

impl PaymentGatewayClient for PaystackGateway {
    async fn initialize_payment(&self, request: GatewayPaymentRequest) -> Result<GatewaySession, GatewayClientError> {
        let metadata = TransactionMetadata {
            user_id: request.principal.id.clone(),
            user_type: request.principal.role.to_string(),
            transaction_id: request.transaction_id.to_string(),
        };
        let checkout =
            self.api.initialize_transaction(&request.email, request.amount, metadata).await.map_err(convert_error)?;
        Ok(GatewaySession {
            authorization_url: checkout.authorization_url,
            access_code: Some(checkout.access_code),
            reference: checkout.reference,
        })
    }

    async fn verify_payment(&self, reference: &str) -> Result<GatewayVerification, GatewayClientError> {
        let tx = self.api.verify_transaction(reference).await.map_err(convert_error)?;
        let transaction_id = tx.metadata().and_then(|m| m.transaction_id.parse::<i64>().ok());
        if transaction_id.is_none() {
            warn!("💰️ Paystack transaction {reference} has no usable transactionId in its metadata");
        }
        Ok(GatewayVerification {
            reference: tx.reference,
            status: payment_status(&tx.status),
            amount: Naira::from_minor_units(tx.amount),
            transaction_id,
        })
    }
}

/// Paystack reports `success`, `failed`, `abandoned` and `reversed` as final. Anything else is still in flight.
pub fn payment_status(status: &str) -> GatewayPaymentStatus {
    match status.trim().to_ascii_lowercase().as_str() {
        "success" => GatewayPaymentStatus::Success,
        "failed" | "abandoned" | "reversed" => GatewayPaymentStatus::Failed,
        _ => GatewayPaymentStatus::Pending,
    }
}

fn convert_error(e: PaystackApiError) -> GatewayClientError {
    match e {
        PaystackApiError::QueryError { .. } | PaystackApiError::Declined(_) => {
            GatewayClientError::Rejected(e.to_string())
        },
        PaystackApiError::Initialization(_)
        | PaystackApiError::RestResponseError(_)
        | PaystackApiError::JsonError(_)
        | PaystackApiError::EmptyResponse => GatewayClientError::Unavailable(e.to_string()),
    }
}
