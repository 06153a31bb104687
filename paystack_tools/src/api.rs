use std::sync::Arc;

use chow_common::Naira;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::PaystackConfig,
    data_objects::{
        InitializeTransactionRequest,
        InitializedTransaction,
        PaystackResponse,
        TransactionMetadata,
        VerifiedTransaction,
    },
    PaystackApiError,
};

#[derive(Clone)]
pub struct PaystackApi {
    config: PaystackConfig,
    client: Arc<Client>,
}

impl PaystackApi {
    pub fn new(config: PaystackConfig) -> Result<Self, PaystackApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let mut val = HeaderValue::from_str(&bearer).map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &PaystackConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Sends a request and unwraps Paystack's `{status, message, data}` envelope.
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, PaystackApiError> {
        let url = self.url(path);
        trace!("Sending Paystack request: {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| PaystackApiError::RestResponseError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| PaystackApiError::RestResponseError(e.to_string()))?;
            return Err(PaystackApiError::QueryError { status, message });
        }
        trace!("Paystack request successful. {}", response.status());
        let envelope = response
            .json::<PaystackResponse<T>>()
            .await
            .map_err(|e| PaystackApiError::JsonError(e.to_string()))?;
        if !envelope.status {
            return Err(PaystackApiError::Declined(envelope.message));
        }
        envelope.data.ok_or(PaystackApiError::EmptyResponse)
    }

    /// Opens a hosted checkout for `amount`. The metadata is echoed back in the `charge.success` webhook.
    pub async fn initialize_transaction(
        &self,
        email: &str,
        amount: Naira,
        metadata: TransactionMetadata,
    ) -> Result<InitializedTransaction, PaystackApiError> {
        let request = InitializeTransactionRequest {
            email: email.to_string(),
            amount: amount.to_minor_units(),
            callback_url: self.config.callback_url.clone(),
            metadata,
        };
        debug!("Initializing Paystack checkout for {amount} (transaction {})", request.metadata.transaction_id);
        let result = self
            .rest_query::<InitializedTransaction, _>(Method::POST, "/transaction/initialize", Some(request))
            .await?;
        info!("Paystack checkout opened with reference {}", result.reference);
        Ok(result)
    }

    pub async fn verify_transaction(&self, reference: &str) -> Result<VerifiedTransaction, PaystackApiError> {
        let path = format!("/transaction/verify/{reference}");
        debug!("Verifying Paystack transaction {reference}");
        let result = self.rest_query::<VerifiedTransaction, ()>(Method::GET, &path, None).await?;
        info!("Paystack reports transaction {reference} as '{}'", result.status);
        Ok(result)
    }
}
