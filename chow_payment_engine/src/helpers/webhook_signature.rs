//! # Webhook signatures
//!
//! Paystack signs every webhook with HMAC-SHA512, keyed with the merchant secret key, over the exact bytes of the
//! request body. The hex digest arrives in the `x-paystack-signature` header.
//!
//! The digest must be computed over the raw body as received. Parsing the JSON and serialising it again changes key
//! order and whitespace and breaks the signature, so callers hand [`WebhookVerifier::verify`] the untouched bytes.
use chow_common::Secret;
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha512;
use thiserror::Error;

type HmacSha512 = Hmac<Sha512>;

pub const PAYSTACK_SIGNATURE_HEADER: &str = "x-paystack-signature";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookSignatureError {
    #[error("No webhook signature was provided")]
    MissingSignature,
    #[error("The webhook signature is not valid hex. {0}")]
    MalformedSignature(String),
    #[error("The webhook signature does not match the request body")]
    SignatureMismatch,
    #[error("No webhook secret has been configured")]
    NotConfigured,
}

#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Secret<String>,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WebhookVerifier(secret: {})", self.secret)
    }
}

impl WebhookVerifier {
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }

    fn mac(&self) -> Result<HmacSha512, WebhookSignatureError> {
        if self.secret.is_empty() {
            return Err(WebhookSignatureError::NotConfigured);
        }
        // HMAC accepts keys of any length, so this cannot fail in practice
        HmacSha512::new_from_slice(self.secret.reveal().as_bytes()).map_err(|_| WebhookSignatureError::NotConfigured)
    }

    /// The lowercase hex signature Paystack would send for `body`.
    pub fn sign(&self, body: &[u8]) -> Result<String, WebhookSignatureError> {
        let mut mac = self.mac()?;
        mac.update(body);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Checks `signature` against the HMAC of `body` in constant time. Fails closed on anything unexpected.
    pub fn verify(&self, body: &[u8], signature: Option<&str>) -> Result<(), WebhookSignatureError> {
        let signature = signature.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
            warn!("🔐️ Webhook received without a signature header");
            WebhookSignatureError::MissingSignature
        })?;
        let expected = hex::decode(signature).map_err(|e| {
            warn!("🔐️ Webhook signature is not valid hex: {e}");
            WebhookSignatureError::MalformedSignature(e.to_string())
        })?;
        let mut mac = self.mac()?;
        mac.update(body);
        mac.verify_slice(&expected).map_err(|_| {
            warn!("🔐️ Webhook signature mismatch. This could be an attempt to forge a payment notification.");
            WebhookSignatureError::SignatureMismatch
        })?;
        trace!("🔐️ Webhook signature verified ✅️");
        Ok(())
    }
}
