mod retry;
pub mod serde_number;
mod webhook_signature;

pub use retry::{is_lock_contention, retry_on_conflict, Contention, MAX_ATTEMPTS};
pub use webhook_signature::{WebhookSignatureError, WebhookVerifier, PAYSTACK_SIGNATURE_HEADER};
