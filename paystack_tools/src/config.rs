use chow_common::Secret;
use log::*;

pub const DEFAULT_PAYSTACK_BASE_URL: &str = "https://api.paystack.co";

#[derive(Debug, Clone)]
pub struct PaystackConfig {
    /// The Paystack API host. Only overridden in tests or when proxying.
    pub base_url: String,
    /// The merchant secret key (`sk_live_...` or `sk_test_...`). Paystack also uses it to sign webhooks.
    pub secret_key: Secret<String>,
    /// Where Paystack sends the payer after checkout. Falls back to the dashboard setting when absent.
    pub callback_url: Option<String>,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_PAYSTACK_BASE_URL.to_string(), secret_key: Secret::default(), callback_url: None }
    }
}

impl PaystackConfig {
    pub fn new(secret_key: Secret<String>) -> Self {
        Self { secret_key, ..Default::default() }
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_callback_url<S: Into<String>>(mut self, callback_url: S) -> Self {
        self.callback_url = Some(callback_url.into());
        self
    }

    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("CHOW_PAYSTACK_BASE_URL").unwrap_or_else(|_| {
            debug!("🪛️ CHOW_PAYSTACK_BASE_URL not set, using {DEFAULT_PAYSTACK_BASE_URL}");
            DEFAULT_PAYSTACK_BASE_URL.to_string()
        });
        let secret_key = Secret::new(std::env::var("CHOW_PAYSTACK_SECRET_KEY").unwrap_or_else(|_| {
            error!(
                "🪛️ CHOW_PAYSTACK_SECRET_KEY not set. Funding requests will fail and every webhook will be rejected."
            );
            String::default()
        }));
        let callback_url = std::env::var("CHOW_PAYSTACK_CALLBACK_URL").ok().filter(|s| !s.trim().is_empty());
        if callback_url.is_none() {
            info!("🪛️ CHOW_PAYSTACK_CALLBACK_URL not set. Paystack will use the callback configured on the dashboard.");
        }
        Self { base_url, secret_key, callback_url }
    }
}
