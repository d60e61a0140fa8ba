//! Payment gateway configuration.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

fn default_api_base_url() -> String {
    "https://api.razorpay.com".to_string()
}

/// Razorpay credentials and endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Razorpay key id (`rzp_test_...` or `rzp_live_...`).
    pub key_id: String,

    /// Razorpay key secret; also signs client payment confirmations.
    pub key_secret: SecretString,

    /// Webhook signing secret.
    pub webhook_secret: SecretString,

    /// API base URL, overridable for test doubles.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl GatewayConfig {
    pub fn is_test_mode(&self) -> bool {
        self.key_id.starts_with("rzp_test_")
    }

    pub fn is_live_mode(&self) -> bool {
        self.key_id.starts_with("rzp_live_")
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.key_id.is_empty() {
            return Err(ValidationError::MissingRequired("RAZORPAY_KEY_ID"));
        }
        if !self.key_id.starts_with("rzp_") {
            return Err(ValidationError::InvalidGatewayKey);
        }
        if self.key_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("RAZORPAY_KEY_SECRET"));
        }
        if self.webhook_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("RAZORPAY_WEBHOOK_SECRET"));
        }
        if !self.api_base_url.starts_with("https://") {
            return Err(ValidationError::GatewayUrlMustBeHttps);
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            key_id: String::new(),
            key_secret: SecretString::new(String::new()),
            webhook_secret: SecretString::new(String::new()),
            api_base_url: default_api_base_url(),
        }
    }
}
