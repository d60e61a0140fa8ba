//! Razorpay payment gateway adapter.
//!
//! Implements the `PaymentGateway` port against the Razorpay REST API.
//! This is the only module that converts between major currency units and
//! the gateway's minor units (paise).
//!
//! # Security
//!
//! - Webhook bodies are verified (HMAC-SHA256, constant-time comparison)
//!   before any parsing happens
//! - Credentials are held in `secrecy::SecretString`

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::ports::{GatewayError, GatewayEventKind, GatewayOrder, ParsedEvent, PaymentGateway};

use super::wire::{CreateOrderRequest, RazorpayOrder, RazorpayWebhookEvent};

type HmacSha256 = Hmac<Sha256>;

/// Converts a major-unit amount to the gateway's integer minor units.
///
/// Rounded, not truncated: 99.999 becomes 10000, never 9999.
pub fn to_minor_units(amount_major: f64) -> i64 {
    (amount_major * 100.0).round() as i64
}

/// Razorpay API configuration.
#[derive(Clone)]
pub struct RazorpayConfig {
    /// Public key id (rzp_live_... or rzp_test_...).
    key_id: String,

    /// API key secret, paired with the key id for basic auth.
    key_secret: SecretString,

    /// Webhook signing secret, distinct from the API secret.
    webhook_secret: SecretString,

    /// Base URL for the Razorpay API (default: https://api.razorpay.com).
    api_base_url: String,
}

impl RazorpayConfig {
    pub fn new(
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
        webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret: SecretString::new(key_secret.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_base_url: "https://api.razorpay.com".to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

impl From<&crate::config::GatewayConfig> for RazorpayConfig {
    fn from(config: &crate::config::GatewayConfig) -> Self {
        Self {
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            webhook_secret: config.webhook_secret.clone(),
            api_base_url: config.api_base_url.clone(),
        }
    }
}

/// Razorpay gateway adapter.
pub struct RazorpayAdapter {
    config: RazorpayConfig,
    http_client: reqwest::Client,
}

impl RazorpayAdapter {
    pub fn new(config: RazorpayConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Verify a webhook body against its signature header.
    ///
    /// Razorpay signs the raw body with HMAC-SHA256 and sends the hex digest
    /// in `X-Razorpay-Signature`. Comparison is constant-time; any decode or
    /// mismatch failure collapses to `InvalidSignature`.
    fn verify_signature(&self, payload: &[u8], signature_header: &str) -> Result<(), GatewayError> {
        let provided =
            hex::decode(signature_header.trim()).map_err(|_| GatewayError::InvalidSignature)?;

        let mut mac = HmacSha256::new_from_slice(
            self.config.webhook_secret.expose_secret().as_bytes(),
        )
        .map_err(|_| GatewayError::InvalidSignature)?;
        mac.update(payload);
        let expected = mac.finalize().into_bytes();

        if expected.as_slice().ct_eq(provided.as_slice()).unwrap_u8() != 1 {
            tracing::warn!("Webhook signature mismatch");
            return Err(GatewayError::InvalidSignature);
        }
        Ok(())
    }

    /// Parse a verified body into a `ParsedEvent`.
    fn parse_event(&self, payload: &[u8]) -> Result<ParsedEvent, GatewayError> {
        let event: RazorpayWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse webhook payload");
            GatewayError::Parse(e.to_string())
        })?;

        let kind = match event.event.as_str() {
            "payment.captured" => GatewayEventKind::PaymentCaptured,
            "payment.failed" => GatewayEventKind::PaymentFailed,
            other => GatewayEventKind::Unknown(other.to_string()),
        };

        let payment = event.payload.payment.as_ref().map(|p| &p.entity);

        let raw: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        Ok(ParsedEvent {
            kind,
            gateway_order_id: payment.and_then(|p| p.order_id.clone()),
            gateway_payment_id: payment.map(|p| p.id.clone()),
            error_description: payment.and_then(|p| p.error_description.clone()),
            payload: raw,
        })
    }

    async fn post_json<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, GatewayError> {
        let url = format!("{}{}", self.config.api_base_url, path);
        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.expose_secret()))
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status, path, "Razorpay API call failed");
            return Err(GatewayError::Api { status, body });
        }
        Ok(response)
    }
}

#[async_trait]
impl PaymentGateway for RazorpayAdapter {
    async fn create_order(
        &self,
        amount_major: f64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        let request = CreateOrderRequest {
            amount: to_minor_units(amount_major),
            currency,
            receipt,
        };

        let response = self.post_json("/v1/orders", &request).await?;
        let order: RazorpayOrder = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        tracing::info!(order_id = %order.id, amount_minor = order.amount, "Gateway order created");

        Ok(GatewayOrder {
            id: order.id,
            amount_minor: order.amount,
            currency: order.currency,
            status: order.status,
        })
    }

    async fn construct_event(
        &self,
        raw_payload: &[u8],
        signature_header: &str,
    ) -> Result<ParsedEvent, GatewayError> {
        // Verification comes first; an unverified body is never parsed.
        self.verify_signature(raw_payload, signature_header)?;
        let event = self.parse_event(raw_payload)?;
        tracing::info!(kind = ?event.kind, "Webhook signature verified");
        Ok(event)
    }

    async fn capture_payment(
        &self,
        gateway_payment_id: &str,
        amount_major: f64,
        currency: &str,
    ) -> Result<(), GatewayError> {
        let path = format!("/v1/payments/{}/capture", gateway_payment_id);
        let body = serde_json::json!({
            "amount": to_minor_units(amount_major),
            "currency": currency,
        });
        self.post_json(&path, &body).await?;
        Ok(())
    }

    async fn cancel_subscription(
        &self,
        gateway_subscription_id: &str,
    ) -> Result<(), GatewayError> {
        let path = format!("/v1/subscriptions/{}/cancel", gateway_subscription_id);
        self.post_json(&path, &serde_json::json!({})).await?;
        Ok(())
    }

    async fn update_subscription(
        &self,
        gateway_subscription_id: &str,
        gateway_plan_id: &str,
    ) -> Result<(), GatewayError> {
        let path = format!("/v1/subscriptions/{}", gateway_subscription_id);
        let url = format!("{}{}", self.config.api_base_url, path);
        let body = serde_json::json!({ "plan_id": gateway_plan_id });
        let response = self
            .http_client
            .patch(&url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.expose_secret()))
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api { status, body });
        }
        Ok(())
    }
}
