//! Payment gateway port.
//!
//! Capability-set contract implementable against any processor. The adapter
//! behind this port is the only place in the system that converts between
//! major and minor currency units.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// An order created at the gateway ahead of payment collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayOrder {
    /// Gateway's order id.
    pub id: String,
    /// Amount echoed back by the gateway, in minor units.
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
}

/// What a verified webhook event reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayEventKind {
    /// Payment captured successfully.
    PaymentCaptured,
    /// Payment failed.
    PaymentFailed,
    /// Anything this subsystem does not act on.
    Unknown(String),
}

/// A webhook event that passed signature verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedEvent {
    pub kind: GatewayEventKind,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    /// Failure description supplied by the gateway, when present.
    pub error_description: Option<String>,
    /// The full verified payload, stored opaquely on the payment.
    pub payload: serde_json::Value,
}

/// Errors from gateway operations.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Webhook signature did not verify; the payload was never parsed.
    #[error("webhook signature verification failed")]
    InvalidSignature,

    /// Payload failed to parse after verification.
    #[error("failed to parse gateway payload: {0}")]
    Parse(String),

    /// Transport-level failure talking to the gateway.
    #[error("gateway request failed: {0}")]
    Network(String),

    /// The gateway rejected the request.
    #[error("gateway returned an error: {status}")]
    Api { status: u16, body: String },
}

impl GatewayError {
    /// Network failures are retryable; the rest need input changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Network(_))
    }
}

impl From<GatewayError> for DomainError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::InvalidSignature => DomainError::new(
                ErrorCode::InvalidSignature,
                "Webhook signature verification failed",
            ),
            // Sanitized: the raw body stays out of the message.
            GatewayError::Parse(_) => {
                DomainError::gateway("Gateway payload could not be parsed")
            }
            GatewayError::Network(_) => DomainError::gateway("Gateway request failed"),
            GatewayError::Api { status, .. } => {
                DomainError::gateway(format!("Gateway returned HTTP {}", status))
            }
        }
    }
}

/// Port for payment gateway integrations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an order for the given major-unit amount.
    ///
    /// The implementation converts to the gateway's minor unit (x100,
    /// rounded to an integer) exactly once.
    async fn create_order(
        &self,
        amount_major: f64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError>;

    /// Verify a webhook signature and parse the event.
    ///
    /// Fails closed: an unverified payload is never parsed.
    async fn construct_event(
        &self,
        raw_payload: &[u8],
        signature_header: &str,
    ) -> Result<ParsedEvent, GatewayError>;

    /// Explicitly capture an authorized payment (for gateways that need it).
    async fn capture_payment(
        &self,
        gateway_payment_id: &str,
        amount_major: f64,
        currency: &str,
    ) -> Result<(), GatewayError>;

    /// Cancel a gateway-side recurring subscription construct.
    ///
    /// Distinct from the local subscription ledger's own state.
    async fn cancel_subscription(&self, gateway_subscription_id: &str)
        -> Result<(), GatewayError>;

    /// Update a gateway-side recurring subscription to a different plan.
    async fn update_subscription(
        &self,
        gateway_subscription_id: &str,
        gateway_plan_id: &str,
    ) -> Result<(), GatewayError>;
}
