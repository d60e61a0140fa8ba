//! Razorpay wire types.
//!
//! Serde shapes for the subset of the Razorpay API this subsystem touches.

use serde::{Deserialize, Serialize};

/// Response body of `POST /v1/orders`.
#[derive(Debug, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    /// Minor units (paise).
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

/// Request body of `POST /v1/orders`.
#[derive(Debug, Serialize)]
pub struct CreateOrderRequest<'a> {
    /// Minor units (paise).
    pub amount: i64,
    pub currency: &'a str,
    pub receipt: &'a str,
}

/// Top-level webhook envelope.
#[derive(Debug, Deserialize)]
pub struct RazorpayWebhookEvent {
    pub event: String,
    pub payload: WebhookPayload,
}

#[derive(Debug, Deserialize, Default)]
pub struct WebhookPayload {
    #[serde(default)]
    pub payment: Option<EntityWrapper<PaymentEntity>>,
}

/// Razorpay nests every entity under an `entity` key.
#[derive(Debug, Deserialize)]
pub struct EntityWrapper<T> {
    pub entity: T,
}

#[derive(Debug, Deserialize)]
pub struct PaymentEntity {
    pub id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}
