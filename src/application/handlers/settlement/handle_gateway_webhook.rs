//! HandleGatewayWebhookHandler - the server-to-server settlement path.
//!
//! Webhooks are verified against the raw body before any parsing, then
//! routed to the same idempotent settlement logic the client confirmation
//! path uses, so whichever of the two arrives first wins and the other
//! becomes a no-op.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::payment::Payment;
use crate::ports::{GatewayEventKind, PaymentGateway, PaymentStore};

use super::{
    HandlePaymentFailureHandler, HandlePaymentSuccessHandler, PaymentFailureResult,
    SettlementResult,
};

/// Command carrying a raw webhook delivery.
///
/// The payload stays as received bytes; signature verification runs over
/// them before anything is deserialized.
#[derive(Debug, Clone)]
pub struct HandleGatewayWebhookCommand {
    pub raw_payload: Vec<u8>,
    pub signature_header: String,
}

/// What the webhook dispatch did.
#[derive(Debug, Clone)]
pub enum WebhookOutcome {
    /// A capture event settled (or re-confirmed) a payment.
    Settled(SettlementResult),
    /// A failure event marked (or re-confirmed) a payment as failed.
    MarkedFailed(PaymentFailureResult),
    /// Verified event of a kind this subsystem does not act on.
    Ignored { event_kind: String },
}

pub struct HandleGatewayWebhookHandler {
    gateway: Arc<dyn PaymentGateway>,
    payments: Arc<dyn PaymentStore>,
    success: Arc<HandlePaymentSuccessHandler>,
    failure: Arc<HandlePaymentFailureHandler>,
}

impl HandleGatewayWebhookHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        payments: Arc<dyn PaymentStore>,
        success: Arc<HandlePaymentSuccessHandler>,
        failure: Arc<HandlePaymentFailureHandler>,
    ) -> Self {
        Self {
            gateway,
            payments,
            success,
            failure,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleGatewayWebhookCommand,
    ) -> Result<WebhookOutcome, DomainError> {
        let event = self
            .gateway
            .construct_event(&cmd.raw_payload, &cmd.signature_header)
            .await?;

        match event.kind {
            GatewayEventKind::PaymentCaptured => {
                let payment = self.correlate(event.gateway_order_id.as_deref()).await?;
                let gateway_payment_id = event.gateway_payment_id.unwrap_or_default();
                let result = self
                    .success
                    .settle(&payment.id, &gateway_payment_id, event.payload)
                    .await?;
                Ok(WebhookOutcome::Settled(result))
            }
            GatewayEventKind::PaymentFailed => {
                let payment = self.correlate(event.gateway_order_id.as_deref()).await?;
                let reason = event
                    .error_description
                    .unwrap_or_else(|| "Payment failed at gateway".to_string());
                let result = self
                    .failure
                    .fail(&payment.id, event.payload, &reason)
                    .await?;
                Ok(WebhookOutcome::MarkedFailed(result))
            }
            GatewayEventKind::Unknown(kind) => {
                tracing::debug!(event_kind = %kind, "Ignoring webhook event");
                Ok(WebhookOutcome::Ignored { event_kind: kind })
            }
        }
    }

    async fn correlate(&self, gateway_order_id: Option<&str>) -> Result<Payment, DomainError> {
        let order_id = gateway_order_id.ok_or_else(|| {
            DomainError::validation("order_id", "Webhook event carries no order id")
        })?;
        self.payments
            .find_by_gateway_order(order_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::PaymentNotFound,
                    "No payment matches the webhook's order id",
                )
            })
    }
}
