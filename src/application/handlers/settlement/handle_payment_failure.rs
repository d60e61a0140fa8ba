//! HandlePaymentFailureHandler - records a failed payment attempt.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, PaymentId, Timestamp};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::ports::{CacheInvalidator, PaymentStore};

/// Command marking a payment as failed.
#[derive(Debug, Clone)]
pub struct HandlePaymentFailureCommand {
    pub payment_id: PaymentId,
    pub gateway_response: serde_json::Value,
    pub failure_reason: String,
}

/// Result of a failure settlement.
#[derive(Debug, Clone)]
pub struct PaymentFailureResult {
    pub payment: Payment,
    pub subscription: Option<Subscription>,
    /// False when the payment was already Failed and nothing changed.
    pub applied: bool,
}

/// Handler recording payment failures.
///
/// Idempotent on the payment status, like success settlement: a payment that
/// is already Failed is returned as-is. The pending subscription the payment
/// was meant to activate is cancelled so it never grants access.
pub struct HandlePaymentFailureHandler {
    payments: Arc<dyn PaymentStore>,
    cache: Arc<dyn CacheInvalidator>,
}

impl HandlePaymentFailureHandler {
    pub fn new(payments: Arc<dyn PaymentStore>, cache: Arc<dyn CacheInvalidator>) -> Self {
        Self { payments, cache }
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentFailureCommand,
    ) -> Result<PaymentFailureResult, DomainError> {
        self.fail(&cmd.payment_id, cmd.gateway_response, &cmd.failure_reason)
            .await
    }

    pub async fn fail(
        &self,
        payment_id: &PaymentId,
        gateway_response: serde_json::Value,
        failure_reason: &str,
    ) -> Result<PaymentFailureResult, DomainError> {
        let (mut payment, subscription) = self
            .payments
            .find_with_subscription(payment_id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::PaymentNotFound, "Payment not found"))?;

        if payment.status == PaymentStatus::Failed {
            tracing::info!(payment_id = %payment.id, "Payment already marked failed");
            return Ok(PaymentFailureResult {
                payment,
                subscription,
                applied: false,
            });
        }

        let now = Timestamp::now();
        payment.fail(gateway_response, failure_reason, now)?;

        // Only the never-activated subscription this payment was for gets
        // cancelled; a failed renewal attempt must not end an active period.
        let subscription = match subscription {
            Some(mut sub) if sub.status == SubscriptionStatus::Pending => {
                sub.cancel(now)?;
                Some(sub)
            }
            other => other,
        };

        let cancelled = subscription
            .as_ref()
            .filter(|s| s.status == SubscriptionStatus::Cancelled);
        self.payments.settle(&payment, cancelled).await?;

        tracing::warn!(
            payment_id = %payment.id,
            tenant_id = %payment.tenant_id,
            reason = %failure_reason,
            "Payment failed"
        );

        self.cache
            .invalidate_pattern(&format!("tenant:{}:*", payment.tenant_id))
            .await;

        Ok(PaymentFailureResult {
            payment,
            subscription,
            applied: true,
        })
    }
}
