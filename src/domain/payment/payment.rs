//! Payment aggregate entity.
//!
//! Created alongside a Pending subscription and settled exactly once by the
//! settlement processor. Amounts are stored in major currency units; only
//! the gateway adapter converts to minor units.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DomainError, ErrorCode, PaymentId, StateMachine, SubscriptionId, TenantId, Timestamp,
};

use super::PaymentStatus;

/// Payment aggregate.
///
/// # Invariants
///
/// - `amount >= 0`, in major currency units
/// - Exactly one transition out of Pending to Completed or Failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub tenant_id: TenantId,
    pub subscription_id: Option<SubscriptionId>,
    /// Amount in major currency units.
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    /// Gateway this payment routes through (e.g. "razorpay").
    pub gateway: String,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    /// Opaque gateway response blob, stored as-is for audit.
    pub gateway_response: Option<serde_json::Value>,
    pub paid_at: Option<Timestamp>,
    pub failure_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Payment {
    /// Creates a Pending payment for a subscription purchase.
    pub fn new_pending(
        tenant_id: TenantId,
        subscription_id: SubscriptionId,
        amount: f64,
        currency: impl Into<String>,
        gateway: impl Into<String>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: PaymentId::new(),
            tenant_id,
            subscription_id: Some(subscription_id),
            amount,
            currency: currency.into(),
            status: PaymentStatus::Pending,
            gateway: gateway.into(),
            gateway_order_id: None,
            gateway_payment_id: None,
            gateway_response: None,
            paid_at: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Records the gateway order id returned by order creation.
    pub fn attach_order(&mut self, gateway_order_id: impl Into<String>) {
        self.gateway_order_id = Some(gateway_order_id.into());
        self.updated_at = Timestamp::now();
    }

    /// Marks the payment Completed with the gateway's capture details.
    ///
    /// # Errors
    ///
    /// Returns error if the payment already reached a terminal state. Callers
    /// implementing idempotent settlement check `status` first and return the
    /// existing record instead of calling this twice.
    pub fn complete(
        &mut self,
        gateway_payment_id: impl Into<String>,
        gateway_response: serde_json::Value,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.transition_to(PaymentStatus::Completed)?;
        self.gateway_payment_id = Some(gateway_payment_id.into());
        self.gateway_response = Some(gateway_response);
        self.paid_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Marks the payment Failed with the gateway's response.
    pub fn fail(
        &mut self,
        gateway_response: serde_json::Value,
        failure_reason: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.transition_to(PaymentStatus::Failed)?;
        self.gateway_response = Some(gateway_response);
        self.failure_reason = Some(failure_reason.into());
        self.updated_at = now;
        Ok(())
    }

    /// Records a gateway-side refund of a completed payment.
    pub fn refund(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition_to(PaymentStatus::Refunded)?;
        self.updated_at = now;
        Ok(())
    }

    fn transition_to(&mut self, target: PaymentStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot transition payment from {} to {}", self.status, target),
            )
        })?;
        Ok(())
    }
}
