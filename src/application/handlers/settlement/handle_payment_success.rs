//! HandlePaymentSuccessHandler - settles a confirmed payment.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use crate::domain::foundation::{DomainError, ErrorCode, PaymentId, Timestamp};
use crate::domain::payment::{verify_payment_signature, Payment, PaymentStatus};
use crate::domain::subscription::Subscription;
use crate::ports::{CacheInvalidator, PaymentStore, PlanRepository};

/// Command carrying a client-driven payment confirmation.
///
/// The signature is HMAC-SHA256 over `order_id|payment_id`, produced by the
/// gateway and relayed by the tenant's client.
#[derive(Debug, Clone)]
pub struct HandlePaymentSuccessCommand {
    pub payment_id: PaymentId,
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
}

/// Result of a settlement, whether applied now or already on record.
#[derive(Debug, Clone)]
pub struct SettlementResult {
    pub payment: Payment,
    pub subscription: Option<Subscription>,
    /// False when an earlier settlement already stood and nothing changed.
    pub applied: bool,
}

/// Handler settling successful payments.
///
/// Settlement is idempotent on the payment status: a payment that is already
/// Completed is returned as-is, so gateway retries and double-submitted
/// confirmations cannot double-extend a subscription.
pub struct HandlePaymentSuccessHandler {
    plans: Arc<dyn PlanRepository>,
    payments: Arc<dyn PaymentStore>,
    cache: Arc<dyn CacheInvalidator>,
    key_secret: SecretString,
}

impl HandlePaymentSuccessHandler {
    pub fn new(
        plans: Arc<dyn PlanRepository>,
        payments: Arc<dyn PaymentStore>,
        cache: Arc<dyn CacheInvalidator>,
        key_secret: SecretString,
    ) -> Self {
        Self {
            plans,
            payments,
            cache,
            key_secret,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentSuccessCommand,
    ) -> Result<SettlementResult, DomainError> {
        if !verify_payment_signature(
            self.key_secret.expose_secret(),
            &cmd.gateway_order_id,
            &cmd.gateway_payment_id,
            &cmd.signature,
        ) {
            tracing::warn!(payment_id = %cmd.payment_id, "Payment confirmation signature rejected");
            return Err(DomainError::new(
                ErrorCode::InvalidSignature,
                "Payment signature verification failed",
            ));
        }

        // The signature only proves the order/payment pair is genuine; the
        // pair must also belong to the payment being settled, or a valid
        // confirmation for one order could complete a different payment.
        let payment = self
            .payments
            .find_by_id(&cmd.payment_id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::PaymentNotFound, "Payment not found"))?;
        if payment.gateway_order_id.as_deref() != Some(cmd.gateway_order_id.as_str()) {
            tracing::warn!(
                payment_id = %cmd.payment_id,
                gateway_order_id = %cmd.gateway_order_id,
                "Confirmed order does not belong to this payment"
            );
            return Err(DomainError::validation(
                "gateway_order_id",
                "Order does not belong to this payment",
            ));
        }

        let gateway_response = serde_json::json!({
            "razorpay_order_id": cmd.gateway_order_id,
            "razorpay_payment_id": cmd.gateway_payment_id,
        });
        self.settle(&cmd.payment_id, &cmd.gateway_payment_id, gateway_response)
            .await
    }

    /// Settles a payment whose confirmation is already authenticated (the
    /// verified-signature path above, or a verified webhook event).
    pub async fn settle(
        &self,
        payment_id: &PaymentId,
        gateway_payment_id: &str,
        gateway_response: serde_json::Value,
    ) -> Result<SettlementResult, DomainError> {
        let (mut payment, subscription) = self
            .payments
            .find_with_subscription(payment_id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::PaymentNotFound, "Payment not found"))?;

        if payment.status == PaymentStatus::Completed {
            tracing::info!(payment_id = %payment.id, "Payment already settled; returning existing record");
            return Ok(SettlementResult {
                payment,
                subscription,
                applied: false,
            });
        }

        let now = Timestamp::now();
        payment.complete(gateway_payment_id, gateway_response, now)?;

        let subscription = match subscription {
            Some(mut sub) => {
                let plan = self.plans.find_by_id(&sub.plan_id).await?.ok_or_else(|| {
                    DomainError::new(ErrorCode::PlanNotFound, "Plan not found")
                })?;
                sub.activate(now, plan.validity_days)?;
                Some(sub)
            }
            None => None,
        };

        self.payments.settle(&payment, subscription.as_ref()).await?;

        tracing::info!(
            payment_id = %payment.id,
            tenant_id = %payment.tenant_id,
            "Payment settled"
        );

        self.cache
            .invalidate_pattern(&format!("tenant:{}:*", payment.tenant_id))
            .await;

        Ok(SettlementResult {
            payment,
            subscription,
            applied: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::NoopCacheInvalidator;
    use crate::adapters::memory::MemoryLedger;
    use crate::domain::foundation::TenantId;
    use crate::domain::payment::compute_payment_signature;
    use crate::domain::subscription::{BillingCycle, BillingPeriod, Plan, SubscriptionStatus};
    use crate::ports::{PlanRepository as _, SubscriptionStore};

    const KEY_SECRET: &str = "rzp_secret_test";

    struct Fixture {
        ledger: Arc<MemoryLedger>,
        handler: HandlePaymentSuccessHandler,
    }

    fn fixture() -> Fixture {
        let ledger = Arc::new(MemoryLedger::new());
        let handler = HandlePaymentSuccessHandler::new(
            ledger.clone(),
            ledger.clone(),
            Arc::new(NoopCacheInvalidator),
            SecretString::new(KEY_SECRET.to_string()),
        );
        Fixture { ledger, handler }
    }

    async fn seed_purchase(ledger: &MemoryLedger) -> (Plan, Subscription, Payment) {
        let plan = Plan::new("Starter", 999.0, "INR", 30, BillingCycle::Monthly).unwrap();
        ledger.save(&plan).await.unwrap();

        let tenant_id = TenantId::new();
        let period = BillingPeriod::compute(None, plan.validity_days, Timestamp::now());
        let sub = Subscription::new_pending(tenant_id, plan.id, period);
        let mut payment =
            Payment::new_pending(tenant_id, sub.id, plan.price, "INR", "razorpay");
        payment.attach_order("order_test_1");
        ledger.create_with_payment(&sub, &payment).await.unwrap();
        (plan, sub, payment)
    }

    fn signed_command(payment: &Payment) -> HandlePaymentSuccessCommand {
        let order_id = payment.gateway_order_id.clone().unwrap();
        let signature = compute_payment_signature(KEY_SECRET, &order_id, "pay_test_1");
        HandlePaymentSuccessCommand {
            payment_id: payment.id,
            gateway_order_id: order_id,
            gateway_payment_id: "pay_test_1".to_string(),
            signature,
        }
    }

    #[tokio::test]
    async fn settlement_completes_payment_and_activates_subscription() {
        let f = fixture();
        let (plan, sub, payment) = seed_purchase(&f.ledger).await;

        let result = f.handler.handle(signed_command(&payment)).await.unwrap();

        assert!(result.applied);
        assert_eq!(result.payment.status, PaymentStatus::Completed);
        assert_eq!(
            result.payment.gateway_payment_id.as_deref(),
            Some("pay_test_1")
        );

        let activated = result.subscription.unwrap();
        assert_eq!(activated.status, SubscriptionStatus::Active);
        assert_eq!(
            activated.end_date,
            activated.start_date.add_days(plan.validity_days)
        );

        let stored = SubscriptionStore::find_by_id(f.ledger.as_ref(), &sub.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn second_settlement_returns_existing_without_reapplying() {
        let f = fixture();
        let (_, _, payment) = seed_purchase(&f.ledger).await;

        let first = f.handler.handle(signed_command(&payment)).await.unwrap();
        let first_end = first.subscription.as_ref().unwrap().end_date;

        let second = f.handler.handle(signed_command(&payment)).await.unwrap();

        assert!(!second.applied);
        assert_eq!(second.payment.status, PaymentStatus::Completed);
        // The subscription period did not extend a second time.
        assert_eq!(second.subscription.unwrap().end_date, first_end);
    }

    #[tokio::test]
    async fn tampered_signature_is_rejected_without_state_change() {
        let f = fixture();
        let (_, sub, payment) = seed_purchase(&f.ledger).await;

        let mut cmd = signed_command(&payment);
        cmd.signature = compute_payment_signature(KEY_SECRET, "order_evil", "pay_test_1");

        let result = f.handler.handle(cmd).await;
        assert_eq!(result.unwrap_err().code, ErrorCode::InvalidSignature);

        let stored_sub = SubscriptionStore::find_by_id(f.ledger.as_ref(), &sub.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored_sub.status, SubscriptionStatus::Pending);
        let stored_payment = PaymentStore::find_by_id(f.ledger.as_ref(), &payment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored_payment.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn confirmation_for_a_different_order_cannot_settle_the_payment() {
        let f = fixture();
        let (_, sub, payment) = seed_purchase(&f.ledger).await;

        // A genuine signature over some other order/payment pair must not
        // settle a payment that belongs to a different order.
        let signature = compute_payment_signature(KEY_SECRET, "order_other", "pay_other");
        let result = f
            .handler
            .handle(HandlePaymentSuccessCommand {
                payment_id: payment.id,
                gateway_order_id: "order_other".to_string(),
                gateway_payment_id: "pay_other".to_string(),
                signature,
            })
            .await;

        assert_eq!(result.unwrap_err().code, ErrorCode::ValidationFailed);
        let stored_payment = PaymentStore::find_by_id(f.ledger.as_ref(), &payment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored_payment.status, PaymentStatus::Pending);
        let stored_sub = SubscriptionStore::find_by_id(f.ledger.as_ref(), &sub.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored_sub.status, SubscriptionStatus::Pending);
    }

    #[tokio::test]
    async fn unknown_payment_is_rejected() {
        let f = fixture();
        let signature = compute_payment_signature(KEY_SECRET, "order_x", "pay_x");

        let result = f
            .handler
            .handle(HandlePaymentSuccessCommand {
                payment_id: PaymentId::new(),
                gateway_order_id: "order_x".to_string(),
                gateway_payment_id: "pay_x".to_string(),
                signature,
            })
            .await;

        assert_eq!(result.unwrap_err().code, ErrorCode::PaymentNotFound);
    }
}
