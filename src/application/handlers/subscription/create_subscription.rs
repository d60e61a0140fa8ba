//! CreateSubscriptionHandler - command handler for starting a subscription purchase.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, PlanId, TenantId, Timestamp};
use crate::domain::payment::Payment;
use crate::domain::subscription::{BillingPeriod, Subscription};
use crate::ports::{
    CacheInvalidator, GatewayOrder, PaymentGateway, PaymentStore, PlanRepository,
    SubscriptionStore,
};

/// Command to start a subscription purchase for a tenant.
#[derive(Debug, Clone)]
pub struct CreateSubscriptionCommand {
    pub tenant_id: TenantId,
    pub plan_id: PlanId,
}

/// Result of a successful purchase initiation.
///
/// The subscription stays Pending until settlement confirms the payment; the
/// gateway order is what the tenant's client completes checkout against.
#[derive(Debug, Clone)]
pub struct CreateSubscriptionResult {
    pub subscription: Subscription,
    pub payment: Payment,
    pub gateway_order: GatewayOrder,
}

/// Handler for starting a subscription purchase.
///
/// Creates a Pending subscription and its Pending payment atomically, then
/// opens a gateway order for checkout. If the tenant's latest subscription is
/// still entitled, the new period starts where that one ends.
pub struct CreateSubscriptionHandler {
    plans: Arc<dyn PlanRepository>,
    subscriptions: Arc<dyn SubscriptionStore>,
    payments: Arc<dyn PaymentStore>,
    gateway: Arc<dyn PaymentGateway>,
    cache: Arc<dyn CacheInvalidator>,
}

impl CreateSubscriptionHandler {
    pub fn new(
        plans: Arc<dyn PlanRepository>,
        subscriptions: Arc<dyn SubscriptionStore>,
        payments: Arc<dyn PaymentStore>,
        gateway: Arc<dyn PaymentGateway>,
        cache: Arc<dyn CacheInvalidator>,
    ) -> Self {
        Self {
            plans,
            subscriptions,
            payments,
            gateway,
            cache,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateSubscriptionCommand,
    ) -> Result<CreateSubscriptionResult, DomainError> {
        let plan = self
            .plans
            .find_by_id(&cmd.plan_id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::PlanNotFound, "Plan not found"))?;

        let now = Timestamp::now();

        // Extension rule: a still-entitled subscription pushes the new
        // period out to start at its end date. Looked up by entitlement, not
        // recency: an abandoned Pending row from an unfinished checkout must
        // not hide an Active one underneath.
        let previous = self
            .subscriptions
            .find_latest_entitled_by_tenant(&cmd.tenant_id)
            .await?;
        let period = BillingPeriod::compute(previous.as_ref(), plan.validity_days, now);

        let subscription = Subscription::new_pending(cmd.tenant_id, cmd.plan_id, period);
        let mut payment = Payment::new_pending(
            cmd.tenant_id,
            subscription.id,
            plan.price,
            plan.currency.clone(),
            "razorpay",
        );

        self.subscriptions
            .create_with_payment(&subscription, &payment)
            .await?;

        let gateway_order = self
            .gateway
            .create_order(plan.price, &plan.currency, &payment.id.to_string())
            .await?;

        payment.attach_order(gateway_order.id.clone());
        self.payments.record_gateway_order(&payment).await?;

        tracing::info!(
            tenant_id = %cmd.tenant_id,
            subscription_id = %subscription.id,
            gateway_order_id = %gateway_order.id,
            "Subscription purchase initiated"
        );

        self.cache
            .invalidate_pattern(&format!("tenant:{}:*", cmd.tenant_id))
            .await;

        Ok(CreateSubscriptionResult {
            subscription,
            payment,
            gateway_order,
        })
    }
}
