//! CancelAllSubscriptionsHandler - bulk cancellation for tenant offboarding.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, TenantId, Timestamp};
use crate::domain::subscription::Subscription;
use crate::ports::{CacheInvalidator, SubscriptionStore};

/// Command to cancel every Active subscription a tenant holds.
#[derive(Debug, Clone)]
pub struct CancelAllSubscriptionsCommand {
    pub tenant_id: TenantId,
}

/// Result listing the subscriptions this call cancelled.
#[derive(Debug, Clone)]
pub struct CancelAllSubscriptionsResult {
    pub cancelled: Vec<Subscription>,
}

/// Handler for cancelling all of a tenant's active subscriptions, used when
/// a tenant offboards. A tenant with nothing active gets an empty result,
/// not an error.
pub struct CancelAllSubscriptionsHandler {
    subscriptions: Arc<dyn SubscriptionStore>,
    cache: Arc<dyn CacheInvalidator>,
}

impl CancelAllSubscriptionsHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionStore>, cache: Arc<dyn CacheInvalidator>) -> Self {
        Self {
            subscriptions,
            cache,
        }
    }

    pub async fn handle(
        &self,
        cmd: CancelAllSubscriptionsCommand,
    ) -> Result<CancelAllSubscriptionsResult, DomainError> {
        let active = self
            .subscriptions
            .find_active_by_tenant(&cmd.tenant_id)
            .await?;

        let now = Timestamp::now();
        let mut cancelled = Vec::with_capacity(active.len());
        for mut subscription in active {
            subscription.cancel(now)?;
            cancelled.push(subscription);
        }
        // One store transaction: a failure leaves every subscription as it
        // was, never a half-offboarded tenant.
        self.subscriptions.update_many(&cancelled).await?;

        if !cancelled.is_empty() {
            tracing::info!(
                tenant_id = %cmd.tenant_id,
                count = cancelled.len(),
                "Cancelled all active subscriptions"
            );
            self.cache
                .invalidate_pattern(&format!("tenant:{}:*", cmd.tenant_id))
                .await;
        }

        Ok(CancelAllSubscriptionsResult { cancelled })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::NoopCacheInvalidator;
    use crate::adapters::memory::MemoryLedger;
    use crate::domain::foundation::PlanId;
    use crate::domain::payment::Payment;
    use crate::domain::subscription::{BillingPeriod, SubscriptionStatus};

    async fn seed_active(ledger: &MemoryLedger, tenant_id: TenantId) -> Subscription {
        let now = Timestamp::now();
        let period = BillingPeriod::compute(None, 30, now);
        let mut sub = Subscription::new_pending(tenant_id, PlanId::new(), period);
        let payment = Payment::new_pending(tenant_id, sub.id, 999.0, "INR", "razorpay");
        ledger.create_with_payment(&sub, &payment).await.unwrap();
        sub.activate(now, 30).unwrap();
        ledger.update(&sub).await.unwrap();
        sub
    }

    #[tokio::test]
    async fn cancels_every_active_subscription() {
        let ledger = Arc::new(MemoryLedger::new());
        let tenant_id = TenantId::new();
        let a = seed_active(&ledger, tenant_id).await;
        let b = seed_active(&ledger, tenant_id).await;
        // Another tenant's subscription stays untouched.
        let other = seed_active(&ledger, TenantId::new()).await;

        let handler =
            CancelAllSubscriptionsHandler::new(ledger.clone(), Arc::new(NoopCacheInvalidator));
        let result = handler
            .handle(CancelAllSubscriptionsCommand { tenant_id })
            .await
            .unwrap();

        assert_eq!(result.cancelled.len(), 2);
        for id in [a.id, b.id] {
            let stored = ledger.find_by_id(&id).await.unwrap().unwrap();
            assert_eq!(stored.status, SubscriptionStatus::Cancelled);
        }
        let untouched = ledger.find_by_id(&other.id).await.unwrap().unwrap();
        assert_eq!(untouched.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn tenant_with_nothing_active_gets_empty_result() {
        let ledger = Arc::new(MemoryLedger::new());
        let handler = CancelAllSubscriptionsHandler::new(ledger, Arc::new(NoopCacheInvalidator));

        let result = handler
            .handle(CancelAllSubscriptionsCommand {
                tenant_id: TenantId::new(),
            })
            .await
            .unwrap();

        assert!(result.cancelled.is_empty());
    }
}
