//! CancelSubscriptionHandler - command handler for cancelling one subscription.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp};
use crate::domain::subscription::Subscription;
use crate::ports::{CacheInvalidator, SubscriptionStore};

/// Command to cancel a subscription.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub subscription_id: SubscriptionId,
}

/// Handler for cancelling a subscription.
///
/// Cancellation ends entitlement immediately and is idempotent: cancelling an
/// already-cancelled subscription returns it unchanged.
pub struct CancelSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionStore>,
    cache: Arc<dyn CacheInvalidator>,
}

impl CancelSubscriptionHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionStore>, cache: Arc<dyn CacheInvalidator>) -> Self {
        Self {
            subscriptions,
            cache,
        }
    }

    pub async fn handle(
        &self,
        cmd: CancelSubscriptionCommand,
    ) -> Result<Subscription, DomainError> {
        let mut subscription = self
            .subscriptions
            .find_by_id(&cmd.subscription_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::SubscriptionNotFound, "Subscription not found")
            })?;

        let now = Timestamp::now();
        subscription.cancel(now)?;
        self.subscriptions.update(&subscription).await?;

        tracing::info!(
            subscription_id = %subscription.id,
            tenant_id = %subscription.tenant_id,
            "Subscription cancelled"
        );

        self.cache
            .invalidate_pattern(&format!("tenant:{}:*", subscription.tenant_id))
            .await;

        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::NoopCacheInvalidator;
    use crate::adapters::memory::MemoryLedger;
    use crate::domain::foundation::{PlanId, TenantId};
    use crate::domain::payment::Payment;
    use crate::domain::subscription::{BillingPeriod, SubscriptionStatus};

    async fn seed_active(ledger: &MemoryLedger) -> Subscription {
        let now = Timestamp::now();
        let tenant_id = TenantId::new();
        let period = BillingPeriod::compute(None, 30, now);
        let mut sub = Subscription::new_pending(tenant_id, PlanId::new(), period);
        let payment = Payment::new_pending(tenant_id, sub.id, 999.0, "INR", "razorpay");
        ledger.create_with_payment(&sub, &payment).await.unwrap();
        sub.activate(now, 30).unwrap();
        ledger.update(&sub).await.unwrap();
        sub
    }

    #[tokio::test]
    async fn cancel_ends_entitlement_and_persists() {
        let ledger = Arc::new(MemoryLedger::new());
        let sub = seed_active(&ledger).await;
        let handler =
            CancelSubscriptionHandler::new(ledger.clone(), Arc::new(NoopCacheInvalidator));

        let cancelled = handler
            .handle(CancelSubscriptionCommand {
                subscription_id: sub.id,
            })
            .await
            .unwrap();

        assert_eq!(cancelled.status, SubscriptionStatus::Cancelled);
        assert!(!cancelled.auto_renew);
        assert!(!cancelled.is_entitled(Timestamp::now()));

        let stored = ledger.find_by_id(&sub.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Cancelled);
    }

    #[tokio::test]
    async fn cancel_twice_is_a_no_op() {
        let ledger = Arc::new(MemoryLedger::new());
        let sub = seed_active(&ledger).await;
        let handler =
            CancelSubscriptionHandler::new(ledger.clone(), Arc::new(NoopCacheInvalidator));

        let first = handler
            .handle(CancelSubscriptionCommand {
                subscription_id: sub.id,
            })
            .await
            .unwrap();
        let second = handler
            .handle(CancelSubscriptionCommand {
                subscription_id: sub.id,
            })
            .await
            .unwrap();

        assert_eq!(first.cancelled_at, second.cancelled_at);
        assert_eq!(first.end_date, second.end_date);
    }

    #[tokio::test]
    async fn unknown_subscription_is_rejected() {
        let ledger = Arc::new(MemoryLedger::new());
        let handler = CancelSubscriptionHandler::new(ledger, Arc::new(NoopCacheInvalidator));

        let result = handler
            .handle(CancelSubscriptionCommand {
                subscription_id: SubscriptionId::new(),
            })
            .await;

        assert_eq!(result.unwrap_err().code, ErrorCode::SubscriptionNotFound);
    }
}
