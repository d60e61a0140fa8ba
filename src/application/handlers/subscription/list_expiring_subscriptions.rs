//! ListExpiringSubscriptionsHandler - feed for renewal reminders.

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::domain::subscription::Subscription;
use crate::ports::SubscriptionStore;

/// Query for subscriptions whose period ends within the next `days` days.
#[derive(Debug, Clone)]
pub struct ListExpiringSubscriptionsQuery {
    pub days: u32,
}

/// Handler listing entitled subscriptions that end soon, across tenants.
/// The reminder job consumes this.
pub struct ListExpiringSubscriptionsHandler {
    subscriptions: Arc<dyn SubscriptionStore>,
}

impl ListExpiringSubscriptionsHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionStore>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(
        &self,
        query: ListExpiringSubscriptionsQuery,
    ) -> Result<Vec<Subscription>, DomainError> {
        self.subscriptions
            .find_expiring_within_days(query.days)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryLedger;
    use crate::domain::foundation::{PlanId, TenantId, Timestamp};
    use crate::domain::payment::Payment;
    use crate::domain::subscription::BillingPeriod;

    async fn seed_active_ending_in(ledger: &MemoryLedger, days_left: i64) -> Subscription {
        let tenant_id = TenantId::new();
        let period = BillingPeriod::compute(None, 30, Timestamp::now());
        let mut sub = Subscription::new_pending(tenant_id, PlanId::new(), period);
        let payment = Payment::new_pending(tenant_id, sub.id, 999.0, "INR", "razorpay");
        ledger.create_with_payment(&sub, &payment).await.unwrap();
        // Activate with the window positioned so `days_left` remain.
        sub.activate(Timestamp::now().add_days(days_left - 30), 30).unwrap();
        ledger.update(&sub).await.unwrap();
        sub
    }

    #[tokio::test]
    async fn only_subscriptions_inside_the_window_are_listed() {
        let ledger = Arc::new(MemoryLedger::new());
        let soon = seed_active_ending_in(&ledger, 3).await;
        let _later = seed_active_ending_in(&ledger, 25).await;

        let handler = ListExpiringSubscriptionsHandler::new(ledger);
        let expiring = handler
            .handle(ListExpiringSubscriptionsQuery { days: 7 })
            .await
            .unwrap();

        assert_eq!(expiring.len(), 1);
        assert_eq!(expiring[0].id, soon.id);
    }

    #[tokio::test]
    async fn already_lapsed_subscriptions_are_not_reminded() {
        let ledger = Arc::new(MemoryLedger::new());
        seed_active_ending_in(&ledger, -2).await;

        let handler = ListExpiringSubscriptionsHandler::new(ledger);
        let expiring = handler
            .handle(ListExpiringSubscriptionsQuery { days: 7 })
            .await
            .unwrap();

        assert!(expiring.is_empty());
    }
}
