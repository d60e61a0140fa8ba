//! GetSubscriptionHistoryHandler - a tenant's subscriptions, newest first.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, TenantId, Timestamp};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::ports::SubscriptionStore;

/// Query for a tenant's full subscription history.
#[derive(Debug, Clone)]
pub struct GetSubscriptionHistoryQuery {
    pub tenant_id: TenantId,
}

/// One history entry: the stored subscription plus its display status.
#[derive(Debug, Clone)]
pub struct SubscriptionHistoryEntry {
    pub subscription: Subscription,
    pub display_status: SubscriptionStatus,
}

/// Handler returning a tenant's subscriptions newest first, each with the
/// status a caller should present (lapsed periods read as Expired).
pub struct GetSubscriptionHistoryHandler {
    subscriptions: Arc<dyn SubscriptionStore>,
}

impl GetSubscriptionHistoryHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionStore>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(
        &self,
        query: GetSubscriptionHistoryQuery,
    ) -> Result<Vec<SubscriptionHistoryEntry>, DomainError> {
        let now = Timestamp::now();
        let subscriptions = self
            .subscriptions
            .find_all_by_tenant(&query.tenant_id)
            .await?;

        Ok(subscriptions
            .into_iter()
            .map(|subscription| SubscriptionHistoryEntry {
                display_status: subscription.display_status(now),
                subscription,
            })
            .collect())
    }
}
