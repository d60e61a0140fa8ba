//! CheckAccessHandler - the entitlement gate other services call.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, TenantId, Timestamp};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::ports::SubscriptionStore;

/// Query asking whether a tenant currently has access.
#[derive(Debug, Clone)]
pub struct CheckAccessQuery {
    pub tenant_id: TenantId,
}

/// Entitlement answer.
///
/// `status` is the display status of the latest subscription (Expired when
/// its period lapsed), `None` when the tenant never subscribed.
#[derive(Debug, Clone)]
pub struct AccessStatus {
    pub has_access: bool,
    pub status: Option<SubscriptionStatus>,
    pub subscription: Option<Subscription>,
}

/// Handler answering entitlement checks against the latest subscription.
pub struct CheckAccessHandler {
    subscriptions: Arc<dyn SubscriptionStore>,
}

impl CheckAccessHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionStore>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(&self, query: CheckAccessQuery) -> Result<AccessStatus, DomainError> {
        let latest = self
            .subscriptions
            .find_latest_by_tenant(&query.tenant_id)
            .await?;

        let now = Timestamp::now();
        Ok(match latest {
            Some(subscription) => AccessStatus {
                has_access: subscription.is_entitled(now),
                status: Some(subscription.display_status(now)),
                subscription: Some(subscription),
            },
            None => AccessStatus {
                has_access: false,
                status: None,
                subscription: None,
            },
        })
    }
}
