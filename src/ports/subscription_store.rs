//! Subscription store port (write side plus tenant-scoped reads).
//!
//! Implementations must run every multi-step mutation in a single database
//! transaction with rollback on any error; nothing may be left
//! half-committed.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, SubscriptionId, TenantId};
use crate::domain::payment::Payment;
use crate::domain::subscription::Subscription;

/// Store port for Subscription aggregates.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Persist a new subscription together with its pending payment, in one
    /// transaction. Either both rows commit or neither does.
    async fn create_with_payment(
        &self,
        subscription: &Subscription,
        payment: &Payment,
    ) -> Result<(), DomainError>;

    /// Update an existing subscription.
    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Update a batch of subscriptions in one transaction: either every row
    /// commits or none does.
    async fn update_many(&self, subscriptions: &[Subscription]) -> Result<(), DomainError>;

    /// Find a subscription by id.
    async fn find_by_id(&self, id: &SubscriptionId)
        -> Result<Option<Subscription>, DomainError>;

    /// The tenant's most recently created subscription, if any.
    ///
    /// This is the row the entitlement check consults.
    async fn find_latest_by_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<Subscription>, DomainError>;

    /// The tenant's most recent still-entitled subscription: status Active
    /// or Trial with a future end date.
    ///
    /// This is the row the extension rule consults; abandoned Pending rows
    /// from unfinished checkouts must not hide it.
    async fn find_latest_entitled_by_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<Subscription>, DomainError>;

    /// All subscriptions for a tenant, newest first.
    async fn find_all_by_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<Subscription>, DomainError>;

    /// All currently Active subscriptions for a tenant (offboarding path).
    async fn find_active_by_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<Subscription>, DomainError>;

    /// Subscriptions whose end date falls within the next `days` days.
    ///
    /// Used for renewal reminders.
    async fn find_expiring_within_days(
        &self,
        days: u32,
    ) -> Result<Vec<Subscription>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn SubscriptionStore) {}
    }
}
