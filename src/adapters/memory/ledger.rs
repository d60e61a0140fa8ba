//! In-memory ledger store.
//!
//! Backs handler tests and integration tests without a database. The
//! Postgres adapters are the production implementations; this one mirrors
//! their contracts, including atomicity of the combined operations (the
//! single mutex plays the role of the transaction).

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, PaymentId, PlanId, SubscriptionId, TenantId, Timestamp};
use crate::domain::payment::Payment;
use crate::domain::subscription::{Plan, Subscription, SubscriptionStatus};
use crate::ports::{PaymentStore, PlanRepository, SubscriptionStore};

#[derive(Default)]
struct LedgerState {
    plans: Vec<Plan>,
    /// Insertion order doubles as creation order for latest-by-tenant.
    subscriptions: Vec<Subscription>,
    payments: Vec<Payment>,
}

/// In-memory plan/subscription/payment store.
#[derive(Default)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl PlanRepository for MemoryLedger {
    async fn save(&self, plan: &Plan) -> Result<(), DomainError> {
        self.locked().plans.push(plan.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &PlanId) -> Result<Option<Plan>, DomainError> {
        Ok(self.locked().plans.iter().find(|p| p.id == *id).cloned())
    }
}

#[async_trait]
impl SubscriptionStore for MemoryLedger {
    async fn create_with_payment(
        &self,
        subscription: &Subscription,
        payment: &Payment,
    ) -> Result<(), DomainError> {
        let mut state = self.locked();
        state.subscriptions.push(subscription.clone());
        state.payments.push(payment.clone());
        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut state = self.locked();
        match state
            .subscriptions
            .iter_mut()
            .find(|s| s.id == subscription.id)
        {
            Some(slot) => {
                *slot = subscription.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                "Subscription not found",
            )),
        }
    }

    async fn update_many(&self, subscriptions: &[Subscription]) -> Result<(), DomainError> {
        let mut state = self.locked();
        // All-or-nothing: verify every row exists before writing any.
        for subscription in subscriptions {
            if !state.subscriptions.iter().any(|s| s.id == subscription.id) {
                return Err(DomainError::new(
                    ErrorCode::SubscriptionNotFound,
                    "Subscription not found",
                ));
            }
        }
        for subscription in subscriptions {
            if let Some(slot) = state
                .subscriptions
                .iter_mut()
                .find(|s| s.id == subscription.id)
            {
                *slot = subscription.clone();
            }
        }
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .locked()
            .subscriptions
            .iter()
            .find(|s| s.id == *id)
            .cloned())
    }

    async fn find_latest_by_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .locked()
            .subscriptions
            .iter()
            .rev()
            .find(|s| s.tenant_id == *tenant_id)
            .cloned())
    }

    async fn find_latest_entitled_by_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<Subscription>, DomainError> {
        let now = Timestamp::now();
        Ok(self
            .locked()
            .subscriptions
            .iter()
            .rev()
            .find(|s| s.tenant_id == *tenant_id && s.is_entitled(now))
            .cloned())
    }

    async fn find_all_by_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<Subscription>, DomainError> {
        Ok(self
            .locked()
            .subscriptions
            .iter()
            .rev()
            .filter(|s| s.tenant_id == *tenant_id)
            .cloned()
            .collect())
    }

    async fn find_active_by_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<Subscription>, DomainError> {
        Ok(self
            .locked()
            .subscriptions
            .iter()
            .filter(|s| s.tenant_id == *tenant_id && s.status == SubscriptionStatus::Active)
            .cloned()
            .collect())
    }

    async fn find_expiring_within_days(
        &self,
        days: u32,
    ) -> Result<Vec<Subscription>, DomainError> {
        let now = Timestamp::now();
        let threshold = now.add_days(i64::from(days));
        Ok(self
            .locked()
            .subscriptions
            .iter()
            .filter(|s| {
                s.status.is_entitled() && s.end_date.is_after(&now) && !s.end_date.is_after(&threshold)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PaymentStore for MemoryLedger {
    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError> {
        Ok(self.locked().payments.iter().find(|p| p.id == *id).cloned())
    }

    async fn find_with_subscription(
        &self,
        id: &PaymentId,
    ) -> Result<Option<(Payment, Option<Subscription>)>, DomainError> {
        let state = self.locked();
        let payment = match state.payments.iter().find(|p| p.id == *id) {
            Some(p) => p.clone(),
            None => return Ok(None),
        };
        let subscription = payment
            .subscription_id
            .and_then(|sid| state.subscriptions.iter().find(|s| s.id == sid).cloned());
        Ok(Some((payment, subscription)))
    }

    async fn find_by_gateway_order(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        Ok(self
            .locked()
            .payments
            .iter()
            .find(|p| p.gateway_order_id.as_deref() == Some(gateway_order_id))
            .cloned())
    }

    async fn record_gateway_order(&self, payment: &Payment) -> Result<(), DomainError> {
        let mut state = self.locked();
        match state.payments.iter_mut().find(|p| p.id == payment.id) {
            Some(slot) => {
                *slot = payment.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::PaymentNotFound,
                "Payment not found",
            )),
        }
    }

    async fn settle(
        &self,
        payment: &Payment,
        subscription: Option<&Subscription>,
    ) -> Result<(), DomainError> {
        let mut state = self.locked();
        match state.payments.iter_mut().find(|p| p.id == payment.id) {
            Some(slot) => *slot = payment.clone(),
            None => {
                return Err(DomainError::new(
                    ErrorCode::PaymentNotFound,
                    "Payment not found",
                ))
            }
        }
        if let Some(sub) = subscription {
            match state.subscriptions.iter_mut().find(|s| s.id == sub.id) {
                Some(slot) => *slot = sub.clone(),
                None => {
                    return Err(DomainError::new(
                        ErrorCode::SubscriptionNotFound,
                        "Subscription not found",
                    ))
                }
            }
        }
        Ok(())
    }
}
