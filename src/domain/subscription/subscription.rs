//! Subscription aggregate entity.
//!
//! A tenant may accumulate many subscriptions over time, but at most one is
//! concurrently entitled (Active/Trial with a future end date).
//!
//! # Design Decisions
//!
//! - **Derived expiry**: `Expired` is computed from `end_date` at read time
//!   and never persisted.
//! - **Extension rule**: resubscribing while entitled starts the new period
//!   at the previous period's end date, so periods never gap or overlap.
//! - **Settlement-only activation**: nothing but the settlement processor
//!   moves a subscription out of Pending.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DomainError, ErrorCode, PlanId, StateMachine, SubscriptionId, TenantId, Timestamp,
};

use super::SubscriptionStatus;

/// The billing period a new subscription covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriod {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl BillingPeriod {
    /// Computes the period for a new subscription.
    ///
    /// If the tenant's most recent subscription is still entitled (Active or
    /// Trial with `end_date` in the future), the new period is a
    /// continuation starting at that end date. Otherwise it starts now.
    pub fn compute(
        previous: Option<&Subscription>,
        validity_days: i64,
        now: Timestamp,
    ) -> Self {
        let start = match previous {
            Some(prev) if prev.is_entitled(now) => prev.end_date,
            _ => now,
        };
        Self {
            start,
            end: start.add_days(validity_days),
        }
    }
}

/// Subscription aggregate.
///
/// # Invariants
///
/// - `start_date <= end_date`
/// - Status transitions follow the state machine; `Expired` is never stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub tenant_id: TenantId,
    pub plan_id: PlanId,
    pub status: SubscriptionStatus,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub auto_renew: bool,
    pub cancelled_at: Option<Timestamp>,
    /// Free-form metadata carried for the tenant (plan snapshot, notes).
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Creates a new Pending subscription covering the given period.
    ///
    /// Created together with a Pending payment; only settlement activates it.
    pub fn new_pending(tenant_id: TenantId, plan_id: PlanId, period: BillingPeriod) -> Self {
        let now = Timestamp::now();
        Self {
            id: SubscriptionId::new(),
            tenant_id,
            plan_id,
            status: SubscriptionStatus::Pending,
            start_date: period.start,
            end_date: period.end,
            auto_renew: true,
            cancelled_at: None,
            metadata: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a Trial subscription running from now for the given days.
    pub fn new_trial(tenant_id: TenantId, plan_id: PlanId, trial_days: i64) -> Self {
        let now = Timestamp::now();
        Self {
            id: SubscriptionId::new(),
            tenant_id,
            plan_id,
            status: SubscriptionStatus::Trial,
            start_date: now,
            end_date: now.add_days(trial_days),
            auto_renew: true,
            cancelled_at: None,
            metadata: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
        }
    }

    /// True iff this subscription grants entitlement at `now`.
    pub fn is_entitled(&self, now: Timestamp) -> bool {
        self.status.is_entitled() && self.end_date.is_after(&now)
    }

    /// Activates after a successful settlement.
    ///
    /// The period restarts at `now` and runs for the plan's configured
    /// validity days.
    ///
    /// # Errors
    ///
    /// Returns error if the current status does not allow activation.
    pub fn activate(&mut self, now: Timestamp, validity_days: i64) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::Active)?;
        self.start_date = now;
        self.end_date = now.add_days(validity_days);
        self.updated_at = now;
        Ok(())
    }

    /// Cancels this subscription, ending entitlement immediately.
    ///
    /// Idempotent: cancelling an already-cancelled subscription is a no-op.
    pub fn cancel(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if self.status == SubscriptionStatus::Cancelled {
            return Ok(());
        }
        self.transition_to(SubscriptionStatus::Cancelled)?;
        self.end_date = now;
        self.auto_renew = false;
        self.cancelled_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// The status to present to callers, never mutating storage.
    ///
    /// - Active/Trial past their end date read as Expired
    /// - Cancelled/Inactive read as Expired (terminal from the caller's view)
    /// - Pending and in-period Trial/Active pass through
    pub fn display_status(&self, now: Timestamp) -> SubscriptionStatus {
        match self.status {
            SubscriptionStatus::Active | SubscriptionStatus::Trial => {
                if self.end_date.is_after(&now) {
                    self.status
                } else {
                    SubscriptionStatus::Expired
                }
            }
            SubscriptionStatus::Cancelled | SubscriptionStatus::Inactive => {
                SubscriptionStatus::Expired
            }
            other => other,
        }
    }

    fn transition_to(&mut self, target: SubscriptionStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot transition subscription from {} to {}",
                    self.status, target
                ),
            )
        })?;
        Ok(())
    }
}
