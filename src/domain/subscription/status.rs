//! Subscription status state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Stored subscription status.
///
/// `Expired` is a read-time presentation only: it is never written to
/// storage. Entitlement lapses silently when `end_date` passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Created alongside a pending payment; no entitlement yet.
    Pending,

    /// Trial entitlement; behaves like Active until the end date.
    Trial,

    /// Paid entitlement until the end date.
    Active,

    /// Cancelled by the tenant or by a failed settlement.
    Cancelled,

    /// Presentation-only status derived from `end_date`; never persisted.
    Expired,

    /// Administratively disabled.
    Inactive,
}

impl SubscriptionStatus {
    /// True for statuses that can grant entitlement (still subject to the
    /// end-date check on the aggregate).
    pub fn is_entitled(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trial)
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            // Settlement outcome, nothing else, moves a subscription out of
            // Pending.
            (Pending, Active)
                | (Pending, Cancelled)
            // Trial converts on first successful settlement or is cancelled.
                | (Trial, Active)
                | (Trial, Cancelled)
            // Explicit cancel or administrative disable.
                | (Active, Cancelled)
                | (Active, Inactive)
                | (Inactive, Active)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Pending => vec![Active, Cancelled],
            Trial => vec![Active, Cancelled],
            Active => vec![Cancelled, Inactive],
            Cancelled => vec![],
            Expired => vec![],
            Inactive => vec![Active],
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Inactive => "inactive",
        };
        write!(f, "{}", s)
    }
}
