//! Subscription ledger domain: plans, the subscription aggregate, and its
//! status state machine.

mod plan;
mod status;
#[allow(clippy::module_inception)]
mod subscription;

pub use plan::{BillingCycle, Plan};
pub use status::SubscriptionStatus;
pub use subscription::{BillingPeriod, Subscription};
