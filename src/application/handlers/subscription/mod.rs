//! Subscription lifecycle handlers.

mod cancel_all_subscriptions;
mod cancel_subscription;
mod check_access;
mod create_subscription;
mod get_subscription_history;
mod list_expiring_subscriptions;

pub use cancel_all_subscriptions::{
    CancelAllSubscriptionsCommand, CancelAllSubscriptionsHandler, CancelAllSubscriptionsResult,
};
pub use cancel_subscription::{CancelSubscriptionCommand, CancelSubscriptionHandler};
pub use check_access::{AccessStatus, CheckAccessHandler, CheckAccessQuery};
pub use create_subscription::{
    CreateSubscriptionCommand, CreateSubscriptionHandler, CreateSubscriptionResult,
};
pub use get_subscription_history::{
    GetSubscriptionHistoryHandler, GetSubscriptionHistoryQuery, SubscriptionHistoryEntry,
};
pub use list_expiring_subscriptions::{
    ListExpiringSubscriptionsHandler, ListExpiringSubscriptionsQuery,
};
