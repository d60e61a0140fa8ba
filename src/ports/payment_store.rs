//! Payment store port.
//!
//! Settlement writes touch the payment and its linked subscription in one
//! transaction, so the store exposes a combined settle operation rather
//! than independent updates the processor would have to sequence.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PaymentId};
use crate::domain::payment::Payment;
use crate::domain::subscription::Subscription;

/// Store port for Payment records.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Find a payment by id.
    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError>;

    /// Find a payment together with its linked subscription, if any.
    async fn find_with_subscription(
        &self,
        id: &PaymentId,
    ) -> Result<Option<(Payment, Option<Subscription>)>, DomainError>;

    /// Find a payment by the gateway's order id (webhook correlation).
    async fn find_by_gateway_order(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Payment>, DomainError>;

    /// Persist the gateway order id assigned to a pending payment.
    async fn record_gateway_order(&self, payment: &Payment) -> Result<(), DomainError>;

    /// Persist a settlement outcome: the updated payment and, when linked,
    /// the updated subscription, atomically in one transaction.
    async fn settle(
        &self,
        payment: &Payment,
        subscription: Option<&Subscription>,
    ) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn PaymentStore) {}
    }
}
