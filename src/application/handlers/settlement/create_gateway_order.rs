//! CreateGatewayOrderHandler - attaches a gateway order to a pending payment.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, PaymentId};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::ports::{GatewayOrder, PaymentGateway, PaymentStore};

/// Command to create a gateway order for an existing pending payment, used
/// when the tenant's client abandoned checkout before an order was made.
#[derive(Debug, Clone)]
pub struct CreateGatewayOrderCommand {
    pub payment_id: PaymentId,
}

#[derive(Debug, Clone)]
pub struct CreateGatewayOrderResult {
    pub payment: Payment,
    pub gateway_order: GatewayOrder,
}

pub struct CreateGatewayOrderHandler {
    payments: Arc<dyn PaymentStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl CreateGatewayOrderHandler {
    pub fn new(payments: Arc<dyn PaymentStore>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { payments, gateway }
    }

    pub async fn handle(
        &self,
        cmd: CreateGatewayOrderCommand,
    ) -> Result<CreateGatewayOrderResult, DomainError> {
        let mut payment = self
            .payments
            .find_by_id(&cmd.payment_id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::PaymentNotFound, "Payment not found"))?;

        if payment.status != PaymentStatus::Pending {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot create an order for a {} payment", payment.status),
            ));
        }
        if payment.gateway_order_id.is_some() {
            return Err(DomainError::validation(
                "gateway_order_id",
                "Payment already has a gateway order",
            ));
        }

        let order = self
            .gateway
            .create_order(payment.amount, &payment.currency, &payment.id.to_string())
            .await?;

        payment.attach_order(&order.id);
        self.payments.record_gateway_order(&payment).await?;

        tracing::info!(
            payment_id = %payment.id,
            gateway_order_id = %order.id,
            "Created gateway order for pending payment"
        );

        Ok(CreateGatewayOrderResult {
            payment,
            gateway_order: order,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryLedger;
    use crate::adapters::razorpay::MockGateway;
    use crate::domain::foundation::{PlanId, TenantId, Timestamp};
    use crate::domain::subscription::{BillingPeriod, Subscription};
    use crate::ports::SubscriptionStore as _;

    struct Fixture {
        ledger: Arc<MemoryLedger>,
        gateway: Arc<MockGateway>,
        handler: CreateGatewayOrderHandler,
    }

    fn fixture() -> Fixture {
        let ledger = Arc::new(MemoryLedger::new());
        let gateway = Arc::new(MockGateway::new());
        let handler = CreateGatewayOrderHandler::new(ledger.clone(), gateway.clone());
        Fixture {
            ledger,
            gateway,
            handler,
        }
    }

    async fn seed_orderless_payment(ledger: &MemoryLedger) -> Payment {
        let tenant_id = TenantId::new();
        let period = BillingPeriod::compute(None, 30, Timestamp::now());
        let sub = Subscription::new_pending(tenant_id, PlanId::new(), period);
        let payment = Payment::new_pending(tenant_id, sub.id, 499.0, "INR", "razorpay");
        ledger.create_with_payment(&sub, &payment).await.unwrap();
        payment
    }

    #[tokio::test]
    async fn creates_and_records_an_order() {
        let f = fixture();
        let payment = seed_orderless_payment(&f.ledger).await;

        let result = f
            .handler
            .handle(CreateGatewayOrderCommand {
                payment_id: payment.id,
            })
            .await
            .unwrap();

        assert!(result.payment.gateway_order_id.is_some());
        assert_eq!(result.payment.gateway_order_id.as_deref(), Some(result.gateway_order.id.as_str()));
        // Minor units at the gateway.
        assert_eq!(result.gateway_order.amount_minor, 49_900);

        let stored = PaymentStore::find_by_id(f.ledger.as_ref(), &payment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.gateway_order_id, result.payment.gateway_order_id);
    }

    #[tokio::test]
    async fn rejects_payment_that_already_has_an_order() {
        let f = fixture();
        let payment = seed_orderless_payment(&f.ledger).await;
        f.handler
            .handle(CreateGatewayOrderCommand {
                payment_id: payment.id,
            })
            .await
            .unwrap();

        let result = f
            .handler
            .handle(CreateGatewayOrderCommand {
                payment_id: payment.id,
            })
            .await;

        assert_eq!(result.unwrap_err().code, ErrorCode::ValidationFailed);
        // No second order reached the gateway.
        assert_eq!(f.gateway.created_orders().len(), 1);
    }

    #[tokio::test]
    async fn rejects_unknown_payment() {
        let f = fixture();
        let result = f
            .handler
            .handle(CreateGatewayOrderCommand {
                payment_id: PaymentId::new(),
            })
            .await;

        assert_eq!(result.unwrap_err().code, ErrorCode::PaymentNotFound);
    }

    #[tokio::test]
    async fn gateway_failure_surfaces_without_recording_an_order() {
        let f = fixture();
        let payment = seed_orderless_payment(&f.ledger).await;
        f.gateway.fail_next_orders(true);

        let result = f
            .handler
            .handle(CreateGatewayOrderCommand {
                payment_id: payment.id,
            })
            .await;

        assert_eq!(result.unwrap_err().code, ErrorCode::GatewayError);
        let stored = PaymentStore::find_by_id(f.ledger.as_ref(), &payment.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.gateway_order_id.is_none());
    }
}
