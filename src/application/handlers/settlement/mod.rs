//! Payment settlement handlers.
//!
//! Two entry paths converge here: client-relayed confirmations (signature
//! over `order_id|payment_id`) and gateway webhooks (signature over the raw
//! body). Both settle idempotently on the payment's stored status.

mod create_gateway_order;
mod handle_gateway_webhook;
mod handle_payment_failure;
mod handle_payment_success;

pub use create_gateway_order::{
    CreateGatewayOrderCommand, CreateGatewayOrderHandler, CreateGatewayOrderResult,
};
pub use handle_gateway_webhook::{
    HandleGatewayWebhookCommand, HandleGatewayWebhookHandler, WebhookOutcome,
};
pub use handle_payment_failure::{
    HandlePaymentFailureCommand, HandlePaymentFailureHandler, PaymentFailureResult,
};
pub use handle_payment_success::{
    HandlePaymentSuccessCommand, HandlePaymentSuccessHandler, SettlementResult,
};
