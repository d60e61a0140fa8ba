//! Ports - contracts between the application core and the outside world.

mod cache_invalidator;
mod invoice_reader;
mod loyalty_store;
mod payment_gateway;
mod payment_store;
mod plan_repository;
mod subscription_store;

pub use cache_invalidator::CacheInvalidator;
pub use invoice_reader::{InvoiceReader, InvoiceSummary};
pub use loyalty_store::{LoyaltyStore, ProgramStatistics};
pub use payment_gateway::{
    GatewayError, GatewayEventKind, GatewayOrder, ParsedEvent, PaymentGateway,
};
pub use payment_store::PaymentStore;
pub use plan_repository::PlanRepository;
pub use subscription_store::SubscriptionStore;
