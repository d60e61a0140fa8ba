//! PostgreSQL persistence adapters.

mod invoice_reader;
mod loyalty_store;
mod payment_store;
mod plan_repository;
mod subscription_store;

pub use invoice_reader::PostgresInvoiceReader;
pub use loyalty_store::PostgresLoyaltyStore;
pub use payment_store::PostgresPaymentStore;
pub use plan_repository::PostgresPlanRepository;
pub use subscription_store::PostgresSubscriptionStore;
