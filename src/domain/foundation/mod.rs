//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that form the
//! vocabulary of the ledger domain.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{
    CustomerId, InvoiceId, PaymentId, PlanId, ProgramId, SubscriptionId, TenantId, TransactionId,
};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
