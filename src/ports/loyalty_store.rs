//! Loyalty store port.
//!
//! The earn and redeem operations are single atomic store calls: the
//! implementation takes a row lock (or equivalent) on the customer's
//! aggregate before the check-and-update, so two concurrent requests against
//! the same customer cannot both pass the check before either commits.

use async_trait::async_trait;

use crate::domain::foundation::{CustomerId, DomainError, InvoiceId, ProgramId, TenantId};
use crate::domain::loyalty::{CustomerLoyalty, LoyaltyProgram, LoyaltyTransaction};

/// Aggregate statistics for a loyalty program.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgramStatistics {
    /// Customers with a loyalty aggregate under this tenant.
    pub total_customers: u64,
    /// Sum of completed Earn cashback.
    pub total_cashback_issued: f64,
    /// Distinct redeeming customers divided by total customers.
    pub redemption_rate: f64,
}

/// Store port for the loyalty ledger.
#[async_trait]
pub trait LoyaltyStore: Send + Sync {
    /// The tenant's Active program, if one exists.
    async fn find_active_program(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<LoyaltyProgram>, DomainError>;

    /// Persist a program (used for the auto-provisioned default).
    async fn save_program(&self, program: &LoyaltyProgram) -> Result<(), DomainError>;

    /// Find the Earn transaction recorded for an invoice, if any.
    ///
    /// The invoice id is the idempotency key: at most one Earn per invoice.
    async fn find_earn_by_invoice(
        &self,
        invoice_id: &InvoiceId,
    ) -> Result<Option<LoyaltyTransaction>, DomainError>;

    /// The customer's aggregate, if it exists yet.
    async fn find_customer_loyalty(
        &self,
        tenant_id: &TenantId,
        customer_id: &CustomerId,
    ) -> Result<Option<CustomerLoyalty>, DomainError>;

    /// Record an earn: lock the customer's aggregate row (creating it on the
    /// first earn), apply the transaction's cashback and spend to it, and
    /// insert the transaction, all in one store transaction. Returns the
    /// updated aggregate.
    ///
    /// The aggregate is read and written inside the same lock, so two
    /// concurrent earns for one customer serialize and the second sees the
    /// first's totals.
    ///
    /// # Errors
    ///
    /// - `DuplicateEarn` when an Earn for the transaction's invoice already
    ///   exists; nothing is written.
    async fn record_earn(
        &self,
        transaction: &LoyaltyTransaction,
    ) -> Result<CustomerLoyalty, DomainError>;

    /// Record a redemption: atomically decrement the balance only if it
    /// covers the amount, and insert the transaction.
    ///
    /// # Errors
    ///
    /// - `InsufficientBalance` when the conditional decrement matches no
    ///   row; the balance is unchanged.
    /// - `CustomerLoyaltyNotFound` when the customer has no aggregate.
    async fn record_redeem(
        &self,
        transaction: &LoyaltyTransaction,
    ) -> Result<CustomerLoyalty, DomainError>;

    /// Statistics over a tenant's program.
    async fn program_statistics(
        &self,
        tenant_id: &TenantId,
        program_id: &ProgramId,
    ) -> Result<ProgramStatistics, DomainError>;
}
