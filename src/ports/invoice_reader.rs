//! Invoice reader port.
//!
//! Invoice CRUD lives outside this subsystem; the loyalty ledger only needs
//! to resolve an invoice id to its tenant, customer, and total.

use async_trait::async_trait;

use crate::domain::foundation::{CustomerId, DomainError, InvoiceId, TenantId};

/// The slice of an invoice the loyalty ledger consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceSummary {
    pub id: InvoiceId,
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    /// Grand total in major currency units.
    pub total: f64,
}

/// Read port over finalized invoices.
#[async_trait]
pub trait InvoiceReader: Send + Sync {
    /// Find a finalized invoice by id. Returns `None` if absent.
    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<InvoiceSummary>, DomainError>;
}
