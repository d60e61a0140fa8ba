//! PostgreSQL implementation of InvoiceReader.
//!
//! Invoices are owned by the invoicing subsystem; this is a read-only view
//! over the columns the loyalty ledger needs.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{CustomerId, DomainError, InvoiceId, TenantId};
use crate::ports::{InvoiceReader, InvoiceSummary};

pub struct PostgresInvoiceReader {
    pool: PgPool,
}

impl PostgresInvoiceReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: Uuid,
    tenant_id: Uuid,
    customer_id: Uuid,
    total: f64,
}

impl From<InvoiceRow> for InvoiceSummary {
    fn from(row: InvoiceRow) -> Self {
        InvoiceSummary {
            id: InvoiceId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            customer_id: CustomerId::from_uuid(row.customer_id),
            total: row.total,
        }
    }
}

#[async_trait]
impl InvoiceReader for PostgresInvoiceReader {
    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<InvoiceSummary>, DomainError> {
        let row: Option<InvoiceRow> = sqlx::query_as(
            "SELECT id, tenant_id, customer_id, total FROM invoices WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find invoice: {}", e)))?;

        Ok(row.map(InvoiceSummary::from))
    }
}
