//! In-memory invoice reader.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, InvoiceId};
use crate::ports::{InvoiceReader, InvoiceSummary};

/// In-memory invoice lookup, seeded by tests.
#[derive(Default)]
pub struct MemoryInvoiceReader {
    invoices: Mutex<Vec<InvoiceSummary>>,
}

impl MemoryInvoiceReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, invoice: InvoiceSummary) {
        self.invoices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(invoice);
    }
}

#[async_trait]
impl InvoiceReader for MemoryInvoiceReader {
    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<InvoiceSummary>, DomainError> {
        Ok(self
            .invoices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .find(|i| i.id == *id)
            .cloned())
    }
}
