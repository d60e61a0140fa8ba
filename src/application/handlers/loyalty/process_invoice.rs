//! ProcessInvoiceHandler - credits cashback for a finalized invoice.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, InvoiceId};
use crate::domain::loyalty::{calculate_cashback, CustomerLoyalty, LoyaltyTransaction};
use crate::ports::{InvoiceReader, LoyaltyStore};

use super::calculate_cashback::resolve_program;

/// Command crediting cashback for one invoice.
#[derive(Debug, Clone)]
pub struct ProcessInvoiceCommand {
    pub invoice_id: InvoiceId,
}

/// What processing an invoice did.
///
/// Replays and races both land on `AlreadyCredited` with the transaction the
/// first processing wrote; the invoice id is the idempotency key.
#[derive(Debug, Clone)]
pub enum ProcessInvoiceOutcome {
    /// Cashback was credited now.
    Credited {
        transaction: LoyaltyTransaction,
        loyalty: CustomerLoyalty,
    },
    /// This invoice already earned; nothing changed.
    AlreadyCredited { transaction: LoyaltyTransaction },
    /// The invoice total is below the program minimum; no ledger entry.
    BelowMinimum,
}

pub struct ProcessInvoiceHandler {
    invoices: Arc<dyn InvoiceReader>,
    loyalty: Arc<dyn LoyaltyStore>,
}

impl ProcessInvoiceHandler {
    pub fn new(invoices: Arc<dyn InvoiceReader>, loyalty: Arc<dyn LoyaltyStore>) -> Self {
        Self { invoices, loyalty }
    }

    pub async fn handle(
        &self,
        cmd: ProcessInvoiceCommand,
    ) -> Result<ProcessInvoiceOutcome, DomainError> {
        let invoice = self
            .invoices
            .find_by_id(&cmd.invoice_id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::InvoiceNotFound, "Invoice not found"))?;

        if let Some(existing) = self.loyalty.find_earn_by_invoice(&invoice.id).await? {
            tracing::info!(invoice_id = %invoice.id, "Invoice already earned cashback");
            return Ok(ProcessInvoiceOutcome::AlreadyCredited {
                transaction: existing,
            });
        }

        let program = resolve_program(self.loyalty.as_ref(), &invoice.tenant_id).await?;
        let cashback = calculate_cashback(&program, invoice.total);
        if cashback <= 0.0 {
            tracing::debug!(
                invoice_id = %invoice.id,
                total = invoice.total,
                minimum = program.minimum_purchase_amount,
                "Invoice below program minimum; no cashback"
            );
            return Ok(ProcessInvoiceOutcome::BelowMinimum);
        }

        let transaction = LoyaltyTransaction::earn(
            invoice.tenant_id,
            invoice.customer_id,
            invoice.id,
            cashback,
            invoice.total,
            program.cashback_percentage,
        );

        // The store applies the earn to the aggregate under its own row
        // lock, so concurrent invoices for one customer accumulate instead
        // of overwriting each other.
        let loyalty = match self.loyalty.record_earn(&transaction).await {
            Ok(loyalty) => loyalty,
            // Lost a race with a concurrent processing of the same invoice;
            // the winner's entry is the answer.
            Err(err) if err.code == ErrorCode::DuplicateEarn => {
                let existing = self
                    .loyalty
                    .find_earn_by_invoice(&invoice.id)
                    .await?
                    .ok_or(err)?;
                return Ok(ProcessInvoiceOutcome::AlreadyCredited {
                    transaction: existing,
                });
            }
            Err(err) => return Err(err),
        };

        tracing::info!(
            invoice_id = %invoice.id,
            tenant_id = %invoice.tenant_id,
            customer_id = %invoice.customer_id,
            cashback,
            tier = %loyalty.current_tier,
            "Cashback credited"
        );

        Ok(ProcessInvoiceOutcome::Credited {
            transaction,
            loyalty,
        })
    }
}
