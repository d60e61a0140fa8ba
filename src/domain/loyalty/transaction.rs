//! Loyalty ledger transactions.
//!
//! The ledger is append-oriented: every earn and redeem is a transaction
//! row, and the CustomerLoyalty aggregate carries the derived running
//! balance. At most one Earn transaction exists per invoice; the invoice id
//! is the idempotency key.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CustomerId, InvoiceId, TenantId, Timestamp, TransactionId};

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Earn,
    Redeem,
}

/// Ledger entry status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
}

/// One entry in the loyalty ledger.
///
/// `cashback_amount` is signed: positive for Earn, negative for Redeem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyTransaction {
    pub id: TransactionId,
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    /// Present for invoice-driven earns; None for manual redemptions.
    pub invoice_id: Option<InvoiceId>,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub cashback_amount: f64,
    /// The invoice amount that produced this entry (0 for manual redeems).
    pub order_amount: f64,
    /// The program percentage in effect when the entry was written.
    pub effective_percentage: f64,
    pub description: String,
    pub created_at: Timestamp,
}

impl LoyaltyTransaction {
    /// Creates a completed Earn entry for an invoice.
    pub fn earn(
        tenant_id: TenantId,
        customer_id: CustomerId,
        invoice_id: InvoiceId,
        cashback_amount: f64,
        order_amount: f64,
        effective_percentage: f64,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            tenant_id,
            customer_id,
            invoice_id: Some(invoice_id),
            kind: TransactionKind::Earn,
            status: TransactionStatus::Completed,
            cashback_amount,
            order_amount,
            effective_percentage,
            description: format!(
                "Cashback earned on invoice {} ({}% of {:.2})",
                invoice_id, effective_percentage, order_amount
            ),
            created_at: Timestamp::now(),
        }
    }

    /// Creates a completed Redeem entry. The stored amount is negative.
    pub fn redeem(
        tenant_id: TenantId,
        customer_id: CustomerId,
        amount: f64,
        invoice_id: Option<InvoiceId>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            tenant_id,
            customer_id,
            invoice_id,
            kind: TransactionKind::Redeem,
            status: TransactionStatus::Completed,
            cashback_amount: -amount,
            order_amount: 0.0,
            effective_percentage: 0.0,
            description: match invoice_id {
                Some(id) => format!("Cashback redeemed against invoice {}", id),
                None => "Cashback redeemed".to_string(),
            },
            created_at: Timestamp::now(),
        }
    }
}
