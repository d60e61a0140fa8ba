//! In-memory loyalty store.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{
    CustomerId, DomainError, ErrorCode, InvoiceId, ProgramId, TenantId, Timestamp,
};
use crate::domain::loyalty::{
    CustomerLoyalty, LoyaltyProgram, LoyaltyTransaction, ProgramStatus, TransactionKind,
};
use crate::ports::{LoyaltyStore, ProgramStatistics};

#[derive(Default)]
struct LoyaltyState {
    programs: Vec<LoyaltyProgram>,
    transactions: Vec<LoyaltyTransaction>,
    aggregates: Vec<CustomerLoyalty>,
}

/// In-memory loyalty program/transaction/aggregate store.
#[derive(Default)]
pub struct MemoryLoyaltyStore {
    state: Mutex<LoyaltyState>,
}

impl MemoryLoyaltyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, LoyaltyState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LoyaltyStore for MemoryLoyaltyStore {
    async fn find_active_program(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<LoyaltyProgram>, DomainError> {
        Ok(self
            .locked()
            .programs
            .iter()
            .find(|p| p.tenant_id == *tenant_id && p.status == ProgramStatus::Active)
            .cloned())
    }

    async fn save_program(&self, program: &LoyaltyProgram) -> Result<(), DomainError> {
        self.locked().programs.push(program.clone());
        Ok(())
    }

    async fn find_earn_by_invoice(
        &self,
        invoice_id: &InvoiceId,
    ) -> Result<Option<LoyaltyTransaction>, DomainError> {
        Ok(self
            .locked()
            .transactions
            .iter()
            .find(|t| t.kind == TransactionKind::Earn && t.invoice_id == Some(*invoice_id))
            .cloned())
    }

    async fn find_customer_loyalty(
        &self,
        tenant_id: &TenantId,
        customer_id: &CustomerId,
    ) -> Result<Option<CustomerLoyalty>, DomainError> {
        Ok(self
            .locked()
            .aggregates
            .iter()
            .find(|a| a.tenant_id == *tenant_id && a.customer_id == *customer_id)
            .cloned())
    }

    async fn record_earn(
        &self,
        transaction: &LoyaltyTransaction,
    ) -> Result<CustomerLoyalty, DomainError> {
        let mut state = self.locked();
        // Mirror the unique index on (kind = earn, invoice_id).
        if transaction.kind == TransactionKind::Earn
            && state.transactions.iter().any(|t| {
                t.kind == TransactionKind::Earn && t.invoice_id == transaction.invoice_id
            })
        {
            return Err(DomainError::new(
                ErrorCode::DuplicateEarn,
                "Cashback already credited for this invoice",
            ));
        }
        // The aggregate is read and written under the same lock; a concurrent
        // earn cannot slip between the read and the write.
        let updated = match state.aggregates.iter_mut().find(|a| {
            a.tenant_id == transaction.tenant_id && a.customer_id == transaction.customer_id
        }) {
            Some(slot) => {
                slot.apply_earn(
                    transaction.cashback_amount,
                    transaction.order_amount,
                    transaction.created_at,
                );
                slot.clone()
            }
            None => {
                let mut fresh =
                    CustomerLoyalty::new(transaction.tenant_id, transaction.customer_id);
                fresh.apply_earn(
                    transaction.cashback_amount,
                    transaction.order_amount,
                    transaction.created_at,
                );
                state.aggregates.push(fresh.clone());
                fresh
            }
        };
        state.transactions.push(transaction.clone());
        Ok(updated)
    }

    async fn record_redeem(
        &self,
        transaction: &LoyaltyTransaction,
    ) -> Result<CustomerLoyalty, DomainError> {
        let amount = -transaction.cashback_amount;
        let mut state = self.locked();
        let aggregate = state
            .aggregates
            .iter_mut()
            .find(|a| {
                a.tenant_id == transaction.tenant_id && a.customer_id == transaction.customer_id
            })
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::CustomerLoyaltyNotFound,
                    "Customer has no loyalty record",
                )
            })?;
        // The conditional decrement: fail without touching the balance.
        aggregate.apply_redeem(amount, Timestamp::now())?;
        let updated = aggregate.clone();
        state.transactions.push(transaction.clone());
        Ok(updated)
    }

    async fn program_statistics(
        &self,
        tenant_id: &TenantId,
        _program_id: &ProgramId,
    ) -> Result<ProgramStatistics, DomainError> {
        let state = self.locked();
        let total_customers = state
            .aggregates
            .iter()
            .filter(|a| a.tenant_id == *tenant_id)
            .count() as u64;
        let total_cashback_issued = state
            .transactions
            .iter()
            .filter(|t| t.tenant_id == *tenant_id && t.kind == TransactionKind::Earn)
            .map(|t| t.cashback_amount)
            .sum();
        let redeemers: std::collections::HashSet<CustomerId> = state
            .transactions
            .iter()
            .filter(|t| t.tenant_id == *tenant_id && t.kind == TransactionKind::Redeem)
            .map(|t| t.customer_id)
            .collect();
        let redemption_rate = if total_customers == 0 {
            0.0
        } else {
            redeemers.len() as f64 / total_customers as f64
        };
        Ok(ProgramStatistics {
            total_customers,
            total_cashback_issued,
            redemption_rate,
        })
    }
}
