//! CalculateCashbackHandler - quotes cashback without writing the ledger.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, TenantId};
use crate::domain::loyalty::{calculate_cashback, LoyaltyProgram};
use crate::ports::LoyaltyStore;

/// Query quoting the cashback an invoice amount would earn.
#[derive(Debug, Clone)]
pub struct CalculateCashbackQuery {
    pub tenant_id: TenantId,
    pub invoice_amount: f64,
}

/// A cashback quote under the program that would apply.
#[derive(Debug, Clone)]
pub struct CashbackQuote {
    pub cashback_amount: f64,
    pub program: LoyaltyProgram,
}

/// Handler quoting cashback for an amount.
///
/// A tenant with no Active program gets the default program auto-provisioned
/// here, so the quote and a later earn run under the same configuration.
pub struct CalculateCashbackHandler {
    loyalty: Arc<dyn LoyaltyStore>,
}

impl CalculateCashbackHandler {
    pub fn new(loyalty: Arc<dyn LoyaltyStore>) -> Self {
        Self { loyalty }
    }

    pub async fn handle(&self, query: CalculateCashbackQuery) -> Result<CashbackQuote, DomainError> {
        let program = resolve_program(self.loyalty.as_ref(), &query.tenant_id).await?;
        let cashback_amount = calculate_cashback(&program, query.invoice_amount);

        Ok(CashbackQuote {
            cashback_amount,
            program,
        })
    }
}

/// The tenant's Active program, auto-provisioning the default when none
/// exists yet.
pub(crate) async fn resolve_program(
    loyalty: &dyn LoyaltyStore,
    tenant_id: &TenantId,
) -> Result<LoyaltyProgram, DomainError> {
    if let Some(program) = loyalty.find_active_program(tenant_id).await? {
        return Ok(program);
    }

    let program = LoyaltyProgram::default_for_tenant(*tenant_id);
    loyalty.save_program(&program).await?;
    tracing::info!(tenant_id = %tenant_id, program_id = %program.id, "Auto-provisioned default loyalty program");
    Ok(program)
}
