//! RedeemCashbackHandler - debits a customer's cashback balance.

use std::sync::Arc;

use crate::domain::foundation::{CustomerId, DomainError, InvoiceId, TenantId};
use crate::domain::loyalty::{CustomerLoyalty, LoyaltyTransaction};
use crate::ports::LoyaltyStore;

/// Command redeeming cashback, optionally against an invoice.
#[derive(Debug, Clone)]
pub struct RedeemCashbackCommand {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    /// Positive amount to redeem, in major units.
    pub amount: f64,
    pub invoice_id: Option<InvoiceId>,
}

#[derive(Debug, Clone)]
pub struct RedeemCashbackResult {
    pub transaction: LoyaltyTransaction,
    pub loyalty: CustomerLoyalty,
}

/// Handler for redemptions.
///
/// The balance check and decrement happen atomically in the store, so two
/// concurrent redemptions cannot both spend the same cashback. Failures
/// leave the balance untouched.
pub struct RedeemCashbackHandler {
    loyalty: Arc<dyn LoyaltyStore>,
}

impl RedeemCashbackHandler {
    pub fn new(loyalty: Arc<dyn LoyaltyStore>) -> Self {
        Self { loyalty }
    }

    pub async fn handle(
        &self,
        cmd: RedeemCashbackCommand,
    ) -> Result<RedeemCashbackResult, DomainError> {
        if !cmd.amount.is_finite() || cmd.amount <= 0.0 {
            return Err(DomainError::validation(
                "amount",
                "Redemption amount must be positive",
            ));
        }

        let transaction = LoyaltyTransaction::redeem(
            cmd.tenant_id,
            cmd.customer_id,
            cmd.amount,
            cmd.invoice_id,
        );
        let loyalty = self.loyalty.record_redeem(&transaction).await?;

        tracing::info!(
            tenant_id = %cmd.tenant_id,
            customer_id = %cmd.customer_id,
            amount = cmd.amount,
            remaining = loyalty.available_cashback,
            "Cashback redeemed"
        );

        Ok(RedeemCashbackResult {
            transaction,
            loyalty,
        })
    }
}
