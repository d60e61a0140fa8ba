//! CustomerLoyalty aggregate entity.
//!
//! Per (tenant, customer) running totals behind the ledger. Created lazily
//! on the first earn and mutated by every subsequent earn or redeem.
//!
//! # Invariants
//!
//! - `available_cashback >= 0` always
//! - `total_cashback_earned` is monotonically non-decreasing

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CustomerId, DomainError, ErrorCode, TenantId, Timestamp};

use super::{LoyaltyTier, TierBenefits};

/// Per-customer loyalty aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerLoyalty {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub total_amount_spent: f64,
    pub total_orders: u64,
    pub available_cashback: f64,
    pub total_cashback_earned: f64,
    pub current_tier: LoyaltyTier,
    pub tier_benefits: TierBenefits,
    /// Set one year out whenever the tier changes.
    pub tier_expiry_date: Option<Timestamp>,
    pub last_activity_date: Timestamp,
}

impl CustomerLoyalty {
    /// Creates a fresh aggregate at Bronze with zeroed totals.
    pub fn new(tenant_id: TenantId, customer_id: CustomerId) -> Self {
        Self {
            tenant_id,
            customer_id,
            total_amount_spent: 0.0,
            total_orders: 0,
            available_cashback: 0.0,
            total_cashback_earned: 0.0,
            current_tier: LoyaltyTier::Bronze,
            tier_benefits: LoyaltyTier::Bronze.benefits(),
            tier_expiry_date: None,
            last_activity_date: Timestamp::now(),
        }
    }

    /// Applies an earn: credits cashback, accumulates spend, and recomputes
    /// the tier.
    pub fn apply_earn(&mut self, cashback: f64, order_amount: f64, now: Timestamp) {
        self.available_cashback += cashback;
        self.total_cashback_earned += cashback;
        self.total_amount_spent += order_amount;
        self.total_orders += 1;
        self.last_activity_date = now;
        self.recompute_tier(now);
    }

    /// Applies a redemption against the available balance.
    ///
    /// # Errors
    ///
    /// Fails with `InsufficientBalance` when `amount` exceeds the available
    /// cashback; the balance is unchanged on failure.
    pub fn apply_redeem(&mut self, amount: f64, now: Timestamp) -> Result<(), DomainError> {
        if amount <= 0.0 {
            return Err(DomainError::validation(
                "amount",
                "Redemption amount must be positive",
            ));
        }
        if amount > self.available_cashback {
            return Err(DomainError::new(
                ErrorCode::InsufficientBalance,
                format!(
                    "Redemption of {:.2} exceeds available cashback {:.2}",
                    amount, self.available_cashback
                ),
            ));
        }
        self.available_cashback -= amount;
        self.last_activity_date = now;
        Ok(())
    }

    /// Recomputes the tier from cumulative spend.
    ///
    /// On a tier change the expiry moves one year out and the benefit flags
    /// are refreshed.
    pub fn recompute_tier(&mut self, now: Timestamp) {
        let tier = LoyaltyTier::for_spend(self.total_amount_spent);
        if tier != self.current_tier {
            self.current_tier = tier;
            self.tier_benefits = tier.benefits();
            self.tier_expiry_date = Some(now.add_years(1));
        }
    }
}
