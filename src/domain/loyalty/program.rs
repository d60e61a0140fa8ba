//! Loyalty program configuration.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ProgramId, TenantId, Timestamp};

/// Default program provisioned for tenants that never configured one.
const DEFAULT_CASHBACK_PERCENTAGE: f64 = 5.0;
const DEFAULT_MINIMUM_PURCHASE: f64 = 10_000.0;
const DEFAULT_MAXIMUM_CASHBACK: f64 = 5_000.0;

/// What a program rewards. Cashback is the only kind today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    Cashback,
}

/// Program status. Exactly one Active program per tenant is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramStatus {
    Active,
    Inactive,
}

/// A tenant's loyalty program: how much cashback its customers earn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyProgram {
    pub id: ProgramId,
    pub tenant_id: TenantId,
    pub reward_type: RewardType,
    /// Percentage of the invoice amount earned as cashback.
    pub cashback_percentage: f64,
    /// Invoices below this amount earn nothing.
    pub minimum_purchase_amount: f64,
    /// Per-invoice cashback cap; None means uncapped.
    pub maximum_cashback_amount: Option<f64>,
    pub is_default: bool,
    pub status: ProgramStatus,
    pub created_at: Timestamp,
}

impl LoyaltyProgram {
    /// The hard-coded default program, auto-provisioned when a tenant has no
    /// Active program: 5% cashback, 10,000 minimum purchase, 5,000 cap.
    pub fn default_for_tenant(tenant_id: TenantId) -> Self {
        Self {
            id: ProgramId::new(),
            tenant_id,
            reward_type: RewardType::Cashback,
            cashback_percentage: DEFAULT_CASHBACK_PERCENTAGE,
            minimum_purchase_amount: DEFAULT_MINIMUM_PURCHASE,
            maximum_cashback_amount: Some(DEFAULT_MAXIMUM_CASHBACK),
            is_default: true,
            status: ProgramStatus::Active,
            created_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_program_matches_contract() {
        let program = LoyaltyProgram::default_for_tenant(TenantId::new());
        assert_eq!(program.cashback_percentage, 5.0);
        assert_eq!(program.minimum_purchase_amount, 10_000.0);
        assert_eq!(program.maximum_cashback_amount, Some(5_000.0));
        assert!(program.is_default);
        assert_eq!(program.status, ProgramStatus::Active);
    }
}
