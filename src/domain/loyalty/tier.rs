//! Loyalty tiers and spend thresholds.

use serde::{Deserialize, Serialize};

/// Cumulative-spend thresholds, evaluated highest first.
const PLATINUM_THRESHOLD: f64 = 250_000.0;
const GOLD_THRESHOLD: f64 = 100_000.0;
const SILVER_THRESHOLD: f64 = 50_000.0;

/// Loyalty status level unlocked by cumulative spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoyaltyTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

/// Benefit flags granted by a tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBenefits {
    /// Priority support queue.
    pub priority_support: bool,
    /// Early access to new features.
    pub early_access: bool,
    /// Dedicated account manager.
    pub dedicated_manager: bool,
}

impl LoyaltyTier {
    /// Resolves the tier for a cumulative spend amount.
    ///
    /// Thresholds are checked from highest to lowest; first match wins.
    pub fn for_spend(total_amount_spent: f64) -> Self {
        if total_amount_spent >= PLATINUM_THRESHOLD {
            LoyaltyTier::Platinum
        } else if total_amount_spent >= GOLD_THRESHOLD {
            LoyaltyTier::Gold
        } else if total_amount_spent >= SILVER_THRESHOLD {
            LoyaltyTier::Silver
        } else {
            LoyaltyTier::Bronze
        }
    }

    /// Benefit flags for this tier.
    pub fn benefits(&self) -> TierBenefits {
        match self {
            LoyaltyTier::Bronze => TierBenefits {
                priority_support: false,
                early_access: false,
                dedicated_manager: false,
            },
            LoyaltyTier::Silver => TierBenefits {
                priority_support: true,
                early_access: false,
                dedicated_manager: false,
            },
            LoyaltyTier::Gold => TierBenefits {
                priority_support: true,
                early_access: true,
                dedicated_manager: false,
            },
            LoyaltyTier::Platinum => TierBenefits {
                priority_support: true,
                early_access: true,
                dedicated_manager: true,
            },
        }
    }
}

impl std::fmt::Display for LoyaltyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LoyaltyTier::Bronze => "bronze",
            LoyaltyTier::Silver => "silver",
            LoyaltyTier::Gold => "gold",
            LoyaltyTier::Platinum => "platinum",
        };
        write!(f, "{}", s)
    }
}
