//! Loyalty ledger domain: programs, the per-customer aggregate, ledger
//! transactions, tiers, and cashback math.

mod cashback;
mod customer;
mod program;
mod tier;
mod transaction;

pub use cashback::{calculate_cashback, parse_amount, round2, safe_number};
pub use customer::CustomerLoyalty;
pub use program::{LoyaltyProgram, ProgramStatus, RewardType};
pub use tier::{LoyaltyTier, TierBenefits};
pub use transaction::{LoyaltyTransaction, TransactionKind, TransactionStatus};
