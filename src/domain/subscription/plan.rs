//! Billing plan value object.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PlanId, ValidationError};

/// How often a plan bills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Quarterly,
    Yearly,
}

/// A billing plan. Immutable after creation except administrative edits;
/// subscriptions reference plans by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    /// Price in major currency units.
    pub price: f64,
    /// ISO currency code (e.g. "INR").
    pub currency: String,
    /// How many days of entitlement one payment buys.
    pub validity_days: i64,
    pub billing_cycle: BillingCycle,
}

impl Plan {
    /// Creates a new plan, validating price and validity.
    pub fn new(
        name: impl Into<String>,
        price: f64,
        currency: impl Into<String>,
        validity_days: i64,
        billing_cycle: BillingCycle,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let currency = currency.into();

        if name.is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if currency.is_empty() {
            return Err(ValidationError::empty_field("currency"));
        }
        if price < 0.0 {
            return Err(ValidationError::negative("price", price));
        }
        if validity_days <= 0 {
            return Err(ValidationError::invalid_format(
                "validity_days",
                "must be a positive number of days",
            ));
        }

        Ok(Self {
            id: PlanId::new(),
            name,
            price,
            currency,
            validity_days,
            billing_cycle,
        })
    }
}
