//! Plan repository port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PlanId};
use crate::domain::subscription::Plan;

/// Repository port for billing plans.
///
/// Plans are immutable after creation except administrative edits, so the
/// surface is intentionally small.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Save a new plan.
    async fn save(&self, plan: &Plan) -> Result<(), DomainError>;

    /// Find a plan by id. Returns `None` if absent.
    async fn find_by_id(&self, id: &PlanId) -> Result<Option<Plan>, DomainError>;
}
