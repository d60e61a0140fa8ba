//! GetProgramStatisticsHandler - merchant-facing program analytics.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, TenantId};
use crate::domain::loyalty::LoyaltyProgram;
use crate::ports::{LoyaltyStore, ProgramStatistics};

/// Query for a tenant's program statistics.
#[derive(Debug, Clone)]
pub struct GetProgramStatisticsQuery {
    pub tenant_id: TenantId,
}

#[derive(Debug, Clone)]
pub struct ProgramStatisticsResult {
    pub program: LoyaltyProgram,
    pub statistics: ProgramStatistics,
}

/// Handler for program statistics.
///
/// Unlike the earn path, no program is auto-provisioned here: a tenant that
/// never ran loyalty has nothing to report on and gets `ProgramNotFound`.
pub struct GetProgramStatisticsHandler {
    loyalty: Arc<dyn LoyaltyStore>,
}

impl GetProgramStatisticsHandler {
    pub fn new(loyalty: Arc<dyn LoyaltyStore>) -> Self {
        Self { loyalty }
    }

    pub async fn handle(
        &self,
        query: GetProgramStatisticsQuery,
    ) -> Result<ProgramStatisticsResult, DomainError> {
        let program = self
            .loyalty
            .find_active_program(&query.tenant_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::ProgramNotFound, "No active loyalty program")
            })?;

        let statistics = self
            .loyalty
            .program_statistics(&query.tenant_id, &program.id)
            .await?;

        Ok(ProgramStatisticsResult {
            program,
            statistics,
        })
    }
}
