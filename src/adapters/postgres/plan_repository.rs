//! PostgreSQL implementation of PlanRepository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, PlanId};
use crate::domain::subscription::{BillingCycle, Plan};
use crate::ports::PlanRepository;

pub struct PostgresPlanRepository {
    pool: PgPool,
}

impl PostgresPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    id: Uuid,
    name: String,
    price: f64,
    currency: String,
    validity_days: i64,
    billing_cycle: String,
}

impl TryFrom<PlanRow> for Plan {
    type Error = DomainError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        Ok(Plan {
            id: PlanId::from_uuid(row.id),
            name: row.name,
            price: row.price,
            currency: row.currency,
            validity_days: row.validity_days,
            billing_cycle: parse_billing_cycle(&row.billing_cycle)?,
        })
    }
}

fn parse_billing_cycle(s: &str) -> Result<BillingCycle, DomainError> {
    match s.to_lowercase().as_str() {
        "monthly" => Ok(BillingCycle::Monthly),
        "quarterly" => Ok(BillingCycle::Quarterly),
        "yearly" => Ok(BillingCycle::Yearly),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid billing cycle value: {}", s),
        )),
    }
}

fn billing_cycle_to_string(cycle: &BillingCycle) -> &'static str {
    match cycle {
        BillingCycle::Monthly => "monthly",
        BillingCycle::Quarterly => "quarterly",
        BillingCycle::Yearly => "yearly",
    }
}

#[async_trait]
impl PlanRepository for PostgresPlanRepository {
    async fn save(&self, plan: &Plan) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO plans (id, name, price, currency, validity_days, billing_cycle)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                price = EXCLUDED.price,
                currency = EXCLUDED.currency,
                validity_days = EXCLUDED.validity_days,
                billing_cycle = EXCLUDED.billing_cycle
            "#,
        )
        .bind(plan.id.as_uuid())
        .bind(&plan.name)
        .bind(plan.price)
        .bind(&plan.currency)
        .bind(plan.validity_days)
        .bind(billing_cycle_to_string(&plan.billing_cycle))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to save plan: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &PlanId) -> Result<Option<Plan>, DomainError> {
        let row: Option<PlanRow> = sqlx::query_as(
            r#"
            SELECT id, name, price, currency, validity_days, billing_cycle
            FROM plans
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find plan: {}", e)))?;

        row.map(Plan::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_billing_cycle_works_for_all_values() {
        assert_eq!(parse_billing_cycle("monthly").unwrap(), BillingCycle::Monthly);
        assert_eq!(parse_billing_cycle("quarterly").unwrap(), BillingCycle::Quarterly);
        assert_eq!(parse_billing_cycle("yearly").unwrap(), BillingCycle::Yearly);
        assert_eq!(parse_billing_cycle("Monthly").unwrap(), BillingCycle::Monthly);
    }

    #[test]
    fn parse_billing_cycle_rejects_invalid_values() {
        assert!(parse_billing_cycle("weekly").is_err());
        assert!(parse_billing_cycle("").is_err());
    }

    #[test]
    fn roundtrip_billing_cycle_conversion() {
        for cycle in [
            BillingCycle::Monthly,
            BillingCycle::Quarterly,
            BillingCycle::Yearly,
        ] {
            let s = billing_cycle_to_string(&cycle);
            assert_eq!(parse_billing_cycle(s).unwrap(), cycle);
        }
    }
}
