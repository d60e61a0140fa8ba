//! PostgreSQL implementation of SubscriptionStore.
//!
//! `create_with_payment` writes the subscription and its pending payment in
//! one transaction; a failure on either insert leaves no partial state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, PlanId, SubscriptionId, TenantId, Timestamp,
};
use crate::domain::payment::Payment;
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::ports::SubscriptionStore;

use super::payment_store::insert_payment;

pub struct PostgresSubscriptionStore {
    pool: PgPool,
}

impl PostgresSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SubscriptionRow {
    id: Uuid,
    tenant_id: Uuid,
    plan_id: Uuid,
    status: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    auto_renew: bool,
    cancelled_at: Option<DateTime<Utc>>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            plan_id: PlanId::from_uuid(row.plan_id),
            status: parse_subscription_status(&row.status)?,
            start_date: Timestamp::from_datetime(row.start_date),
            end_date: Timestamp::from_datetime(row.end_date),
            auto_renew: row.auto_renew,
            cancelled_at: row.cancelled_at.map(Timestamp::from_datetime),
            metadata: row.metadata,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

/// Parses a stored status. `expired` is rejected: expiry is derived from
/// `end_date` at read time and never written.
pub(crate) fn parse_subscription_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    match s.to_lowercase().as_str() {
        "pending" => Ok(SubscriptionStatus::Pending),
        "trial" => Ok(SubscriptionStatus::Trial),
        "active" => Ok(SubscriptionStatus::Active),
        "cancelled" => Ok(SubscriptionStatus::Cancelled),
        "inactive" => Ok(SubscriptionStatus::Inactive),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid subscription status value: {}", s),
        )),
    }
}

pub(crate) fn subscription_status_to_string(status: &SubscriptionStatus) -> &'static str {
    match status {
        SubscriptionStatus::Pending => "pending",
        SubscriptionStatus::Trial => "trial",
        SubscriptionStatus::Active => "active",
        SubscriptionStatus::Cancelled => "cancelled",
        SubscriptionStatus::Inactive => "inactive",
        // Writers only persist stored statuses; reads derive expiry instead.
        SubscriptionStatus::Expired => "expired",
    }
}

const SUBSCRIPTION_COLUMNS: &str = r#"
    id, tenant_id, plan_id, status, start_date, end_date,
    auto_renew, cancelled_at, metadata, created_at, updated_at
"#;

pub(crate) async fn insert_subscription<'e, E>(
    executor: E,
    subscription: &Subscription,
) -> Result<(), DomainError>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO subscriptions (
            id, tenant_id, plan_id, status, start_date, end_date,
            auto_renew, cancelled_at, metadata, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(subscription.id.as_uuid())
    .bind(subscription.tenant_id.as_uuid())
    .bind(subscription.plan_id.as_uuid())
    .bind(subscription_status_to_string(&subscription.status))
    .bind(subscription.start_date.as_datetime())
    .bind(subscription.end_date.as_datetime())
    .bind(subscription.auto_renew)
    .bind(subscription.cancelled_at.map(|t| *t.as_datetime()))
    .bind(&subscription.metadata)
    .bind(subscription.created_at.as_datetime())
    .bind(subscription.updated_at.as_datetime())
    .execute(executor)
    .await
    .map_err(|e| DomainError::database(format!("Failed to save subscription: {}", e)))?;

    Ok(())
}

pub(crate) async fn update_subscription<'e, E>(
    executor: E,
    subscription: &Subscription,
) -> Result<(), DomainError>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    let result = sqlx::query(
        r#"
        UPDATE subscriptions SET
            status = $2,
            start_date = $3,
            end_date = $4,
            auto_renew = $5,
            cancelled_at = $6,
            metadata = $7,
            updated_at = $8
        WHERE id = $1
        "#,
    )
    .bind(subscription.id.as_uuid())
    .bind(subscription_status_to_string(&subscription.status))
    .bind(subscription.start_date.as_datetime())
    .bind(subscription.end_date.as_datetime())
    .bind(subscription.auto_renew)
    .bind(subscription.cancelled_at.map(|t| *t.as_datetime()))
    .bind(&subscription.metadata)
    .bind(subscription.updated_at.as_datetime())
    .execute(executor)
    .await
    .map_err(|e| DomainError::database(format!("Failed to update subscription: {}", e)))?;

    if result.rows_affected() == 0 {
        return Err(DomainError::new(
            ErrorCode::SubscriptionNotFound,
            "Subscription not found",
        ));
    }

    Ok(())
}

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    async fn create_with_payment(
        &self,
        subscription: &Subscription,
        payment: &Payment,
    ) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(format!("Failed to begin transaction: {}", e)))?;

        insert_subscription(&mut *tx, subscription).await?;
        insert_payment(&mut *tx, payment).await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database(format!("Failed to commit transaction: {}", e)))?;

        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        update_subscription(&self.pool, subscription).await
    }

    async fn update_many(&self, subscriptions: &[Subscription]) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(format!("Failed to begin transaction: {}", e)))?;

        for subscription in subscriptions {
            update_subscription(&mut *tx, subscription).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::database(format!("Failed to commit transaction: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE id = $1",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find subscription: {}", e)))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_latest_by_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE tenant_id = $1 ORDER BY created_at DESC LIMIT 1",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find subscription: {}", e)))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_latest_entitled_by_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM subscriptions
            WHERE tenant_id = $1
              AND status IN ('active', 'trial')
              AND end_date > $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(tenant_id.as_uuid())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find subscription: {}", e)))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_all_by_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<Subscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE tenant_id = $1 ORDER BY created_at DESC",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list subscriptions: {}", e)))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn find_active_by_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<Subscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE tenant_id = $1 AND status = 'active'",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list subscriptions: {}", e)))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn find_expiring_within_days(
        &self,
        days: u32,
    ) -> Result<Vec<Subscription>, DomainError> {
        let now = Utc::now();
        let threshold = now + chrono::Duration::days(i64::from(days));

        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM subscriptions
            WHERE status IN ('active', 'trial')
              AND end_date > $1
              AND end_date <= $2
            ORDER BY end_date ASC
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(now)
        .bind(threshold)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::database(format!("Failed to find expiring subscriptions: {}", e))
        })?;

        rows.into_iter().map(Subscription::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_works_for_stored_values() {
        assert_eq!(
            parse_subscription_status("pending").unwrap(),
            SubscriptionStatus::Pending
        );
        assert_eq!(
            parse_subscription_status("trial").unwrap(),
            SubscriptionStatus::Trial
        );
        assert_eq!(
            parse_subscription_status("active").unwrap(),
            SubscriptionStatus::Active
        );
        assert_eq!(
            parse_subscription_status("cancelled").unwrap(),
            SubscriptionStatus::Cancelled
        );
        assert_eq!(
            parse_subscription_status("inactive").unwrap(),
            SubscriptionStatus::Inactive
        );
        assert_eq!(
            parse_subscription_status("ACTIVE").unwrap(),
            SubscriptionStatus::Active
        );
    }

    #[test]
    fn parse_status_rejects_expired() {
        // Expiry is derived, never stored; a stored value is corruption.
        assert!(parse_subscription_status("expired").is_err());
    }

    #[test]
    fn parse_status_rejects_invalid_values() {
        assert!(parse_subscription_status("paused").is_err());
        assert!(parse_subscription_status("").is_err());
    }

    #[test]
    fn roundtrip_stored_status_conversion() {
        for status in [
            SubscriptionStatus::Pending,
            SubscriptionStatus::Trial,
            SubscriptionStatus::Active,
            SubscriptionStatus::Cancelled,
            SubscriptionStatus::Inactive,
        ] {
            let s = subscription_status_to_string(&status);
            assert_eq!(parse_subscription_status(s).unwrap(), status);
        }
    }
}
