//! PostgreSQL implementation of PaymentStore.
//!
//! `settle` applies the payment's terminal status and the subscription's new
//! state in one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, PaymentId, SubscriptionId, TenantId, Timestamp,
};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::subscription::Subscription;
use crate::ports::PaymentStore;

use super::subscription_store::{update_subscription, SubscriptionRow};

pub struct PostgresPaymentStore {
    pool: PgPool,
}

impl PostgresPaymentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a payment.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    tenant_id: Uuid,
    subscription_id: Option<Uuid>,
    amount: f64,
    currency: String,
    status: String,
    gateway: String,
    gateway_order_id: Option<String>,
    gateway_payment_id: Option<String>,
    gateway_response: Option<serde_json::Value>,
    paid_at: Option<DateTime<Utc>>,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            subscription_id: row.subscription_id.map(SubscriptionId::from_uuid),
            amount: row.amount,
            currency: row.currency,
            status: parse_payment_status(&row.status)?,
            gateway: row.gateway,
            gateway_order_id: row.gateway_order_id,
            gateway_payment_id: row.gateway_payment_id,
            gateway_response: row.gateway_response,
            paid_at: row.paid_at.map(Timestamp::from_datetime),
            failure_reason: row.failure_reason,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_payment_status(s: &str) -> Result<PaymentStatus, DomainError> {
    match s.to_lowercase().as_str() {
        "pending" => Ok(PaymentStatus::Pending),
        "completed" => Ok(PaymentStatus::Completed),
        "failed" => Ok(PaymentStatus::Failed),
        "refunded" => Ok(PaymentStatus::Refunded),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid payment status value: {}", s),
        )),
    }
}

fn payment_status_to_string(status: &PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "pending",
        PaymentStatus::Completed => "completed",
        PaymentStatus::Failed => "failed",
        PaymentStatus::Refunded => "refunded",
    }
}

const PAYMENT_COLUMNS: &str = r#"
    id, tenant_id, subscription_id, amount, currency, status, gateway,
    gateway_order_id, gateway_payment_id, gateway_response,
    paid_at, failure_reason, created_at, updated_at
"#;

pub(crate) async fn insert_payment<'e, E>(executor: E, payment: &Payment) -> Result<(), DomainError>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO payments (
            id, tenant_id, subscription_id, amount, currency, status, gateway,
            gateway_order_id, gateway_payment_id, gateway_response,
            paid_at, failure_reason, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(payment.id.as_uuid())
    .bind(payment.tenant_id.as_uuid())
    .bind(payment.subscription_id.map(|id| *id.as_uuid()))
    .bind(payment.amount)
    .bind(&payment.currency)
    .bind(payment_status_to_string(&payment.status))
    .bind(&payment.gateway)
    .bind(&payment.gateway_order_id)
    .bind(&payment.gateway_payment_id)
    .bind(&payment.gateway_response)
    .bind(payment.paid_at.map(|t| *t.as_datetime()))
    .bind(&payment.failure_reason)
    .bind(payment.created_at.as_datetime())
    .bind(payment.updated_at.as_datetime())
    .execute(executor)
    .await
    .map_err(|e| DomainError::database(format!("Failed to save payment: {}", e)))?;

    Ok(())
}

async fn update_payment<'e, E>(executor: E, payment: &Payment) -> Result<(), DomainError>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    let result = sqlx::query(
        r#"
        UPDATE payments SET
            status = $2,
            gateway_order_id = $3,
            gateway_payment_id = $4,
            gateway_response = $5,
            paid_at = $6,
            failure_reason = $7,
            updated_at = $8
        WHERE id = $1
        "#,
    )
    .bind(payment.id.as_uuid())
    .bind(payment_status_to_string(&payment.status))
    .bind(&payment.gateway_order_id)
    .bind(&payment.gateway_payment_id)
    .bind(&payment.gateway_response)
    .bind(payment.paid_at.map(|t| *t.as_datetime()))
    .bind(&payment.failure_reason)
    .bind(payment.updated_at.as_datetime())
    .execute(executor)
    .await
    .map_err(|e| DomainError::database(format!("Failed to update payment: {}", e)))?;

    if result.rows_affected() == 0 {
        return Err(DomainError::new(
            ErrorCode::PaymentNotFound,
            "Payment not found",
        ));
    }

    Ok(())
}

#[async_trait]
impl PaymentStore for PostgresPaymentStore {
    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find payment: {}", e)))?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_with_subscription(
        &self,
        id: &PaymentId,
    ) -> Result<Option<(Payment, Option<Subscription>)>, DomainError> {
        let payment = match self.find_by_id(id).await? {
            Some(p) => p,
            None => return Ok(None),
        };

        let subscription = match payment.subscription_id {
            Some(sub_id) => {
                let row: Option<SubscriptionRow> = sqlx::query_as(
                    r#"
                    SELECT id, tenant_id, plan_id, status, start_date, end_date,
                           auto_renew, cancelled_at, metadata, created_at, updated_at
                    FROM subscriptions
                    WHERE id = $1
                    "#,
                )
                .bind(sub_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::database(format!("Failed to find subscription: {}", e))
                })?;
                row.map(Subscription::try_from).transpose()?
            }
            None => None,
        };

        Ok(Some((payment, subscription)))
    }

    async fn find_by_gateway_order(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE gateway_order_id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(gateway_order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find payment: {}", e)))?;

        row.map(Payment::try_from).transpose()
    }

    async fn record_gateway_order(&self, payment: &Payment) -> Result<(), DomainError> {
        update_payment(&self.pool, payment).await
    }

    async fn settle(
        &self,
        payment: &Payment,
        subscription: Option<&Subscription>,
    ) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(format!("Failed to begin transaction: {}", e)))?;

        // Lock the payment row so concurrent webhook retries serialize here.
        let stored: Option<String> =
            sqlx::query_scalar("SELECT status FROM payments WHERE id = $1 FOR UPDATE")
                .bind(payment.id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| DomainError::database(format!("Failed to lock payment: {}", e)))?;

        let stored = stored.ok_or_else(|| {
            DomainError::new(ErrorCode::PaymentNotFound, "Payment not found")
        })?;

        // A concurrent request already applied this exact settlement; the
        // first write stands.
        if stored == payment_status_to_string(&payment.status) {
            return Ok(());
        }

        update_payment(&mut *tx, payment).await?;
        if let Some(sub) = subscription {
            update_subscription(&mut *tx, sub).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::database(format!("Failed to commit transaction: {}", e)))?;

        Ok(())
    }
}
