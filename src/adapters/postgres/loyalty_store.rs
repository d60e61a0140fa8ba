//! PostgreSQL implementation of LoyaltyStore.
//!
//! Earn locks the customer aggregate row for the duration of its
//! transaction. Redeem never reads the balance first: the decrement carries
//! the balance check in its WHERE clause, so two concurrent redemptions can
//! never both pass against the same funds.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    CustomerId, DomainError, ErrorCode, InvoiceId, ProgramId, TenantId, Timestamp, TransactionId,
};
use crate::domain::loyalty::{
    CustomerLoyalty, LoyaltyProgram, LoyaltyTier, LoyaltyTransaction, ProgramStatus, RewardType,
    TransactionKind, TransactionStatus,
};
use crate::ports::{LoyaltyStore, ProgramStatistics};

pub struct PostgresLoyaltyStore {
    pool: PgPool,
}

impl PostgresLoyaltyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProgramRow {
    id: Uuid,
    tenant_id: Uuid,
    reward_type: String,
    cashback_percentage: f64,
    minimum_purchase_amount: f64,
    maximum_cashback_amount: Option<f64>,
    is_default: bool,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProgramRow> for LoyaltyProgram {
    type Error = DomainError;

    fn try_from(row: ProgramRow) -> Result<Self, Self::Error> {
        Ok(LoyaltyProgram {
            id: ProgramId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            reward_type: parse_reward_type(&row.reward_type)?,
            cashback_percentage: row.cashback_percentage,
            minimum_purchase_amount: row.minimum_purchase_amount,
            maximum_cashback_amount: row.maximum_cashback_amount,
            is_default: row.is_default,
            status: parse_program_status(&row.status)?,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    tenant_id: Uuid,
    customer_id: Uuid,
    invoice_id: Option<Uuid>,
    kind: String,
    status: String,
    cashback_amount: f64,
    order_amount: f64,
    effective_percentage: f64,
    description: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for LoyaltyTransaction {
    type Error = DomainError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(LoyaltyTransaction {
            id: TransactionId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            customer_id: CustomerId::from_uuid(row.customer_id),
            invoice_id: row.invoice_id.map(InvoiceId::from_uuid),
            kind: parse_transaction_kind(&row.kind)?,
            status: parse_transaction_status(&row.status)?,
            cashback_amount: row.cashback_amount,
            order_amount: row.order_amount,
            effective_percentage: row.effective_percentage,
            description: row.description,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerLoyaltyRow {
    tenant_id: Uuid,
    customer_id: Uuid,
    total_amount_spent: f64,
    total_orders: i64,
    available_cashback: f64,
    total_cashback_earned: f64,
    current_tier: String,
    tier_expiry_date: Option<DateTime<Utc>>,
    last_activity_date: DateTime<Utc>,
}

impl TryFrom<CustomerLoyaltyRow> for CustomerLoyalty {
    type Error = DomainError;

    fn try_from(row: CustomerLoyaltyRow) -> Result<Self, Self::Error> {
        let tier = parse_loyalty_tier(&row.current_tier)?;
        Ok(CustomerLoyalty {
            tenant_id: TenantId::from_uuid(row.tenant_id),
            customer_id: CustomerId::from_uuid(row.customer_id),
            total_amount_spent: row.total_amount_spent,
            total_orders: row.total_orders.max(0) as u64,
            available_cashback: row.available_cashback,
            total_cashback_earned: row.total_cashback_earned,
            current_tier: tier,
            // Benefit flags are a function of the tier, not stored.
            tier_benefits: tier.benefits(),
            tier_expiry_date: row.tier_expiry_date.map(Timestamp::from_datetime),
            last_activity_date: Timestamp::from_datetime(row.last_activity_date),
        })
    }
}

fn parse_reward_type(s: &str) -> Result<RewardType, DomainError> {
    match s.to_lowercase().as_str() {
        "cashback" => Ok(RewardType::Cashback),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid reward type value: {}", s),
        )),
    }
}

fn parse_program_status(s: &str) -> Result<ProgramStatus, DomainError> {
    match s.to_lowercase().as_str() {
        "active" => Ok(ProgramStatus::Active),
        "inactive" => Ok(ProgramStatus::Inactive),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid program status value: {}", s),
        )),
    }
}

fn program_status_to_string(status: &ProgramStatus) -> &'static str {
    match status {
        ProgramStatus::Active => "active",
        ProgramStatus::Inactive => "inactive",
    }
}

fn parse_transaction_kind(s: &str) -> Result<TransactionKind, DomainError> {
    match s.to_lowercase().as_str() {
        "earn" => Ok(TransactionKind::Earn),
        "redeem" => Ok(TransactionKind::Redeem),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid transaction kind value: {}", s),
        )),
    }
}

fn transaction_kind_to_string(kind: &TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Earn => "earn",
        TransactionKind::Redeem => "redeem",
    }
}

fn parse_transaction_status(s: &str) -> Result<TransactionStatus, DomainError> {
    match s.to_lowercase().as_str() {
        "pending" => Ok(TransactionStatus::Pending),
        "completed" => Ok(TransactionStatus::Completed),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid transaction status value: {}", s),
        )),
    }
}

fn transaction_status_to_string(status: &TransactionStatus) -> &'static str {
    match status {
        TransactionStatus::Pending => "pending",
        TransactionStatus::Completed => "completed",
    }
}

fn parse_loyalty_tier(s: &str) -> Result<LoyaltyTier, DomainError> {
    match s.to_lowercase().as_str() {
        "bronze" => Ok(LoyaltyTier::Bronze),
        "silver" => Ok(LoyaltyTier::Silver),
        "gold" => Ok(LoyaltyTier::Gold),
        "platinum" => Ok(LoyaltyTier::Platinum),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid tier value: {}", s),
        )),
    }
}

const PROGRAM_COLUMNS: &str = r#"
    id, tenant_id, reward_type, cashback_percentage, minimum_purchase_amount,
    maximum_cashback_amount, is_default, status, created_at
"#;

const TRANSACTION_COLUMNS: &str = r#"
    id, tenant_id, customer_id, invoice_id, kind, status, cashback_amount,
    order_amount, effective_percentage, description, created_at
"#;

const CUSTOMER_LOYALTY_COLUMNS: &str = r#"
    tenant_id, customer_id, total_amount_spent, total_orders,
    available_cashback, total_cashback_earned, current_tier,
    tier_expiry_date, last_activity_date
"#;

async fn insert_transaction<'e, E>(
    executor: E,
    transaction: &LoyaltyTransaction,
) -> Result<(), DomainError>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO loyalty_transactions (
            id, tenant_id, customer_id, invoice_id, kind, status,
            cashback_amount, order_amount, effective_percentage, description, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(transaction.id.as_uuid())
    .bind(transaction.tenant_id.as_uuid())
    .bind(transaction.customer_id.as_uuid())
    .bind(transaction.invoice_id.map(|id| *id.as_uuid()))
    .bind(transaction_kind_to_string(&transaction.kind))
    .bind(transaction_status_to_string(&transaction.status))
    .bind(transaction.cashback_amount)
    .bind(transaction.order_amount)
    .bind(transaction.effective_percentage)
    .bind(&transaction.description)
    .bind(transaction.created_at.as_datetime())
    .execute(executor)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.constraint() == Some("loyalty_transactions_earn_invoice_key") {
                return DomainError::new(
                    ErrorCode::DuplicateEarn,
                    "Cashback already credited for this invoice",
                );
            }
        }
        DomainError::database(format!("Failed to save loyalty transaction: {}", e))
    })?;

    Ok(())
}

/// Reads a customer's aggregate with `FOR UPDATE`, holding the row lock for
/// the rest of the transaction.
async fn lock_customer_loyalty(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    tenant_id: &TenantId,
    customer_id: &CustomerId,
) -> Result<Option<CustomerLoyalty>, DomainError> {
    let row: Option<CustomerLoyaltyRow> = sqlx::query_as(&format!(
        "SELECT {} FROM customer_loyalty WHERE tenant_id = $1 AND customer_id = $2 FOR UPDATE",
        CUSTOMER_LOYALTY_COLUMNS
    ))
    .bind(tenant_id.as_uuid())
    .bind(customer_id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| DomainError::database(format!("Failed to lock customer loyalty: {}", e)))?;

    row.map(CustomerLoyalty::try_from).transpose()
}

async fn insert_fresh_aggregate<'e, E>(
    executor: E,
    loyalty: &CustomerLoyalty,
) -> Result<(), DomainError>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO customer_loyalty (
            tenant_id, customer_id, total_amount_spent, total_orders,
            available_cashback, total_cashback_earned, current_tier,
            tier_expiry_date, last_activity_date
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (tenant_id, customer_id) DO NOTHING
        "#,
    )
    .bind(loyalty.tenant_id.as_uuid())
    .bind(loyalty.customer_id.as_uuid())
    .bind(loyalty.total_amount_spent)
    .bind(loyalty.total_orders as i64)
    .bind(loyalty.available_cashback)
    .bind(loyalty.total_cashback_earned)
    .bind(loyalty.current_tier.to_string())
    .bind(loyalty.tier_expiry_date.map(|t| *t.as_datetime()))
    .bind(loyalty.last_activity_date.as_datetime())
    .execute(executor)
    .await
    .map_err(|e| DomainError::database(format!("Failed to create customer loyalty: {}", e)))?;

    Ok(())
}

#[async_trait]
impl LoyaltyStore for PostgresLoyaltyStore {
    async fn find_active_program(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<LoyaltyProgram>, DomainError> {
        let row: Option<ProgramRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM loyalty_programs
            WHERE tenant_id = $1 AND status = 'active'
            ORDER BY is_default ASC, created_at DESC
            LIMIT 1
            "#,
            PROGRAM_COLUMNS
        ))
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find loyalty program: {}", e)))?;

        row.map(LoyaltyProgram::try_from).transpose()
    }

    async fn save_program(&self, program: &LoyaltyProgram) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO loyalty_programs (
                id, tenant_id, reward_type, cashback_percentage, minimum_purchase_amount,
                maximum_cashback_amount, is_default, status, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(program.id.as_uuid())
        .bind(program.tenant_id.as_uuid())
        .bind(match program.reward_type {
            RewardType::Cashback => "cashback",
        })
        .bind(program.cashback_percentage)
        .bind(program.minimum_purchase_amount)
        .bind(program.maximum_cashback_amount)
        .bind(program.is_default)
        .bind(program_status_to_string(&program.status))
        .bind(program.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to save loyalty program: {}", e)))?;

        Ok(())
    }

    async fn find_earn_by_invoice(
        &self,
        invoice_id: &InvoiceId,
    ) -> Result<Option<LoyaltyTransaction>, DomainError> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM loyalty_transactions WHERE kind = 'earn' AND invoice_id = $1",
            TRANSACTION_COLUMNS
        ))
        .bind(invoice_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::database(format!("Failed to find loyalty transaction: {}", e))
        })?;

        row.map(LoyaltyTransaction::try_from).transpose()
    }

    async fn find_customer_loyalty(
        &self,
        tenant_id: &TenantId,
        customer_id: &CustomerId,
    ) -> Result<Option<CustomerLoyalty>, DomainError> {
        let row: Option<CustomerLoyaltyRow> = sqlx::query_as(&format!(
            "SELECT {} FROM customer_loyalty WHERE tenant_id = $1 AND customer_id = $2",
            CUSTOMER_LOYALTY_COLUMNS
        ))
        .bind(tenant_id.as_uuid())
        .bind(customer_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find customer loyalty: {}", e)))?;

        row.map(CustomerLoyalty::try_from).transpose()
    }

    async fn record_earn(
        &self,
        transaction: &LoyaltyTransaction,
    ) -> Result<CustomerLoyalty, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(format!("Failed to begin transaction: {}", e)))?;

        // Read the aggregate under a row lock; concurrent earns for the same
        // customer serialize here, and each one applies its deltas on top of
        // the totals the previous one committed.
        let mut loyalty = match lock_customer_loyalty(
            &mut tx,
            &transaction.tenant_id,
            &transaction.customer_id,
        )
        .await?
        {
            Some(loyalty) => loyalty,
            None => {
                // First earn: materialize the zero row so there is something
                // to lock, then read it back under the lock. A concurrent
                // first earn blocks on the insert until this one commits.
                let fresh =
                    CustomerLoyalty::new(transaction.tenant_id, transaction.customer_id);
                insert_fresh_aggregate(&mut *tx, &fresh).await?;
                lock_customer_loyalty(
                    &mut tx,
                    &transaction.tenant_id,
                    &transaction.customer_id,
                )
                .await?
                .ok_or_else(|| {
                    DomainError::database("Customer loyalty row missing after insert")
                })?
            }
        };

        loyalty.apply_earn(
            transaction.cashback_amount,
            transaction.order_amount,
            transaction.created_at,
        );

        insert_transaction(&mut *tx, transaction).await?;

        sqlx::query(
            r#"
            UPDATE customer_loyalty SET
                total_amount_spent = $3,
                total_orders = $4,
                available_cashback = $5,
                total_cashback_earned = $6,
                current_tier = $7,
                tier_expiry_date = $8,
                last_activity_date = $9
            WHERE tenant_id = $1 AND customer_id = $2
            "#,
        )
        .bind(loyalty.tenant_id.as_uuid())
        .bind(loyalty.customer_id.as_uuid())
        .bind(loyalty.total_amount_spent)
        .bind(loyalty.total_orders as i64)
        .bind(loyalty.available_cashback)
        .bind(loyalty.total_cashback_earned)
        .bind(loyalty.current_tier.to_string())
        .bind(loyalty.tier_expiry_date.map(|t| *t.as_datetime()))
        .bind(loyalty.last_activity_date.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update customer loyalty: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database(format!("Failed to commit transaction: {}", e)))?;

        Ok(loyalty)
    }

    async fn record_redeem(
        &self,
        transaction: &LoyaltyTransaction,
    ) -> Result<CustomerLoyalty, DomainError> {
        // The stored amount is negative; the decrement wants it positive.
        let amount = -transaction.cashback_amount;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(format!("Failed to begin transaction: {}", e)))?;

        let row: Option<CustomerLoyaltyRow> = sqlx::query_as(&format!(
            r#"
            UPDATE customer_loyalty
            SET available_cashback = available_cashback - $3,
                last_activity_date = $4
            WHERE tenant_id = $1 AND customer_id = $2 AND available_cashback >= $3
            RETURNING {}
            "#,
            CUSTOMER_LOYALTY_COLUMNS
        ))
        .bind(transaction.tenant_id.as_uuid())
        .bind(transaction.customer_id.as_uuid())
        .bind(amount)
        .bind(transaction.created_at.as_datetime())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DomainError::database(format!("Failed to redeem cashback: {}", e)))?;

        let updated = match row {
            Some(row) => CustomerLoyalty::try_from(row)?,
            // No row matched: either no aggregate, or the balance fell short.
            None => {
                let exists: bool = sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM customer_loyalty WHERE tenant_id = $1 AND customer_id = $2)",
                )
                .bind(transaction.tenant_id.as_uuid())
                .bind(transaction.customer_id.as_uuid())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| DomainError::database(format!("Failed to check customer loyalty: {}", e)))?;

                if exists {
                    return Err(DomainError::new(
                        ErrorCode::InsufficientBalance,
                        "Available cashback does not cover the redemption amount",
                    ));
                }
                return Err(DomainError::new(
                    ErrorCode::CustomerLoyaltyNotFound,
                    "Customer has no loyalty record",
                ));
            }
        };

        insert_transaction(&mut *tx, transaction).await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database(format!("Failed to commit transaction: {}", e)))?;

        Ok(updated)
    }

    async fn program_statistics(
        &self,
        tenant_id: &TenantId,
        _program_id: &ProgramId,
    ) -> Result<ProgramStatistics, DomainError> {
        let (total_customers, total_cashback_issued): (i64, Option<f64>) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM customer_loyalty WHERE tenant_id = $1),
                (SELECT SUM(cashback_amount) FROM loyalty_transactions
                 WHERE tenant_id = $1 AND kind = 'earn')
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to compute statistics: {}", e)))?;

        let redeemers: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT customer_id) FROM loyalty_transactions
            WHERE tenant_id = $1 AND kind = 'redeem'
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to compute statistics: {}", e)))?;

        let total_customers = total_customers.max(0) as u64;
        let redemption_rate = if total_customers == 0 {
            0.0
        } else {
            redeemers as f64 / total_customers as f64
        };

        Ok(ProgramStatistics {
            total_customers,
            total_cashback_issued: total_cashback_issued.unwrap_or(0.0),
            redemption_rate,
        })
    }
}
