//! PostgreSQL implementation of DonationRepository.
//!
//! Rows live in the `donations` table. `stripe_id` carries a UNIQUE
//! constraint, so a second insert for the same checkout session becomes a
//! no-op reported as `InsertOutcome::Duplicate`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::donation::{DonationRecord, NewDonation};
use crate::domain::foundation::{DomainError, DonationId, Timestamp};
use crate::ports::{DonationRepository, InsertOutcome};

/// PostgreSQL implementation of the DonationRepository port.
pub struct PostgresDonationRepository {
    pool: PgPool,
}

impl PostgresDonationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a donation.
#[derive(Debug, sqlx::FromRow)]
struct DonationRow {
    id: Uuid,
    amount: Decimal,
    stripe_id: String,
    customer_email: Option<String>,
    customer_name: String,
    created_at: DateTime<Utc>,
}

impl From<DonationRow> for DonationRecord {
    fn from(row: DonationRow) -> Self {
        DonationRecord {
            id: DonationId::from_uuid(row.id),
            amount: row.amount,
            stripe_id: row.stripe_id,
            customer_email: row.customer_email,
            customer_name: row.customer_name,
            created_at: Timestamp::from_datetime(row.created_at),
        }
    }
}

#[async_trait]
impl DonationRepository for PostgresDonationRepository {
    async fn insert(&self, donation: &NewDonation) -> Result<InsertOutcome, DomainError> {
        let row: Option<DonationRow> = sqlx::query_as(
            r#"
            INSERT INTO donations (id, amount, stripe_id, customer_email, customer_name)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (stripe_id) DO NOTHING
            RETURNING id, amount, stripe_id, customer_email, customer_name, created_at
            "#,
        )
        .bind(DonationId::new().as_uuid())
        .bind(donation.amount().to_major_units())
        .bind(donation.stripe_id())
        .bind(donation.customer_email())
        .bind(donation.customer_name().as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert donation: {}", e)))?;

        Ok(match row {
            Some(row) => InsertOutcome::Inserted(row.into()),
            None => InsertOutcome::Duplicate,
        })
    }

    async fn count_by_email(&self, email: &str) -> Result<i64, DomainError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM donations
            WHERE lower(customer_email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to count donations by email: {}", e)))?;

        Ok(count)
    }

    async fn count_all(&self) -> Result<i64, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM donations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to count donations: {}", e)))?;

        Ok(count)
    }
}
