use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// The supply contract linking a customer to a meter. Resolution of an
/// activation request stamps `activated_at`; the other timestamps record the
/// most recent suspension/decommission for reporting.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceAccount {
    pub id: i32,
    pub activated_at: Option<DateTime<Utc>>,
    pub suspended_at: Option<DateTime<Utc>>,
    pub decommissioned_at: Option<DateTime<Utc>>,
    pub customer_id: i32,
    pub meter_id: i32,
}

impl ServiceAccount {
    pub async fn create(
        pool: &PgPool,
        customer_id: i32,
        meter_id: i32,
    ) -> Result<Self, sqlx::Error> {
        let service = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO services (customer_id, meter_id)
            VALUES ($1, $2)
            RETURNING id, activated_at, suspended_at, decommissioned_at, customer_id, meter_id
            "#,
        )
        .bind(customer_id)
        .bind(meter_id)
        .fetch_one(pool)
        .await?;

        Ok(service)
    }
}
