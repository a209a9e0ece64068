use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

pub const STATUS_PENDING: &str = "Pending";
pub const STATUS_PAID: &str = "Paid";

/// A billing period invoice for a customer's consumption on one meter.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: i32,
    pub amount: f64,
    pub issued_on: NaiveDate,
    pub due_on: NaiveDate,
    pub consumption_kwh: f64,
    pub status: String,
    pub customer_id: i32,
    pub meter_id: i32,
}

impl Invoice {
    pub fn is_pending(&self) -> bool {
        self.status.eq_ignore_ascii_case(STATUS_PENDING)
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let invoice = sqlx::query_as::<_, Self>(
            r#"
            SELECT id, amount, issued_on, due_on, consumption_kwh, status, customer_id, meter_id
            FROM invoices
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(invoice)
    }

    pub async fn list_for_customer(
        pool: &PgPool,
        customer_id: i32,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let invoices = sqlx::query_as::<_, Self>(
            r#"
            SELECT id, amount, issued_on, due_on, consumption_kwh, status, customer_id, meter_id
            FROM invoices
            WHERE customer_id = $1
            ORDER BY issued_on DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(pool)
        .await?;

        Ok(invoices)
    }
}
