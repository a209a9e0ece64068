use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A payment recorded against an invoice. Rows are inserted by the billing
/// service when a customer pays a pending invoice.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: i32,
    pub amount: f64,
    pub paid_at: DateTime<Utc>,
    pub method: String,
    pub status: String,
    pub invoice_id: i32,
}
