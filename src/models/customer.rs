use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// A customer of the utility, flattened from the `users` + `customers` join.
/// The NIS (supply identification number) is the public customer key.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: String,
    pub nis: i32,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub async fn find_by_nis(pool: &PgPool, nis: i32) -> Result<Option<Self>, sqlx::Error> {
        let customer = sqlx::query_as::<_, Self>(
            r#"
            SELECT u.id, u.first_name, u.last_name, u.address, u.phone, u.email, c.nis
            FROM users u
            JOIN customers c ON c.user_id = u.id
            WHERE c.nis = $1
            "#,
        )
        .bind(nis)
        .fetch_optional(pool)
        .await?;

        Ok(customer)
    }
}
