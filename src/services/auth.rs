use secrecy::{ExposeSecret, Secret};
use sqlx::{FromRow, PgPool};

use crate::models::{customer::Customer, operator::Operator};

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Identifier and password must not be empty")]
    EmptyCredentials,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The logged-in user, tagged by role. Role decides which console menu the
/// user gets and which use cases they may run.
#[derive(Debug, Clone)]
pub enum AuthenticatedUser {
    Customer(Customer),
    Operator(Operator),
}

impl AuthenticatedUser {
    pub fn display_name(&self) -> String {
        match self {
            Self::Customer(c) => format!("{} (Customer, NIS {})", c.full_name(), c.nis),
            Self::Operator(o) => format!("{} (Operator, {})", o.full_name(), o.department),
        }
    }
}

/// Interprets the login identifier as a NIS when it is all digits. A
/// non-numeric identifier can still match an email or a universal id.
pub fn identifier_as_nis(identifier: &str) -> Option<i32> {
    identifier.trim().parse::<i32>().ok()
}

#[derive(FromRow)]
struct CredentialRow {
    id: i32,
    first_name: String,
    last_name: String,
    address: Option<String>,
    phone: Option<String>,
    email: String,
    password: String,
    nis: Option<i32>,
    universal_id: Option<String>,
    department: Option<String>,
}

/// Authenticates a user by email, customer NIS, or operator universal id.
///
/// A single query joins the role tables; which side of the join is populated
/// decides whether the caller gets a Customer or an Operator back.
#[tracing::instrument(skip(pool, password))]
pub async fn authenticate(
    pool: &PgPool,
    identifier: &str,
    password: &Secret<String>,
) -> Result<AuthenticatedUser, AuthError> {
    if identifier.trim().is_empty() || password.expose_secret().is_empty() {
        return Err(AuthError::EmptyCredentials);
    }

    // 0 never matches a real NIS, so non-numeric identifiers fall through to
    // the email / universal id arms of the WHERE clause.
    let nis = identifier_as_nis(identifier).unwrap_or(0);

    let row = sqlx::query_as::<_, CredentialRow>(
        r#"
        SELECT u.id, u.first_name, u.last_name, u.address, u.phone, u.email, u.password,
               c.nis, o.universal_id, o.department
        FROM users u
        LEFT JOIN customers c ON c.user_id = u.id
        LEFT JOIN operators o ON o.user_id = u.id
        WHERE u.email = $1 OR c.nis = $2 OR o.universal_id = $1
        "#,
    )
    .bind(identifier.trim())
    .bind(nis)
    .fetch_optional(pool)
    .await?
    .ok_or(AuthError::InvalidCredentials)?;

    if row.password != *password.expose_secret() {
        return Err(AuthError::InvalidCredentials);
    }

    if let Some(nis) = row.nis {
        tracing::info!(user_id = row.id, nis, "authenticated as customer");
        Ok(AuthenticatedUser::Customer(Customer {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            address: row.address,
            phone: row.phone,
            email: row.email,
            nis,
        }))
    } else if let (Some(universal_id), Some(department)) = (row.universal_id, row.department) {
        tracing::info!(user_id = row.id, %universal_id, "authenticated as operator");
        Ok(AuthenticatedUser::Operator(Operator {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            universal_id,
            department,
        }))
    } else {
        // A users row with neither role attached cannot log in.
        Err(AuthError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_identifier_parses_as_nis() {
        assert_eq!(identifier_as_nis("70001"), Some(70001));
        assert_eq!(identifier_as_nis(" 70001 "), Some(70001));
    }

    #[test]
    fn test_non_numeric_identifier_is_not_a_nis() {
        assert_eq!(identifier_as_nis("ana.suarez@example.com"), None);
        assert_eq!(identifier_as_nis("OP-001"), None);
        assert_eq!(identifier_as_nis(""), None);
    }
}
