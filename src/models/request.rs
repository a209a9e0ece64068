use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::models::meter::MeterStateKind;

/// The change a customer can ask for. Each type resolves to exactly one
/// target meter state when an operator applies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestTypeKind {
    Activation,
    Suspension,
    Decommission,
}

impl RequestTypeKind {
    /// Resolves a change-type name case-insensitively against the fixed
    /// vocabulary.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "activation" => Some(Self::Activation),
            "suspension" => Some(Self::Suspension),
            "decommission" => Some(Self::Decommission),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activation => "Activation",
            Self::Suspension => "Suspension",
            Self::Decommission => "Decommission",
        }
    }

    /// The meter state an approved request of this type moves the meter to.
    pub fn target_state(&self) -> MeterStateKind {
        match self {
            Self::Activation => MeterStateKind::Active,
            Self::Suspension => MeterStateKind::Suspended,
            Self::Decommission => MeterStateKind::Decommissioned,
        }
    }
}

impl std::fmt::Display for RequestTypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution state of a service-change request. The only legal transition
/// is Pending -> Finalized; Finalized is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStateKind {
    Pending,
    Finalized,
}

impl RequestStateKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "finalized" => Some(Self::Finalized),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Finalized => "Finalized",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized)
    }
}

impl std::fmt::Display for RequestStateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the `request_types` lookup table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RequestType {
    pub id: i32,
    pub name: String,
}

impl RequestType {
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, Self>(
            r#"
            SELECT id, name FROM request_types WHERE LOWER(name) = LOWER($1)
            "#,
        )
        .bind(name.trim())
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }
}

/// A row of the `request_states` lookup table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RequestState {
    pub id: i32,
    pub name: String,
}

impl RequestState {
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, Self>(
            r#"
            SELECT id, name FROM request_states WHERE LOWER(name) = LOWER($1)
            "#,
        )
        .bind(name.trim())
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }
}

/// A customer's service-change request, flattened with the names of its
/// lookup references and the owning customer's NIS. `meter_state_name` is the
/// snapshot of the meter's state at request time, not the live state.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceChangeRequest {
    pub id: i32,
    pub justification: String,
    pub created_at: DateTime<Utc>,
    pub customer_id: i32,
    pub customer_nis: i32,
    pub meter_state_name: String,
    pub request_type_name: String,
    pub request_state_name: String,
}

#[derive(Debug, Clone)]
pub struct CreateRequestData {
    pub justification: String,
    pub customer_id: i32,
    pub meter_state_id: i32,
    pub request_type_id: i32,
    pub request_state_id: i32,
}

impl ServiceChangeRequest {
    const SELECT: &'static str = r#"
        SELECT r.id, r.justification, r.created_at, r.customer_id,
               c.nis AS customer_nis,
               ms.name AS meter_state_name,
               rt.name AS request_type_name,
               rs.name AS request_state_name
        FROM service_change_requests r
        JOIN customers c ON c.user_id = r.customer_id
        JOIN meter_states ms ON ms.id = r.meter_state_id
        JOIN request_types rt ON rt.id = r.request_type_id
        JOIN request_states rs ON rs.id = r.request_state_id
    "#;

    pub fn request_type(&self) -> Option<RequestTypeKind> {
        RequestTypeKind::parse(&self.request_type_name)
    }

    pub fn resolution_state(&self) -> Option<RequestStateKind> {
        RequestStateKind::parse(&self.request_state_name)
    }

    pub async fn create(pool: &PgPool, data: CreateRequestData) -> Result<Self, sqlx::Error> {
        let inserted_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO service_change_requests
                (justification, customer_id, meter_state_id, request_type_id, request_state_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&data.justification)
        .bind(data.customer_id)
        .bind(data.meter_state_id)
        .bind(data.request_type_id)
        .bind(data.request_state_id)
        .fetch_one(pool)
        .await?;

        Self::find_by_id(pool, inserted_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("{} WHERE r.id = $1", Self::SELECT);
        sqlx::query_as::<_, Self>(&sql).bind(id).fetch_optional(pool).await
    }

    pub async fn list_pending(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "{} WHERE LOWER(rs.name) = LOWER($1) ORDER BY r.created_at",
            Self::SELECT
        );
        sqlx::query_as::<_, Self>(&sql)
            .bind(RequestStateKind::Pending.as_str())
            .fetch_all(pool)
            .await
    }

    pub async fn list_pending_for_customer(
        pool: &PgPool,
        customer_id: i32,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "{} WHERE r.customer_id = $1 AND LOWER(rs.name) = LOWER($2) ORDER BY r.created_at",
            Self::SELECT
        );
        sqlx::query_as::<_, Self>(&sql)
            .bind(customer_id)
            .bind(RequestStateKind::Pending.as_str())
            .fetch_all(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_request_type_names_case_insensitively() {
        assert_eq!(RequestTypeKind::parse("Activation"), Some(RequestTypeKind::Activation));
        assert_eq!(RequestTypeKind::parse("suspension"), Some(RequestTypeKind::Suspension));
        assert_eq!(RequestTypeKind::parse(" DECOMMISSION "), Some(RequestTypeKind::Decommission));
        assert_eq!(RequestTypeKind::parse("Upgrade"), None);
    }

    #[test]
    fn test_request_types_map_to_their_target_states() {
        assert_eq!(RequestTypeKind::Activation.target_state(), MeterStateKind::Active);
        assert_eq!(RequestTypeKind::Suspension.target_state(), MeterStateKind::Suspended);
        assert_eq!(
            RequestTypeKind::Decommission.target_state(),
            MeterStateKind::Decommissioned
        );
    }

    #[test]
    fn test_finalized_is_the_only_terminal_state() {
        assert!(RequestStateKind::Finalized.is_terminal());
        assert!(!RequestStateKind::Pending.is_terminal());
    }

    #[test]
    fn test_parses_resolution_state_names() {
        assert_eq!(RequestStateKind::parse("pending"), Some(RequestStateKind::Pending));
        assert_eq!(RequestStateKind::parse("FINALIZED"), Some(RequestStateKind::Finalized));
        assert_eq!(RequestStateKind::parse("Approved"), None);
    }
}
