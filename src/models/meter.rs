use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// The fixed vocabulary of meter operational states.
///
/// Rows in the `meter_states` lookup table carry the same names; this enum is
/// the in-process side of that vocabulary so decision logic (state matching,
/// change-type targets) stays out of SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeterStateKind {
    Active,
    Suspended,
    Decommissioned,
}

impl MeterStateKind {
    /// Resolves a state name case-insensitively, per the store contract.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "suspended" => Some(Self::Suspended),
            "decommissioned" => Some(Self::Decommissioned),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Suspended => "Suspended",
            Self::Decommissioned => "Decommissioned",
        }
    }

    /// Case-insensitive comparison of two state names.
    pub fn names_match(reported: &str, actual: &str) -> bool {
        reported.trim().eq_ignore_ascii_case(actual.trim())
    }
}

impl std::fmt::Display for MeterStateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the `meter_states` lookup table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MeterState {
    pub id: i32,
    pub name: String,
}

impl MeterState {
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        let state = sqlx::query_as::<_, Self>(
            r#"
            SELECT id, name FROM meter_states WHERE LOWER(name) = LOWER($1)
            "#,
        )
        .bind(name.trim())
        .fetch_optional(pool)
        .await?;

        Ok(state)
    }
}

/// A physical meter installed at a customer's supply point. `state_name` is
/// joined in from the lookup table; `updated_at` is refreshed on every state
/// change.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Meter {
    pub id: i32,
    pub meter_type: String,
    pub brand: String,
    pub location: String,
    pub consumption_kwh: f64,
    pub installed_on: NaiveDate,
    pub manufacture_year: i32,
    pub state_id: i32,
    pub state_name: String,
    pub customer_id: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateMeterData {
    pub meter_type: String,
    pub brand: String,
    pub location: String,
    pub installed_on: NaiveDate,
    pub manufacture_year: i32,
    pub state_id: i32,
    pub customer_id: i32,
}

impl Meter {
    const SELECT: &'static str = r#"
        SELECT m.id, m.meter_type, m.brand, m.location, m.consumption_kwh,
               m.installed_on, m.manufacture_year, m.state_id, s.name AS state_name,
               m.customer_id, m.updated_at
        FROM meters m
        JOIN meter_states s ON s.id = m.state_id
    "#;

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("{} WHERE m.id = $1", Self::SELECT);
        sqlx::query_as::<_, Self>(&sql).bind(id).fetch_optional(pool).await
    }

    /// Finds the meter owned by a customer. A customer owns at most one meter.
    pub async fn find_by_customer(pool: &PgPool, customer_id: i32) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("{} WHERE m.customer_id = $1", Self::SELECT);
        sqlx::query_as::<_, Self>(&sql)
            .bind(customer_id)
            .fetch_optional(pool)
            .await
    }

    /// Inserts a new meter with a 0.0 kWh reading and returns it.
    pub async fn create(pool: &PgPool, data: CreateMeterData) -> Result<Self, sqlx::Error> {
        let inserted_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO meters (meter_type, brand, location, consumption_kwh,
                                installed_on, manufacture_year, state_id, customer_id)
            VALUES ($1, $2, $3, 0.0, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&data.meter_type)
        .bind(&data.brand)
        .bind(&data.location)
        .bind(data.installed_on)
        .bind(data.manufacture_year)
        .bind(data.state_id)
        .bind(data.customer_id)
        .fetch_one(pool)
        .await?;

        Self::find_by_id(pool, inserted_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_state_names_case_insensitively() {
        assert_eq!(MeterStateKind::parse("Active"), Some(MeterStateKind::Active));
        assert_eq!(MeterStateKind::parse("suspended"), Some(MeterStateKind::Suspended));
        assert_eq!(
            MeterStateKind::parse("  DECOMMISSIONED "),
            Some(MeterStateKind::Decommissioned)
        );
    }

    #[test]
    fn test_rejects_unknown_state_names() {
        assert_eq!(MeterStateKind::parse("Broken"), None);
        assert_eq!(MeterStateKind::parse(""), None);
    }

    #[test]
    fn test_state_name_comparison_ignores_case_and_padding() {
        assert!(MeterStateKind::names_match("suspended", "Suspended"));
        assert!(MeterStateKind::names_match(" Active ", "ACTIVE"));
        assert!(!MeterStateKind::names_match("Active", "Suspended"));
    }
}
