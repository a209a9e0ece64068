use sqlx::PgPool;

use crate::models::{
    customer::Customer,
    meter::{Meter, MeterStateKind},
    request::{CreateRequestData, RequestState, RequestStateKind, RequestType, ServiceChangeRequest},
};

/// Minimum justification length, counted in characters after trimming.
pub const MIN_JUSTIFICATION_CHARS: usize = 10;

#[derive(thiserror::Error, Debug)]
pub enum IntakeError {
    #[error("Customer has no meter associated with their account")]
    NoMeter,

    #[error("Reported state '{reported}' does not match the meter's actual state '{actual}'")]
    StateMismatch { reported: String, actual: String },

    #[error("Request type '{0}' is not recognized")]
    UnknownRequestType(String),

    #[error("Justification must be at least {MIN_JUSTIFICATION_CHARS} characters")]
    JustificationTooShort,

    #[error("Lookup table is missing the '{0}' row")]
    MissingLookup(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Checks the minimum justification length on the trimmed text.
pub fn justification_is_acceptable(justification: &str) -> bool {
    justification.trim().chars().count() >= MIN_JUSTIFICATION_CHARS
}

/// The meter-side intake preconditions: the customer must have a meter, and
/// the self-reported state must match its stored state (case-insensitive).
pub fn require_matching_meter(
    meter: Option<Meter>,
    reported_state: &str,
) -> Result<Meter, IntakeError> {
    let meter = meter.ok_or(IntakeError::NoMeter)?;

    if !MeterStateKind::names_match(reported_state, &meter.state_name) {
        return Err(IntakeError::StateMismatch {
            reported: reported_state.trim().to_string(),
            actual: meter.state_name.clone(),
        });
    }

    Ok(meter)
}

/// Creates a new Pending service-change request for a customer.
///
/// Validation order follows the intake contract:
/// 1. The customer must have an associated meter.
/// 2. The self-reported state must match the meter's stored state
///    (case-insensitive).
/// 3. The change-type name must resolve to a known type.
/// 4. The justification must be at least 10 characters after trimming.
///
/// Every check runs before the single INSERT, so a failed intake persists
/// nothing. The created request snapshots the meter's state at request time.
#[tracing::instrument(skip(pool, customer, justification), fields(customer_nis = customer.nis))]
pub async fn submit_request(
    pool: &PgPool,
    customer: &Customer,
    reported_state: &str,
    request_type_name: &str,
    justification: &str,
) -> Result<ServiceChangeRequest, IntakeError> {
    let meter = require_matching_meter(
        Meter::find_by_customer(pool, customer.id).await?,
        reported_state,
    )?;

    let request_type = RequestType::find_by_name(pool, request_type_name)
        .await?
        .ok_or_else(|| IntakeError::UnknownRequestType(request_type_name.trim().to_string()))?;

    if !justification_is_acceptable(justification) {
        return Err(IntakeError::JustificationTooShort);
    }

    let pending = RequestState::find_by_name(pool, RequestStateKind::Pending.as_str())
        .await?
        .ok_or(IntakeError::MissingLookup("Pending"))?;

    let request = ServiceChangeRequest::create(
        pool,
        CreateRequestData {
            justification: justification.trim().to_string(),
            customer_id: customer.id,
            meter_state_id: meter.state_id,
            request_type_id: request_type.id,
            request_state_id: pending.id,
        },
    )
    .await?;

    tracing::info!(
        request_id = request.id,
        request_type = %request.request_type_name,
        "service-change request registered"
    );

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn suspended_meter() -> Meter {
        Meter {
            id: 11,
            meter_type: "iM10".into(),
            brand: "ABB".into(),
            location: "Av. Libertad 120".into(),
            consumption_kwh: 1520.5,
            installed_on: NaiveDate::from_ymd_opt(2021, 3, 15).unwrap(),
            manufacture_year: 2020,
            state_id: 2,
            state_name: "Suspended".into(),
            customer_id: 3,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_justification_must_have_ten_trimmed_chars() {
        assert!(justification_is_acceptable("needs power"));
        assert!(justification_is_acceptable("0123456789"));
        assert!(!justification_is_acceptable("012345678"));
        assert!(!justification_is_acceptable(""));
    }

    #[test]
    fn test_surrounding_whitespace_does_not_count() {
        assert!(!justification_is_acceptable("   short   "));
        assert!(!justification_is_acceptable("  012345678  "));
        assert!(justification_is_acceptable("  0123456789  "));
    }

    #[test]
    fn test_justification_length_is_counted_in_characters() {
        // 10 multibyte characters still pass.
        assert!(justification_is_acceptable("reconexión"));
    }

    #[test]
    fn test_request_requires_an_associated_meter() {
        let result = require_matching_meter(None, "Suspended");
        assert!(matches!(result, Err(IntakeError::NoMeter)));
    }

    #[test]
    fn test_reported_state_must_match_stored_state() {
        let result = require_matching_meter(Some(suspended_meter()), "Active");
        assert!(matches!(
            result,
            Err(IntakeError::StateMismatch { reported, actual })
                if reported == "Active" && actual == "Suspended"
        ));
    }

    #[test]
    fn test_reported_state_matches_case_insensitively() {
        let meter = require_matching_meter(Some(suspended_meter()), " suspended ").unwrap();
        assert_eq!(meter.id, 11);
    }
}
