use sqlx::PgPool;

use crate::models::{
    customer::Customer,
    meter::{Meter, MeterState, MeterStateKind},
    operator::Operator,
    request::{RequestState, RequestStateKind, ServiceChangeRequest},
};

#[derive(thiserror::Error, Debug)]
pub enum ResolutionError {
    #[error("'{0}' is not a valid NIS")]
    InvalidNis(String),

    #[error("No customer found with NIS {0}")]
    CustomerNotFound(i32),

    #[error("Meter state '{0}' is not recognized")]
    UnknownTargetState(String),

    #[error("The request's customer has no associated meter")]
    MeterNotFound,

    #[error("Request #{0} is already finalized")]
    AlreadyFinalized(i32),

    #[error("Lookup table is missing the '{0}' row")]
    MissingLookup(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// All Pending requests, oldest first.
pub async fn pending_requests(pool: &PgPool) -> Result<Vec<ServiceChangeRequest>, ResolutionError> {
    Ok(ServiceChangeRequest::list_pending(pool).await?)
}

/// Pending requests for the customer identified by a NIS entered at the
/// console. Fails if the text is not a number or no customer carries it.
pub async fn pending_requests_for_nis(
    pool: &PgPool,
    nis_text: &str,
) -> Result<Vec<ServiceChangeRequest>, ResolutionError> {
    let nis: i32 = nis_text
        .trim()
        .parse()
        .map_err(|_| ResolutionError::InvalidNis(nis_text.trim().to_string()))?;

    let customer = Customer::find_by_nis(pool, nis)
        .await?
        .ok_or(ResolutionError::CustomerNotFound(nis))?;

    Ok(ServiceChangeRequest::list_pending_for_customer(pool, customer.id).await?)
}

/// The meter currently associated with the request's customer.
pub async fn meter_for_request(
    pool: &PgPool,
    request: &ServiceChangeRequest,
) -> Result<Option<Meter>, ResolutionError> {
    Ok(Meter::find_by_customer(pool, request.customer_id).await?)
}

/// Resolves a Pending request by applying the target meter state.
///
/// 1. Resolve the target state name (case-insensitive); unrecognized names
///    fail before any mutation.
/// 2. Locate the meter owned by the request's customer; fail if absent.
/// 3. Apply the state to the meter and refresh its `updated_at`.
/// 4. Only when the target state is Active, stamp `activated_at` on the
///    related service record. A missing service record logs a warning but
///    does not abort the resolution.
/// 5. Transition the request Pending -> Finalized.
///
/// Steps 3-5 run in one transaction; the meter and the request are never
/// updated independently. Finalized is terminal: resolving an already
/// finalized request fails without touching the store.
#[tracing::instrument(
    skip(pool, request, operator),
    fields(request_id = request.id, operator = %operator.universal_id)
)]
pub async fn resolve_request(
    pool: &PgPool,
    request: &ServiceChangeRequest,
    target_state_name: &str,
    operator: &Operator,
) -> Result<ServiceChangeRequest, ResolutionError> {
    // An unparseable resolution state reads as terminal rather than retried.
    if request.resolution_state().map_or(true, |s| s.is_terminal()) {
        return Err(ResolutionError::AlreadyFinalized(request.id));
    }

    // The vocabulary is fixed, so an unrecognized name is rejected before the
    // store is touched at all.
    let target_kind = MeterStateKind::parse(target_state_name)
        .ok_or_else(|| ResolutionError::UnknownTargetState(target_state_name.trim().to_string()))?;

    let target_state = MeterState::find_by_name(pool, target_kind.as_str())
        .await?
        .ok_or(ResolutionError::MissingLookup(target_kind.as_str()))?;

    let finalized = RequestState::find_by_name(pool, RequestStateKind::Finalized.as_str())
        .await?
        .ok_or(ResolutionError::MissingLookup("Finalized"))?;

    let meter = Meter::find_by_customer(pool, request.customer_id)
        .await?
        .ok_or(ResolutionError::MeterNotFound)?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE meters SET state_id = $1, updated_at = NOW() WHERE id = $2
        "#,
    )
    .bind(target_state.id)
    .bind(meter.id)
    .execute(&mut *tx)
    .await?;

    if target_kind == MeterStateKind::Active {
        let stamped = sqlx::query(
            r#"
            UPDATE services SET activated_at = NOW() WHERE meter_id = $1
            "#,
        )
        .bind(meter.id)
        .execute(&mut *tx)
        .await?;

        if stamped.rows_affected() == 0 {
            tracing::warn!(meter_id = meter.id, "no service record to stamp activation on");
        }
    }

    sqlx::query(
        r#"
        UPDATE service_change_requests SET request_state_id = $1 WHERE id = $2
        "#,
    )
    .bind(finalized.id)
    .bind(request.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        meter_id = meter.id,
        from = %meter.state_name,
        to = %target_state.name,
        "request resolved"
    );

    ServiceChangeRequest::find_by_id(pool, request.id)
        .await?
        .ok_or(ResolutionError::Database(sqlx::Error::RowNotFound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    // A pool pointing nowhere: any test that reaches the store fails, so
    // passing tests prove the no-mutation branches return before any query.
    fn unreachable_pool() -> PgPool {
        PgPool::connect_lazy("postgres://localhost:1/unreachable").unwrap()
    }

    fn operator() -> Operator {
        Operator {
            id: 9,
            first_name: "Marta".into(),
            last_name: "Gil".into(),
            email: "marta.gil@example.com".into(),
            universal_id: "OP-001".into(),
            department: "Technical".into(),
        }
    }

    fn request(state_name: &str) -> ServiceChangeRequest {
        ServiceChangeRequest {
            id: 1,
            justification: "please reconnect".into(),
            created_at: Utc::now(),
            customer_id: 3,
            customer_nis: 70001,
            meter_state_name: "Suspended".into(),
            request_type_name: "Activation".into(),
            request_state_name: state_name.into(),
        }
    }

    #[tokio::test]
    async fn test_finalized_request_cannot_be_resolved_again() {
        let result =
            resolve_request(&unreachable_pool(), &request("Finalized"), "Active", &operator())
                .await;
        assert!(matches!(result, Err(ResolutionError::AlreadyFinalized(1))));
    }

    #[tokio::test]
    async fn test_unknown_target_state_is_rejected_before_any_mutation() {
        let result =
            resolve_request(&unreachable_pool(), &request("Pending"), "Broken", &operator()).await;
        assert!(
            matches!(result, Err(ResolutionError::UnknownTargetState(name)) if name == "Broken")
        );
    }
}
