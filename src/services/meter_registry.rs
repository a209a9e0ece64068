use chrono::{Datelike, NaiveDate};
use sqlx::PgPool;

use crate::models::{
    customer::Customer,
    meter::{CreateMeterData, Meter, MeterState, MeterStateKind},
    service::ServiceAccount,
};

#[derive(thiserror::Error, Debug)]
pub enum MeterRegistrationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("Installation year {installed} precedes manufacture year {manufactured}")]
    InstalledBeforeManufacture { installed: i32, manufactured: i32 },

    #[error("No customer found with NIS {0}")]
    CustomerNotFound(i32),

    #[error("Customer with NIS {0} already has a meter")]
    CustomerAlreadyHasMeter(i32),

    #[error("Lookup table is missing the '{0}' row")]
    MissingLookup(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct RegisterMeterRequest {
    pub meter_type: String,
    pub brand: String,
    pub location: String,
    pub installed_on: NaiveDate,
    pub manufacture_year: i32,
    pub customer_nis: i32,
}

/// A meter cannot be installed before it was built.
pub fn install_year_is_consistent(installed_on: NaiveDate, manufacture_year: i32) -> bool {
    installed_on.year() >= manufacture_year
}

/// Registers a new meter for the customer identified by NIS.
///
/// The meter starts Active with a 0.0 kWh reading, and a service record
/// linking customer and meter is created alongside it. Fails if any text
/// field is blank, the installation date precedes the manufacture year, the
/// customer does not exist, or the customer already owns a meter.
#[tracing::instrument(skip(pool, request), fields(customer_nis = request.customer_nis))]
pub async fn register_meter(
    pool: &PgPool,
    request: RegisterMeterRequest,
) -> Result<Meter, MeterRegistrationError> {
    for (field, value) in [
        ("Type", &request.meter_type),
        ("Brand", &request.brand),
        ("Location", &request.location),
    ] {
        if value.trim().is_empty() {
            return Err(MeterRegistrationError::EmptyField(field));
        }
    }

    if !install_year_is_consistent(request.installed_on, request.manufacture_year) {
        return Err(MeterRegistrationError::InstalledBeforeManufacture {
            installed: request.installed_on.year(),
            manufactured: request.manufacture_year,
        });
    }

    let customer = Customer::find_by_nis(pool, request.customer_nis)
        .await?
        .ok_or(MeterRegistrationError::CustomerNotFound(request.customer_nis))?;

    if Meter::find_by_customer(pool, customer.id).await?.is_some() {
        return Err(MeterRegistrationError::CustomerAlreadyHasMeter(customer.nis));
    }

    let active = MeterState::find_by_name(pool, MeterStateKind::Active.as_str())
        .await?
        .ok_or(MeterRegistrationError::MissingLookup("Active"))?;

    let meter = Meter::create(
        pool,
        CreateMeterData {
            meter_type: request.meter_type.trim().to_string(),
            brand: request.brand.trim().to_string(),
            location: request.location.trim().to_string(),
            installed_on: request.installed_on,
            manufacture_year: request.manufacture_year,
            state_id: active.id,
            customer_id: customer.id,
        },
    )
    .await?;

    ServiceAccount::create(pool, customer.id, meter.id).await?;

    tracing::info!(meter_id = meter.id, "meter registered");

    Ok(meter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_install_year_may_equal_manufacture_year() {
        assert!(install_year_is_consistent(date(2020, 1, 1), 2020));
        assert!(install_year_is_consistent(date(2021, 6, 30), 2020));
    }

    #[test]
    fn test_install_year_before_manufacture_year_fails() {
        assert!(!install_year_is_consistent(date(2019, 12, 31), 2020));
    }
}
