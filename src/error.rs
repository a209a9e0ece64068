use thiserror::Error;

use crate::services::{
    auth::AuthError, billing::PaymentError, meter_registry::MeterRegistrationError,
    request_intake::IntakeError, request_resolution::ResolutionError,
};

/// Top-level error for the console layer. Each use case keeps its own error
/// enum; this type exists so the interactive loop can report any of them and
/// keep running.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    MeterRegistration(#[from] MeterRegistrationError),

    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Input error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
