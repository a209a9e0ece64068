pub mod auth;
pub mod billing;
pub mod meter_registry;
pub mod request_intake;
pub mod request_resolution;
