pub mod customer;
pub mod invoice;
pub mod meter;
pub mod operator;
pub mod payment;
pub mod request;
pub mod service;
