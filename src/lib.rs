// Library exports for testing and modular access

pub mod config;
pub mod console;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
