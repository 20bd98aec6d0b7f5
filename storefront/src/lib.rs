// storefront/src/lib.rs

//! Storefront order service: atomic order placement, order history and
//! cart pricing behind an actix-web JSON API.

pub mod config;
pub mod errors;
pub mod models;
pub mod orders;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod store;
pub mod web;

pub use config::AppConfig;
pub use errors::AppError;
pub use state::AppState;
