// storefront/src/web/handlers/mod.rs

pub mod health_handlers;
pub mod order_handlers;
