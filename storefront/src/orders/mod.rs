// storefront/src/orders/mod.rs

//! Order placement and order history.

pub mod error;
pub mod manager;
pub mod validation;

pub use error::{OrderError, OrderErrorKind, WriteStage};
pub use manager::OrderManager;
pub use validation::CheckoutPolicy;
