// storefront/src/services/mod.rs

pub mod pricing;

pub use pricing::{PricingError, PricingPolicy, Quote};
