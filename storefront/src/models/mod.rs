// storefront/src/models/mod.rs

//! Data carried through checkout and read back from the order tables.

pub mod money;
pub mod order;
pub mod order_item;

pub use money::Money;
pub use order::{NewOrder, Order, OrderDetails, OrderId, Placement, ShippingDetails};
pub use order_item::{CartLine, OrderItem};
