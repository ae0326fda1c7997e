//! Domain model: catalog, checkout, orders and their lifecycle.
pub mod aggregates;
pub mod events;
pub mod lifecycle;
pub mod value_objects;

pub use lifecycle::{OrderStatus, PaymentStatus, TransitionError};
