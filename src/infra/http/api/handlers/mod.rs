//! API handlers organized by resource type.

mod products;

pub use products::*;
