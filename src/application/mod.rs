//! Use cases and the ports they depend on.

pub mod error;
pub mod pagination;
pub mod products;
pub mod repos;
