//! Product catalog service: CRUD, inventory movements and search over
//! Postgres, fronted by a read-through cache that mutations invalidate.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
