//! Product cache.
//!
//! - [`CacheClient`] is the storage seam, implemented in-process by
//!   [`MemoryCache`] and remotely by [`RedisCache`].
//! - [`CachePolicy`] decides what gets cached, for how long and what a
//!   mutation invalidates. Services only talk to the policy.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! backend = "memory"   # or "redis"
//! redis_url = "redis://127.0.0.1:6379"
//! entity_ttl_seconds = 86400
//! list_ttl_seconds = 300
//! memory_capacity = 10000
//! ```

mod client;
mod config;
pub mod keys;
mod memory;
mod policy;
mod redis_store;

pub use client::{CacheClient, CacheError};
pub use config::{CacheBackend, CacheConfig};
pub use memory::MemoryCache;
pub use policy::CachePolicy;
pub use redis_store::RedisCache;
