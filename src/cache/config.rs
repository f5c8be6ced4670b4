//! Cache configuration.
//!
//! Controls whether reads go through the cache, which backend holds entries
//! and how long entity and list snapshots may be served before they expire.

use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

// Default values for cache configuration
const DEFAULT_ENTITY_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_LIST_TTL_SECS: u64 = 5 * 60;
const DEFAULT_MEMORY_CAPACITY: usize = 10_000;
pub(crate) const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    /// In-process LRU with per-entry expiry.
    #[default]
    Memory,
    Redis,
}

impl CacheBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheBackend::Memory => "memory",
            CacheBackend::Redis => "redis",
        }
    }
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            other => Err(format!("unknown cache backend `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// When false, reads always go to the store and invalidation is a no-op.
    pub enabled: bool,
    pub backend: CacheBackend,
    pub redis_url: String,
    /// Lifetime of `product:{id}` entries.
    pub entity_ttl: Duration,
    /// Lifetime of `products:list:*` entries.
    pub list_ttl: Duration,
    /// Maximum entries held by the memory backend.
    pub memory_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::Memory,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            entity_ttl: Duration::from_secs(DEFAULT_ENTITY_TTL_SECS),
            list_ttl: Duration::from_secs(DEFAULT_LIST_TTL_SECS),
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
        }
    }
}

impl CacheConfig {
    /// Returns the memory capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn memory_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.memory_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.backend, CacheBackend::Memory);
        assert_eq!(config.entity_ttl, Duration::from_secs(86_400));
        assert_eq!(config.list_ttl, Duration::from_secs(300));
        assert_eq!(config.memory_capacity, 10_000);
    }

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("Redis".parse::<CacheBackend>(), Ok(CacheBackend::Redis));
        assert_eq!(" memory ".parse::<CacheBackend>(), Ok(CacheBackend::Memory));
        assert!("memcached".parse::<CacheBackend>().is_err());
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            memory_capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.memory_capacity_non_zero().get(), 1);
    }
}
