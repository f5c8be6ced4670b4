//! In-process cache backend.
//!
//! Entries live in a bounded LRU. Expiry is checked lazily on read and on
//! prefix scans, so an expired entry occupies a slot until it is touched or
//! evicted.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use metrics::counter;
use tokio::time::Instant;
use tracing::warn;

use super::client::{CacheClient, CacheError};
use super::config::CacheConfig;

const METRIC_MEMORY_EVICT: &str = "catalog_cache_memory_evict_total";

#[derive(Debug, Clone)]
struct Entry {
    value: Bytes,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

pub struct MemoryCache {
    entries: Mutex<LruCache<String, Entry>>,
}

impl MemoryCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(config.memory_capacity_non_zero())),
        }
    }

    pub fn len(&self) -> usize {
        self.entries("len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A panic while the lock was held can at worst leave a stale entry
    /// behind, which TTL bounds, so a poisoned lock is taken over.
    fn entries(&self, op: &'static str) -> MutexGuard<'_, LruCache<String, Entry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!(
                target = "catalog::cache",
                op,
                backend = "memory",
                "Recovered poisoned cache lock"
            );
            poisoned.into_inner()
        })
    }
}

#[async_trait]
impl CacheClient for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries("get");
        let found = entries
            .get(key)
            .map(|entry| (entry.is_live(now), entry.value.clone()));
        match found {
            Some((true, value)) => Ok(Some(value)),
            Some((false, _)) => {
                entries.pop(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        let displaced = self.entries("set").push(key.to_string(), entry);
        if let Some((displaced_key, _)) = displaced
            && displaced_key != key
        {
            counter!(METRIC_MEMORY_EVICT).increment(1);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries("delete").pop(key);
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries("delete_by_prefix");
        let doomed: Vec<(String, bool)> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, entry)| (key.clone(), entry.is_live(now)))
            .collect();

        let mut removed = 0_u64;
        for (key, live) in doomed {
            entries.pop(&key);
            if live {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with_capacity(capacity: usize) -> MemoryCache {
        MemoryCache::new(&CacheConfig {
            memory_capacity: capacity,
            ..Default::default()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = cache_with_capacity(8);
        cache
            .set("product:a", Bytes::from_static(b"a"), Duration::from_secs(60))
            .await
            .expect("set");

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(
            cache.get("product:a").await.expect("get"),
            Some(Bytes::from_static(b"a"))
        );

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("product:a").await.expect("get"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn set_overwrites_existing_value() {
        let cache = cache_with_capacity(8);
        let ttl = Duration::from_secs(60);
        cache.set("k", Bytes::from_static(b"1"), ttl).await.expect("set");
        cache.set("k", Bytes::from_static(b"2"), ttl).await.expect("set");
        assert_eq!(
            cache.get("k").await.expect("get"),
            Some(Bytes::from_static(b"2"))
        );
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn prefix_delete_removes_only_matching_keys() {
        let cache = cache_with_capacity(16);
        let ttl = Duration::from_secs(60);
        for key in [
            "products:list:page=1",
            "products:list:page=2",
            "product:abc",
            "products:listing",
        ] {
            cache.set(key, Bytes::from_static(b"x"), ttl).await.expect("set");
        }

        let removed = cache.delete_by_prefix("products:list:").await.expect("delete");
        assert_eq!(removed, 2);
        assert!(cache.get("product:abc").await.expect("get").is_some());
        assert!(cache.get("products:listing").await.expect("get").is_some());
        assert!(cache.get("products:list:page=1").await.expect("get").is_none());

        let again = cache.delete_by_prefix("products:list:").await.expect("delete");
        assert_eq!(again, 0);
    }

    #[tokio::test]
    async fn delete_of_absent_key_is_ok() {
        let cache = cache_with_capacity(4);
        cache.delete("missing").await.expect("idempotent delete");
        cache.delete("missing").await.expect("idempotent delete");
    }

    #[tokio::test]
    async fn poisoned_lock_keeps_serving_entries() {
        let cache = std::sync::Arc::new(cache_with_capacity(4));
        let ttl = Duration::from_secs(60);
        cache.set("product:a", Bytes::from_static(b"a"), ttl).await.expect("set");

        let holder = cache.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.entries.lock().expect("first lock");
            panic!("poison the cache lock");
        })
        .join();
        assert!(cache.entries.is_poisoned());

        assert_eq!(
            cache.get("product:a").await.expect("get"),
            Some(Bytes::from_static(b"a"))
        );
        cache.set("product:b", Bytes::from_static(b"b"), ttl).await.expect("set");
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn least_recently_used_entry_is_evicted() {
        let cache = cache_with_capacity(2);
        let ttl = Duration::from_secs(60);
        cache.set("a", Bytes::from_static(b"a"), ttl).await.expect("set");
        cache.set("b", Bytes::from_static(b"b"), ttl).await.expect("set");
        assert!(cache.get("a").await.expect("get").is_some());
        cache.set("c", Bytes::from_static(b"c"), ttl).await.expect("set");

        assert!(cache.get("b").await.expect("get").is_none());
        assert!(cache.get("a").await.expect("get").is_some());
        assert!(cache.get("c").await.expect("get").is_some());
    }
}
