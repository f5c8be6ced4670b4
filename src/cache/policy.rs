//! Read-through, write-invalidate policy for product snapshots.
//!
//! Reads consult the cache first and fall back to the store; only a successful
//! store read populates the cache. Every committed mutation drops the
//! product's entity key and the whole list namespace. The cache is never
//! allowed to fail a request: read errors degrade to a miss, write and delete
//! errors are logged and counted, and TTL bounds staleness when an
//! invalidation is lost.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::application::pagination::Page;
use crate::domain::entities::ProductRecord;
use crate::domain::ids::ProductId;

use super::client::{CacheClient, CacheError};
use super::config::CacheConfig;
use super::keys::{LIST_PREFIX, entity_key};

const METRIC_CACHE_HIT: &str = "catalog_cache_hit_total";
const METRIC_CACHE_MISS: &str = "catalog_cache_miss_total";
const METRIC_CACHE_ERROR: &str = "catalog_cache_error_total";
const METRIC_CACHE_INVALIDATED: &str = "catalog_cache_invalidated_total";

const KIND_ENTITY: &str = "entity";
const KIND_LIST: &str = "list";

#[derive(Clone)]
pub struct CachePolicy {
    client: Option<Arc<dyn CacheClient>>,
    entity_ttl: Duration,
    list_ttl: Duration,
}

impl CachePolicy {
    pub fn new(client: Arc<dyn CacheClient>, config: &CacheConfig) -> Self {
        Self {
            client: Some(client),
            entity_ttl: config.entity_ttl,
            list_ttl: config.list_ttl,
        }
    }

    /// Policy with no backing cache: every read misses, every invalidation succeeds.
    pub fn disabled() -> Self {
        let defaults = CacheConfig::default();
        Self {
            client: None,
            entity_ttl: defaults.entity_ttl,
            list_ttl: defaults.list_ttl,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub async fn get_entity(&self, id: &ProductId) -> Option<ProductRecord> {
        self.read(KIND_ENTITY, &entity_key(id)).await
    }

    pub async fn set_entity(&self, product: &ProductRecord) -> Result<(), CacheError> {
        let key = entity_key(&product.id);
        self.write(KIND_ENTITY, &key, product, self.entity_ttl)
            .await
    }

    pub async fn invalidate_entity(&self, id: &ProductId) -> Result<(), CacheError> {
        let Some(client) = self.client.as_ref() else {
            return Ok(());
        };
        let key = entity_key(id);
        match client.delete(&key).await {
            Ok(()) => {
                counter!(METRIC_CACHE_INVALIDATED, "kind" => KIND_ENTITY).increment(1);
                Ok(())
            }
            Err(err) => {
                record_failure("invalidate_entity", &key, &err);
                Err(err)
            }
        }
    }

    pub async fn get_list(&self, key: &str) -> Option<Page<ProductRecord>> {
        self.read(KIND_LIST, key).await
    }

    pub async fn set_list(&self, key: &str, page: &Page<ProductRecord>) -> Result<(), CacheError> {
        self.write(KIND_LIST, key, page, self.list_ttl).await
    }

    /// Drop every cached listing page, returning how many entries were removed.
    pub async fn invalidate_all_lists(&self) -> Result<u64, CacheError> {
        let Some(client) = self.client.as_ref() else {
            return Ok(0);
        };
        match client.delete_by_prefix(LIST_PREFIX).await {
            Ok(removed) => {
                counter!(METRIC_CACHE_INVALIDATED, "kind" => KIND_LIST).increment(removed);
                Ok(removed)
            }
            Err(err) => {
                record_failure("invalidate_all_lists", LIST_PREFIX, &err);
                Err(err)
            }
        }
    }

    /// Drop everything a mutation of `id` can make stale.
    ///
    /// Both deletions are always attempted; the first failure is returned.
    pub async fn invalidate_related(&self, id: &ProductId) -> Result<(), CacheError> {
        let entity = self.invalidate_entity(id).await;
        let lists = self.invalidate_all_lists().await;
        entity?;
        lists.map(|_| ())
    }

    /// Serve `id` from the cache, loading and populating on a miss.
    ///
    /// Absent products and loader errors leave the cache untouched.
    pub async fn entity_or_load<F, Fut, E>(
        &self,
        id: &ProductId,
        load: F,
    ) -> Result<Option<ProductRecord>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<ProductRecord>, E>>,
    {
        if let Some(hit) = self.get_entity(id).await {
            return Ok(Some(hit));
        }

        let loaded = load().await?;
        if let Some(product) = loaded.as_ref() {
            let _ = self.set_entity(product).await;
        }
        Ok(loaded)
    }

    /// Serve the listing page at `key` from the cache, loading and populating on a miss.
    pub async fn list_or_load<F, Fut, E>(&self, key: &str, load: F) -> Result<Page<ProductRecord>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Page<ProductRecord>, E>>,
    {
        if let Some(hit) = self.get_list(key).await {
            return Ok(hit);
        }

        let page = load().await?;
        let _ = self.set_list(key, &page).await;
        Ok(page)
    }

    async fn read<T: DeserializeOwned>(&self, kind: &'static str, key: &str) -> Option<T> {
        let client = self.client.as_ref()?;
        let bytes = match client.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                counter!(METRIC_CACHE_MISS, "kind" => kind).increment(1);
                return None;
            }
            Err(err) => {
                record_failure("get", key, &err);
                counter!(METRIC_CACHE_MISS, "kind" => kind).increment(1);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                counter!(METRIC_CACHE_HIT, "kind" => kind).increment(1);
                debug!(key, kind, "Cache hit");
                Some(value)
            }
            Err(err) => {
                record_failure("decode", key, &CacheError::from(err));
                counter!(METRIC_CACHE_MISS, "kind" => kind).increment(1);
                None
            }
        }
    }

    async fn write<T: Serialize>(
        &self,
        kind: &'static str,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let Some(client) = self.client.as_ref() else {
            return Ok(());
        };
        let payload = match serde_json::to_vec(value) {
            Ok(payload) => Bytes::from(payload),
            Err(err) => {
                let err = CacheError::from(err);
                record_failure("encode", key, &err);
                return Err(err);
            }
        };
        client.set(key, payload, ttl).await.map_err(|err| {
            record_failure("set", key, &err);
            err
        })?;
        debug!(key, kind, ttl_secs = ttl.as_secs(), "Cache populated");
        Ok(())
    }
}

fn record_failure(op: &'static str, key: &str, err: &CacheError) {
    counter!(METRIC_CACHE_ERROR, "op" => op).increment(1);
    warn!(
        target = "catalog::cache",
        op,
        key,
        error = %err,
        "Cache operation failed; continuing without cache"
    );
}
