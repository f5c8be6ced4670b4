#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response, header};
use bytes::Bytes;
use catalog::application::pagination::PageRequest;
use catalog::application::products::{ProductService, ProductServiceSettings};
use catalog::application::repos::{
    CreateProductParams, ProductQueryFilter, ProductSort, ProductsRepo, RepoError, SKU_CONSTRAINT,
    StockChange, StockMovementsRepo, UpdateStockParams,
};
use catalog::cache::{CacheClient, CacheConfig, CacheError, CachePolicy, MemoryCache};
use catalog::domain::entities::{ProductRecord, StockMovementRecord};
use catalog::domain::ids::ProductId;
use catalog::domain::products::ProductChanges;
use catalog::infra::http::{ApiState, HealthProbe, build_router};
use catalog_api_types::{SortDirection, SortField};
use http_body_util::BodyExt;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tower::ServiceExt;

/// In-memory store standing in for Postgres.
#[derive(Default)]
pub struct InMemoryProducts {
    products: Mutex<Vec<ProductRecord>>,
    movements: Mutex<Vec<StockMovementRecord>>,
    pub find_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub count_calls: AtomicUsize,
    pub create_attempts: AtomicUsize,
    failing: AtomicBool,
    failing_writes: AtomicBool,
    forced_sku_collisions: AtomicUsize,
}

impl InMemoryProducts {
    pub fn store_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
            + self.list_calls.load(Ordering::SeqCst)
            + self.count_calls.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, failing: bool) {
        self.failing_writes.store(failing, Ordering::SeqCst);
    }

    /// Report the next `count` inserts as SKU collisions; `usize::MAX` never stops.
    pub fn collide_skus(&self, count: usize) {
        self.forced_sku_collisions.store(count, Ordering::SeqCst);
    }

    pub async fn stored(&self, id: &str) -> Option<ProductRecord> {
        self.products
            .lock()
            .await
            .iter()
            .find(|product| product.id.as_str() == id)
            .cloned()
    }

    fn check_available(&self) -> Result<(), RepoError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(RepoError::Timeout)
        } else {
            Ok(())
        }
    }

    fn check_writable(&self) -> Result<(), RepoError> {
        if self.failing_writes.load(Ordering::SeqCst) {
            Err(RepoError::Persistence("write rejected".to_string()))
        } else {
            Ok(())
        }
    }

    fn take_forced_collision(&self) -> bool {
        self.forced_sku_collisions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                0 => None,
                usize::MAX => Some(usize::MAX),
                left => Some(left - 1),
            })
            .is_ok()
    }
}

fn compare(a: &ProductRecord, b: &ProductRecord, sort: ProductSort) -> std::cmp::Ordering {
    let ordering = match sort.field {
        SortField::Name => a.name.cmp(&b.name),
        SortField::Price => a.price.total_cmp(&b.price),
        SortField::Stock => a.stock.cmp(&b.stock),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    };
    let ordering = ordering.then_with(|| a.id.cmp(&b.id));
    match sort.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

#[async_trait]
impl ProductsRepo for InMemoryProducts {
    async fn create_product(
        &self,
        params: CreateProductParams,
    ) -> Result<ProductRecord, RepoError> {
        self.create_attempts.fetch_add(1, Ordering::SeqCst);
        let mut products = self.products.lock().await;
        if self.take_forced_collision() || products.iter().any(|product| product.sku == params.sku)
        {
            return Err(RepoError::Duplicate {
                constraint: SKU_CONSTRAINT.to_string(),
            });
        }
        let now = OffsetDateTime::now_utc();
        let record = ProductRecord {
            id: ProductId::generate_at(now),
            name: params.name,
            description: params.description,
            price: params.price,
            stock: params.stock,
            is_active: params.is_active,
            sku: params.sku,
            created_at: now,
            updated_at: now,
        };
        products.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<ProductRecord>, RepoError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self
            .products
            .lock()
            .await
            .iter()
            .find(|product| &product.id == id)
            .cloned())
    }

    async fn list_products(
        &self,
        filter: &ProductQueryFilter,
        sort: ProductSort,
        page: PageRequest,
    ) -> Result<Vec<ProductRecord>, RepoError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let mut matching: Vec<_> = self
            .products
            .lock()
            .await
            .iter()
            .filter(|product| filter.matches(product))
            .cloned()
            .collect();
        matching.sort_by(|a, b| compare(a, b, sort));
        Ok(matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect())
    }

    async fn count_products(&self, filter: &ProductQueryFilter) -> Result<u64, RepoError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let products = self.products.lock().await;
        Ok(products.iter().filter(|product| filter.matches(product)).count() as u64)
    }

    async fn update_product(
        &self,
        id: &ProductId,
        changes: &ProductChanges,
    ) -> Result<ProductRecord, RepoError> {
        self.check_writable()?;
        let mut products = self.products.lock().await;
        let product = products
            .iter_mut()
            .find(|product| &product.id == id)
            .ok_or(RepoError::NotFound)?;
        if let Some(name) = changes.name.as_ref() {
            product.name = name.clone();
        }
        if let Some(description) = changes.description.as_ref() {
            product.description = description.clone();
        }
        if let Some(price) = changes.price {
            product.price = price;
        }
        if let Some(stock) = changes.stock {
            product.stock = stock;
        }
        if let Some(is_active) = changes.is_active {
            product.is_active = is_active;
        }
        product.updated_at = OffsetDateTime::now_utc();
        Ok(product.clone())
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), RepoError> {
        self.check_writable()?;
        let mut products = self.products.lock().await;
        let before = products.len();
        products.retain(|product| &product.id != id);
        if products.len() == before {
            return Err(RepoError::NotFound);
        }
        self.movements
            .lock()
            .await
            .retain(|movement| &movement.product_id != id);
        Ok(())
    }

    async fn update_stock(&self, params: UpdateStockParams) -> Result<StockChange, RepoError> {
        self.check_writable()?;
        let mut products = self.products.lock().await;
        let product = products
            .iter_mut()
            .find(|product| product.id == params.id)
            .ok_or(RepoError::NotFound)?;
        let now = OffsetDateTime::now_utc();
        let movement = StockMovementRecord::between(
            product.id.clone(),
            product.stock,
            params.new_stock,
            params.reason,
            now,
        );
        product.stock = params.new_stock;
        product.updated_at = now;
        let change = StockChange {
            product: product.clone(),
            movement: movement.clone(),
        };
        self.movements.lock().await.push(movement);
        Ok(change)
    }
}

#[async_trait]
impl StockMovementsRepo for InMemoryProducts {
    async fn list_stock_movements(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<StockMovementRecord>, RepoError> {
        self.check_available()?;
        Ok(self
            .movements
            .lock()
            .await
            .iter()
            .filter(|movement| &movement.product_id == product_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl HealthProbe for InMemoryProducts {
    async fn check(&self) -> Result<(), RepoError> {
        self.check_available()
    }
}

/// Cache backend that is always unreachable.
#[derive(Default)]
pub struct UnreachableCache {
    pub calls: AtomicUsize,
}

#[async_trait]
impl CacheClient for UnreachableCache {
    async fn get(&self, _key: &str) -> Result<Option<Bytes>, CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::backend("connection refused"))
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::backend("connection refused"))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::backend("connection refused"))
    }

    async fn delete_by_prefix(&self, _prefix: &str) -> Result<u64, CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::backend("connection refused"))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryProducts>,
    pub service: Arc<ProductService>,
}

impl TestApp {
    pub fn with_client(client: Arc<dyn CacheClient>) -> Self {
        let policy = CachePolicy::new(client, &CacheConfig::default());
        Self::with_policy(policy)
    }

    pub fn with_policy(policy: CachePolicy) -> Self {
        let store = Arc::new(InMemoryProducts::default());
        let service = Arc::new(ProductService::new(
            store.clone(),
            store.clone(),
            policy,
            ProductServiceSettings::default(),
        ));
        let state = ApiState {
            products: service.clone(),
            health: store.clone(),
        };
        Self {
            router: build_router(state),
            store,
            service,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (u16, Value) {
        let response = self.send(method, uri, body).await;
        let status = response.status().as_u16();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should collect")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response should be json")
        };
        (status, json)
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        self.router
            .clone()
            .oneshot(builder.body(body).expect("request should build"))
            .await
            .expect("router should respond")
    }
}

pub fn memory_client() -> Arc<MemoryCache> {
    Arc::new(MemoryCache::new(&CacheConfig::default()))
}
