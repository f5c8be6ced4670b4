//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use catalog_api_types::{SortDirection, SortField};
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::pagination::PageRequest;
use crate::domain::entities::{ProductRecord, StockMovementRecord};
use crate::domain::ids::ProductId;
use crate::domain::products::{FieldViolation, ProductChanges};

/// Name of the unique constraint guarding product SKUs.
pub const SKU_CONSTRAINT: &str = "products_sku_key";

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Closed set of product filters.
///
/// Text fields are trimmed and dropped when empty by the caller building the
/// filter, so two filters that select the same rows compare equal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQueryFilter {
    /// Case-insensitive substring match on name, description or SKU.
    pub search: Option<String>,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub created_from: Option<OffsetDateTime>,
    pub created_to: Option<OffsetDateTime>,
    pub stock_min: Option<i32>,
    pub stock_max: Option<i32>,
    pub is_active: Option<bool>,
}

impl ProductQueryFilter {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Reject inverted or negative ranges.
    pub fn check(&self) -> Result<(), Vec<FieldViolation>> {
        let mut violations = Vec::new();

        for (field, value) in [("price_min", self.price_min), ("price_max", self.price_max)] {
            if let Some(value) = value
                && (!value.is_finite() || value < 0.0)
            {
                violations.push(FieldViolation::new(field, "must be a non-negative number"));
            }
        }
        for (field, value) in [("stock_min", self.stock_min), ("stock_max", self.stock_max)] {
            if matches!(value, Some(v) if v < 0) {
                violations.push(FieldViolation::new(field, "must not be negative"));
            }
        }
        if let (Some(min), Some(max)) = (self.price_min, self.price_max)
            && min > max
        {
            violations.push(FieldViolation::new(
                "price_max",
                "must be greater than or equal to price_min",
            ));
        }
        if let (Some(min), Some(max)) = (self.stock_min, self.stock_max)
            && min > max
        {
            violations.push(FieldViolation::new(
                "stock_max",
                "must be greater than or equal to stock_min",
            ));
        }
        if let (Some(from), Some(to)) = (self.created_from, self.created_to)
            && from > to
        {
            violations.push(FieldViolation::new(
                "end_date",
                "must not be before start_date",
            ));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Present fields as `(name, value)` pairs in a fixed order.
    pub fn canonical_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(value) = self.search.as_ref() {
            pairs.push(("search", value.clone()));
        }
        if let Some(value) = self.name.as_ref() {
            pairs.push(("name", value.clone()));
        }
        if let Some(value) = self.sku.as_ref() {
            pairs.push(("sku", value.clone()));
        }
        if let Some(value) = self.price_min {
            pairs.push(("price_min", value.to_string()));
        }
        if let Some(value) = self.price_max {
            pairs.push(("price_max", value.to_string()));
        }
        if let Some(value) = self.created_from {
            pairs.push(("created_from", value.unix_timestamp_nanos().to_string()));
        }
        if let Some(value) = self.created_to {
            pairs.push(("created_to", value.unix_timestamp_nanos().to_string()));
        }
        if let Some(value) = self.stock_min {
            pairs.push(("stock_min", value.to_string()));
        }
        if let Some(value) = self.stock_max {
            pairs.push(("stock_max", value.to_string()));
        }
        if let Some(value) = self.is_active {
            pairs.push(("is_active", value.to_string()));
        }
        pairs
    }

    /// In-process evaluation of the filter, used by adapters without a query engine.
    pub fn matches(&self, product: &ProductRecord) -> bool {
        let contains = |haystack: &str, needle: &str| {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        };

        if let Some(search) = self.search.as_deref()
            && !(contains(&product.name, search)
                || contains(&product.description, search)
                || contains(&product.sku, search))
        {
            return false;
        }
        if let Some(name) = self.name.as_deref()
            && !contains(&product.name, name)
        {
            return false;
        }
        if let Some(sku) = self.sku.as_deref()
            && !contains(&product.sku, sku)
        {
            return false;
        }
        if self.price_min.is_some_and(|min| product.price < min)
            || self.price_max.is_some_and(|max| product.price > max)
            || self.stock_min.is_some_and(|min| product.stock < min)
            || self.stock_max.is_some_and(|max| product.stock > max)
            || self.created_from.is_some_and(|from| product.created_at < from)
            || self.created_to.is_some_and(|to| product.created_at > to)
            || self.is_active.is_some_and(|active| product.is_active != active)
        {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ProductSort {
    pub field: SortField,
    pub direction: SortDirection,
}

#[derive(Debug, Clone)]
pub struct CreateProductParams {
    pub sku: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct UpdateStockParams {
    pub id: ProductId,
    pub new_stock: i32,
    pub reason: String,
}

/// Result of a committed stock change.
#[derive(Debug, Clone, PartialEq)]
pub struct StockChange {
    pub product: ProductRecord,
    pub movement: StockMovementRecord,
}

#[async_trait]
pub trait ProductsRepo: Send + Sync {
    /// Persist a new product. The adapter assigns `id`, `created_at` and `updated_at`.
    async fn create_product(&self, params: CreateProductParams)
    -> Result<ProductRecord, RepoError>;

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<ProductRecord>, RepoError>;

    async fn list_products(
        &self,
        filter: &ProductQueryFilter,
        sort: ProductSort,
        page: PageRequest,
    ) -> Result<Vec<ProductRecord>, RepoError>;

    async fn count_products(&self, filter: &ProductQueryFilter) -> Result<u64, RepoError>;

    /// Apply the present fields and refresh `updated_at`. Missing ids yield `NotFound`.
    async fn update_product(
        &self,
        id: &ProductId,
        changes: &ProductChanges,
    ) -> Result<ProductRecord, RepoError>;

    async fn delete_product(&self, id: &ProductId) -> Result<(), RepoError>;

    /// Set the stock level and append the matching movement atomically.
    async fn update_stock(&self, params: UpdateStockParams) -> Result<StockChange, RepoError>;
}

#[async_trait]
pub trait StockMovementsRepo: Send + Sync {
    /// Movements for one product, oldest first.
    async fn list_stock_movements(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<StockMovementRecord>, RepoError>;
}
