use catalog_api_types::{SortDirection, SortField};
use serde::Deserialize;
use thiserror::Error;
use time::{Date, OffsetDateTime, Time, format_description::well_known::Rfc3339, macros::format_description};

use crate::application::pagination::{PageLimits, PageRequest};
use crate::application::repos::{ProductQueryFilter, ProductSort, RepoError};
use crate::domain::error::DomainError;
use crate::domain::ids::ProductId;
use crate::domain::products::FieldViolation;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("product not found")]
    NotFound,
    #[error(transparent)]
    InvalidId(DomainError),
    #[error("validation failed")]
    Validation(Vec<FieldViolation>),
    #[error("could not allocate a unique sku after {attempts} attempts")]
    SkuExhausted { attempts: usize },
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for ProductError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => ProductError::NotFound,
            other => ProductError::Repo(other),
        }
    }
}

impl From<Vec<FieldViolation>> for ProductError {
    fn from(violations: Vec<FieldViolation>) -> Self {
        ProductError::Validation(violations)
    }
}

impl From<FieldViolation> for ProductError {
    fn from(violation: FieldViolation) -> Self {
        ProductError::Validation(vec![violation])
    }
}

pub(crate) fn parse_id(raw: &str) -> Result<ProductId, ProductError> {
    ProductId::parse(raw.trim()).map_err(ProductError::InvalidId)
}

#[derive(Debug, Clone)]
pub struct CreateProductCommand {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct ReplaceProductCommand {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PatchProductCommand {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct UpdateStockCommand {
    pub stock: i64,
    pub reason: String,
}

/// Unvalidated listing parameters as they arrive from a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListProductsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
    pub search: Option<String>,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    /// RFC 3339 timestamp or `YYYY-MM-DD` (start of that day, UTC).
    pub start_date: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD` (end of that day, UTC).
    pub end_date: Option<String>,
    pub stock_min: Option<i64>,
    pub stock_max: Option<i64>,
    pub is_active: Option<bool>,
}

/// Free-text and price-range search.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchProductsQuery {
    pub q: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

impl From<SearchProductsQuery> for ListProductsQuery {
    fn from(query: SearchProductsQuery) -> Self {
        Self {
            page: query.page,
            page_size: query.page_size,
            sort_by: query.sort_by,
            sort_dir: query.sort_dir,
            search: query.q,
            price_min: query.price_min,
            price_max: query.price_max,
            ..Default::default()
        }
    }
}

/// Fully validated listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPlan {
    pub filter: ProductQueryFilter,
    pub sort: ProductSort,
    pub page: PageRequest,
}

impl ListProductsQuery {
    pub fn into_plan(self, limits: PageLimits) -> Result<ListingPlan, Vec<FieldViolation>> {
        let mut violations = Vec::new();

        let page = match PageRequest::new(self.page, self.page_size, limits) {
            Ok(page) => Some(page),
            Err(err) => {
                violations.push(FieldViolation::new(err.field(), err.to_string()));
                None
            }
        };

        let field = match non_empty(self.sort_by).map(|raw| raw.parse::<SortField>()) {
            None => SortField::default(),
            Some(Ok(field)) => field,
            Some(Err(err)) => {
                violations.push(FieldViolation::new(
                    "sort_by",
                    format!("{err}; expected one of name, price, stock, created_at, updated_at"),
                ));
                SortField::default()
            }
        };
        let direction = match non_empty(self.sort_dir).map(|raw| raw.to_ascii_lowercase()) {
            None => SortDirection::default(),
            Some(raw) => match raw.parse::<SortDirection>() {
                Ok(direction) => direction,
                Err(err) => {
                    violations.push(FieldViolation::new(
                        "sort_dir",
                        format!("{err}; expected asc or desc"),
                    ));
                    SortDirection::default()
                }
            },
        };

        let created_from = parse_bound("start_date", self.start_date, DayEdge::Start)
            .unwrap_or_else(|violation| {
                violations.push(violation);
                None
            });
        let created_to = parse_bound("end_date", self.end_date, DayEdge::End)
            .unwrap_or_else(|violation| {
                violations.push(violation);
                None
            });
        let stock_min = narrow_stock("stock_min", self.stock_min).unwrap_or_else(|violation| {
            violations.push(violation);
            None
        });
        let stock_max = narrow_stock("stock_max", self.stock_max).unwrap_or_else(|violation| {
            violations.push(violation);
            None
        });

        let filter = ProductQueryFilter {
            search: non_empty(self.search),
            name: non_empty(self.name),
            sku: non_empty(self.sku),
            price_min: self.price_min,
            price_max: self.price_max,
            created_from,
            created_to,
            stock_min,
            stock_max,
            is_active: self.is_active,
        };
        if let Err(mut range_violations) = filter.check() {
            violations.append(&mut range_violations);
        }

        match page {
            Some(page) if violations.is_empty() => Ok(ListingPlan {
                filter,
                sort: ProductSort { field, direction },
                page,
            }),
            _ => Err(violations),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

#[derive(Clone, Copy)]
enum DayEdge {
    Start,
    End,
}

fn parse_bound(
    field: &'static str,
    raw: Option<String>,
    edge: DayEdge,
) -> Result<Option<OffsetDateTime>, FieldViolation> {
    let Some(raw) = non_empty(raw) else {
        return Ok(None);
    };
    if let Ok(instant) = OffsetDateTime::parse(&raw, &Rfc3339) {
        return Ok(Some(instant));
    }
    let day = Date::parse(&raw, format_description!("[year]-[month]-[day]")).map_err(|_| {
        FieldViolation::new(field, "must be an RFC 3339 timestamp or a YYYY-MM-DD date")
    })?;
    let time = match edge {
        DayEdge::Start => Time::MIDNIGHT,
        DayEdge::End => Time::from_hms_nano(23, 59, 59, 999_999_999)
            .map_err(|_| FieldViolation::new(field, "could not compute end of day"))?,
    };
    Ok(Some(day.with_time(time).assume_utc()))
}

fn narrow_stock(field: &'static str, value: Option<i64>) -> Result<Option<i32>, FieldViolation> {
    value
        .map(|v| i32::try_from(v).map_err(|_| FieldViolation::new(field, "is out of range")))
        .transpose()
}
