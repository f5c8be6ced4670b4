use async_trait::async_trait;
use catalog_api_types::{SortDirection, SortField};
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::application::pagination::PageRequest;
use crate::application::repos::{
    CreateProductParams, ProductQueryFilter, ProductSort, ProductsRepo, RepoError, StockChange,
    UpdateStockParams,
};
use crate::domain::entities::{ProductRecord, StockMovementRecord};
use crate::domain::ids::ProductId;
use crate::domain::products::ProductChanges;

use super::PostgresRepositories;
use super::stock_movements::StockMovementRow;
use super::util::map_sqlx_error;

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, stock, is_active, sku, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: String,
    price: f64,
    stock: i32,
    is_active: bool,
    sku: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<ProductRow> for ProductRecord {
    type Error = RepoError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let id = ProductId::parse(&row.id).map_err(|err| RepoError::Integrity {
            message: format!("stored product id `{}` is malformed: {err}", row.id),
        })?;
        Ok(Self {
            id,
            name: row.name,
            description: row.description,
            price: row.price,
            stock: row.stock,
            is_active: row.is_active,
            sku: row.sku,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl PostgresRepositories {
    fn apply_product_filter<'q>(qb: &mut QueryBuilder<'q, Postgres>, filter: &'q ProductQueryFilter) {
        if let Some(search) = filter.search.as_ref() {
            let pattern = like_pattern(search);
            qb.push(" AND (p.name ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR p.description ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR p.sku ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }
        if let Some(name) = filter.name.as_ref() {
            qb.push(" AND p.name ILIKE ");
            qb.push_bind(like_pattern(name));
        }
        if let Some(sku) = filter.sku.as_ref() {
            qb.push(" AND p.sku ILIKE ");
            qb.push_bind(like_pattern(sku));
        }
        if let Some(min) = filter.price_min {
            qb.push(" AND p.price >= ");
            qb.push_bind(min);
        }
        if let Some(max) = filter.price_max {
            qb.push(" AND p.price <= ");
            qb.push_bind(max);
        }
        if let Some(from) = filter.created_from {
            qb.push(" AND p.created_at >= ");
            qb.push_bind(from);
        }
        if let Some(to) = filter.created_to {
            qb.push(" AND p.created_at <= ");
            qb.push_bind(to);
        }
        if let Some(min) = filter.stock_min {
            qb.push(" AND p.stock >= ");
            qb.push_bind(min);
        }
        if let Some(max) = filter.stock_max {
            qb.push(" AND p.stock <= ");
            qb.push_bind(max);
        }
        if let Some(active) = filter.is_active {
            qb.push(" AND p.is_active = ");
            qb.push_bind(active);
        }
    }

    fn push_order_by(qb: &mut QueryBuilder<'_, Postgres>, sort: ProductSort) {
        let column = match sort.field {
            SortField::Name => "p.name",
            SortField::Price => "p.price",
            SortField::Stock => "p.stock",
            SortField::CreatedAt => "p.created_at",
            SortField::UpdatedAt => "p.updated_at",
        };
        let direction = match sort.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        qb.push(format!(" ORDER BY {column} {direction}, p.id {direction}"));
    }
}

/// Substring pattern for `ILIKE`, with the pattern metacharacters escaped.
fn like_pattern(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len() + 2);
    escaped.push('%');
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl ProductsRepo for PostgresRepositories {
    async fn create_product(
        &self,
        params: CreateProductParams,
    ) -> Result<ProductRecord, RepoError> {
        let id = ProductId::generate();
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products (id, name, description, price, stock, is_active, sku) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(&params.name)
        .bind(&params.description)
        .bind(params.price)
        .bind(params.stock)
        .bind(params.is_active)
        .bind(&params.sku)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        ProductRecord::try_from(row)
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<ProductRecord>, RepoError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(ProductRecord::try_from).transpose()
    }

    async fn list_products(
        &self,
        filter: &ProductQueryFilter,
        sort: ProductSort,
        page: PageRequest,
    ) -> Result<Vec<ProductRecord>, RepoError> {
        let mut qb = QueryBuilder::new(
            "SELECT p.id, p.name, p.description, p.price, p.stock, p.is_active, p.sku, \
                    p.created_at, p.updated_at \
             FROM products p \
             WHERE 1=1 ",
        );
        Self::apply_product_filter(&mut qb, filter);
        Self::push_order_by(&mut qb, sort);
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(page.limit()));
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

        let rows = qb
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(ProductRecord::try_from).collect()
    }

    async fn count_products(&self, filter: &ProductQueryFilter) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM products p WHERE 1=1 ");
        Self::apply_product_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }

    async fn update_product(
        &self,
        id: &ProductId,
        changes: &ProductChanges,
    ) -> Result<ProductRecord, RepoError> {
        let mut qb = QueryBuilder::new("UPDATE products SET updated_at = now()");
        if let Some(name) = changes.name.as_ref() {
            qb.push(", name = ");
            qb.push_bind(name);
        }
        if let Some(description) = changes.description.as_ref() {
            qb.push(", description = ");
            qb.push_bind(description);
        }
        if let Some(price) = changes.price {
            qb.push(", price = ");
            qb.push_bind(price);
        }
        if let Some(stock) = changes.stock {
            qb.push(", stock = ");
            qb.push_bind(stock);
        }
        if let Some(active) = changes.is_active {
            qb.push(", is_active = ");
            qb.push_bind(active);
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id.as_str());
        qb.push(format!(" RETURNING {PRODUCT_COLUMNS}"));

        let row = qb
            .build_query_as::<ProductRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;

        ProductRecord::try_from(row)
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_str())
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn update_stock(&self, params: UpdateStockParams) -> Result<StockChange, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let previous: Option<i32> =
            sqlx::query_scalar("SELECT stock FROM products WHERE id = $1 FOR UPDATE")
                .bind(params.id.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        let Some(previous_stock) = previous else {
            return Err(RepoError::NotFound);
        };

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET stock = $2, updated_at = now() \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(params.id.as_str())
        .bind(params.new_stock)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
        let product = ProductRecord::try_from(row)?;

        let draft = StockMovementRecord::between(
            params.id.clone(),
            previous_stock,
            params.new_stock,
            params.reason,
            product.updated_at,
        );
        let movement_row = sqlx::query_as::<_, StockMovementRow>(
            "INSERT INTO stock_movements \
                (id, product_id, movement_type, quantity, previous_stock, new_stock, reason) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, product_id, movement_type, quantity, previous_stock, new_stock, \
                       reason, created_at",
        )
        .bind(draft.id)
        .bind(draft.product_id.as_str())
        .bind(draft.movement_type)
        .bind(draft.quantity)
        .bind(draft.previous_stock)
        .bind(draft.new_stock)
        .bind(&draft.reason)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
        let movement = StockMovementRecord::try_from(movement_row)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(StockChange { product, movement })
    }
}
