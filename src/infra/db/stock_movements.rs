use async_trait::async_trait;
use catalog_api_types::StockMovementType;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{RepoError, StockMovementsRepo};
use crate::domain::entities::StockMovementRecord;
use crate::domain::ids::ProductId;

use super::PostgresRepositories;
use super::util::map_sqlx_error;

#[derive(sqlx::FromRow)]
pub(super) struct StockMovementRow {
    id: Uuid,
    product_id: String,
    movement_type: StockMovementType,
    quantity: i32,
    previous_stock: i32,
    new_stock: i32,
    reason: String,
    created_at: OffsetDateTime,
}

impl TryFrom<StockMovementRow> for StockMovementRecord {
    type Error = RepoError;

    fn try_from(row: StockMovementRow) -> Result<Self, Self::Error> {
        let product_id = ProductId::parse(&row.product_id).map_err(|err| RepoError::Integrity {
            message: format!("stock movement {} has malformed product id: {err}", row.id),
        })?;
        Ok(Self {
            id: row.id,
            product_id,
            movement_type: row.movement_type,
            quantity: row.quantity,
            previous_stock: row.previous_stock,
            new_stock: row.new_stock,
            reason: row.reason,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl StockMovementsRepo for PostgresRepositories {
    async fn list_stock_movements(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<StockMovementRecord>, RepoError> {
        let rows = sqlx::query_as::<_, StockMovementRow>(
            r#"
            SELECT id, product_id, movement_type, quantity, previous_stock, new_stock,
                   reason, created_at
            FROM stock_movements
            WHERE product_id = $1
            ORDER BY created_at ASC, seq ASC
            "#,
        )
        .bind(product_id.as_str())
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(StockMovementRecord::try_from).collect()
    }
}
