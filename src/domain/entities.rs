//! Domain entities mirrored from persistent storage.

use catalog_api_types::StockMovementType;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::ids::ProductId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i32,
    pub is_active: bool,
    pub sku: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Append-only record of a single stock change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMovementRecord {
    pub id: Uuid,
    pub product_id: ProductId,
    pub movement_type: StockMovementType,
    pub quantity: i32,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub reason: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl StockMovementRecord {
    pub fn between(
        product_id: ProductId,
        previous_stock: i32,
        new_stock: i32,
        reason: impl Into<String>,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            movement_type: StockMovementType::from_levels(previous_stock, new_stock),
            quantity: new_stock - previous_stock,
            previous_stock,
            new_stock,
            reason: reason.into(),
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn movement_records_signed_delta() {
        let id = ProductId::parse("65920080abcdef0123456789").expect("valid id");
        let movement =
            StockMovementRecord::between(id, 5, 2, "sold", datetime!(2024-03-01 12:00 UTC));
        assert_eq!(movement.movement_type, StockMovementType::Decrease);
        assert_eq!(movement.quantity, -3);
        assert_eq!(movement.previous_stock, 5);
        assert_eq!(movement.new_stock, 2);
    }

    #[test]
    fn product_json_uses_rfc3339_timestamps() {
        let record = ProductRecord {
            id: ProductId::parse("65920080abcdef0123456789").expect("valid id"),
            name: "Widget".to_string(),
            description: "A small widget".to_string(),
            price: 9.99,
            stock: 5,
            is_active: true,
            sku: "PRD-00000001".to_string(),
            created_at: datetime!(2024-03-01 12:00 UTC),
            updated_at: datetime!(2024-03-01 12:00 UTC),
        };
        let json = serde_json::to_value(&record).expect("serialize product");
        assert_eq!(json["created_at"], "2024-03-01T12:00:00Z");
        assert_eq!(json["id"], "65920080abcdef0123456789");
    }
}
