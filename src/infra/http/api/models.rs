//! Response payloads that have no counterpart in the shared types crate.

use serde::Serialize;

use crate::application::repos::StockChange;
use crate::domain::entities::{ProductRecord, StockMovementRecord};

#[derive(Debug, Serialize)]
pub struct StockUpdateData {
    pub product: ProductRecord,
    pub movement: StockMovementRecord,
}

impl From<StockChange> for StockUpdateData {
    fn from(change: StockChange) -> Self {
        Self {
            product: change.product,
            movement: change.movement,
        }
    }
}
