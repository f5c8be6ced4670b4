use std::sync::Arc;

use crate::application::pagination::PageLimits;
use crate::application::repos::{ProductsRepo, StockMovementsRepo};
use crate::cache::CachePolicy;

pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductServiceSettings {
    pub limits: PageLimits,
    pub low_stock_threshold: i32,
}

impl Default for ProductServiceSettings {
    fn default() -> Self {
        Self {
            limits: PageLimits::default(),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

#[derive(Clone)]
pub struct ProductService {
    pub(crate) products: Arc<dyn ProductsRepo>,
    pub(crate) movements: Arc<dyn StockMovementsRepo>,
    pub(crate) cache: CachePolicy,
    pub(crate) settings: ProductServiceSettings,
}

impl ProductService {
    pub fn new(
        products: Arc<dyn ProductsRepo>,
        movements: Arc<dyn StockMovementsRepo>,
        cache: CachePolicy,
        settings: ProductServiceSettings,
    ) -> Self {
        Self {
            products,
            movements,
            cache,
            settings,
        }
    }
}
