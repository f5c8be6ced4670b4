mod commands;
mod queries;
mod service;
pub mod types;

pub use service::*;
pub use types::{
    CreateProductCommand, ListProductsQuery, ListingPlan, PatchProductCommand, ProductError,
    ReplaceProductCommand, SearchProductsQuery, UpdateStockCommand,
};
