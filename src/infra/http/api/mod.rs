pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post},
};

use crate::infra::http::middleware::log_responses;

pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .route(
            "/api/v1/products",
            post(handlers::create_product).get(handlers::list_products),
        )
        .route("/api/v1/products/search", get(handlers::search_products))
        .route(
            "/api/v1/products/{id}",
            get(handlers::get_product)
                .put(handlers::replace_product)
                .patch(handlers::patch_product)
                .delete(handlers::delete_product),
        )
        .route("/api/v1/products/{id}/stock", patch(handlers::update_stock))
        .route(
            "/api/v1/products/{id}/stock-movements",
            get(handlers::stock_movements),
        )
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
}
