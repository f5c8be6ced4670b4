//! Product handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use catalog_api_types::{
    ApiResponse, ProductCreateRequest, ProductPatchRequest, ProductReplaceRequest,
    StockUpdateRequest,
};

use crate::application::products::{
    CreateProductCommand, ListProductsQuery, PatchProductCommand, ReplaceProductCommand,
    SearchProductsQuery, UpdateStockCommand,
};

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::StockUpdateData;
use crate::infra::http::api::state::ApiState;

pub async fn create_product(
    State(state): State<ApiState>,
    payload: Result<Json<ProductCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let command = CreateProductCommand {
        name: payload.name,
        description: payload.description,
        price: payload.price,
        stock: payload.stock,
        is_active: payload.is_active,
    };

    let product = state.products.create_product(command).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Product created successfully", product)),
    ))
}

pub async fn list_products(
    State(state): State<ApiState>,
    query: Result<Query<ListProductsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let page = state.products.list_products(query).await?;
    Ok(Json(ApiResponse::success(
        "Products retrieved successfully",
        page,
    )))
}

pub async fn search_products(
    State(state): State<ApiState>,
    query: Result<Query<SearchProductsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let page = state.products.search_products(query).await?;
    Ok(Json(ApiResponse::success(
        "Products retrieved successfully",
        page,
    )))
}

pub async fn get_product(
    State(state): State<ApiState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let product = state.products.get_product(&id).await?;
    Ok(Json(ApiResponse::success(
        "Product retrieved successfully",
        product,
    )))
}

pub async fn replace_product(
    State(state): State<ApiState>,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<ProductReplaceRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let command = ReplaceProductCommand {
        name: payload.name,
        description: payload.description,
        price: payload.price,
        stock: payload.stock,
        is_active: payload.is_active,
    };

    let product = state.products.replace_product(&id, command).await?;
    Ok(Json(ApiResponse::success(
        "Product updated successfully",
        product,
    )))
}

pub async fn patch_product(
    State(state): State<ApiState>,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<ProductPatchRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let command = PatchProductCommand {
        name: payload.name,
        description: payload.description,
        price: payload.price,
        stock: payload.stock,
        is_active: payload.is_active,
    };

    let product = state.products.update_product(&id, command).await?;
    Ok(Json(ApiResponse::success(
        "Product updated successfully",
        product,
    )))
}

pub async fn delete_product(
    State(state): State<ApiState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    state.products.delete_product(&id).await?;
    Ok(Json(ApiResponse::success(
        "Product deleted successfully",
        serde_json::json!({ "id": id.trim().to_ascii_lowercase() }),
    )))
}

pub async fn update_stock(
    State(state): State<ApiState>,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<StockUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let command = UpdateStockCommand {
        stock: payload.stock,
        reason: payload.reason,
    };

    let change = state.products.update_stock(&id, command).await?;
    Ok(Json(ApiResponse::success(
        "Stock updated successfully",
        StockUpdateData::from(change),
    )))
}

pub async fn stock_movements(
    State(state): State<ApiState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let movements = state.products.stock_movements(&id).await?;
    Ok(Json(ApiResponse::success(
        "Stock movements retrieved successfully",
        movements,
    )))
}
