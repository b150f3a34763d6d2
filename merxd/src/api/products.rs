//! Product endpoints, including the inventory adjustment route.

use super::{ApiState, PageParams, SearchParams};
use crate::error::ServiceError;
use crate::services::{
    AdjustQuantityRequest, CreateProductRequest, ProductResponse, UpdateProductRequest,
};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use merx_store::{PageResponse, Store};
use std::sync::Arc;

pub fn router<S: Store + 'static>() -> Router<Arc<ApiState<S>>> {
    Router::new()
        .route("/products", post(create_product).get(list_products))
        .route("/products/search", get(search_products))
        .route("/products/sku/:sku", get(get_product_by_sku))
        .route("/products/category/:category", get(list_products_by_category))
        .route("/products/:id/quantity", patch(adjust_quantity))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

async fn create_product<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ServiceError> {
    let product = state.products.create_product(request).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<ProductResponse>, ServiceError> {
    Ok(Json(state.products.get_product(id).await?))
}

async fn get_product_by_sku<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path(sku): Path<String>,
) -> Result<Json<ProductResponse>, ServiceError> {
    Ok(Json(state.products.get_product_by_sku(&sku).await?))
}

async fn list_products<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<ProductResponse>>, ServiceError> {
    let page = params.to_page_request();
    Ok(Json(state.products.get_all_products(&page).await?))
}

async fn list_products_by_category<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path(category): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<ProductResponse>>, ServiceError> {
    let page = params.to_page_request();
    Ok(Json(
        state
            .products
            .get_products_by_category(&category, &page)
            .await?,
    ))
}

async fn search_products<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<PageResponse<ProductResponse>>, ServiceError> {
    let page = params.to_page_request();
    Ok(Json(state.products.search_products(&params.q, &page).await?))
}

async fn update_product<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ServiceError> {
    Ok(Json(state.products.update_product(id, request).await?))
}

async fn adjust_quantity<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path(id): Path<i64>,
    Json(request): Json<AdjustQuantityRequest>,
) -> Result<Json<ProductResponse>, ServiceError> {
    Ok(Json(
        state
            .products
            .update_product_quantity(id, request.quantity_change)
            .await?,
    ))
}

async fn delete_product<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    state.products.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
