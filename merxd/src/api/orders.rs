//! Order endpoints.
//!
//! DELETE on an order is cancellation: inventory restoration plus soft
//! delete, not a plain row removal.

use super::{ApiState, PageParams};
use crate::error::ServiceError;
use crate::services::{
    CreateOrderRequest, OrderResponse, UpdateOrderRequest, UpdateOrderStatusRequest,
};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use merx_store::{PageResponse, Store};
use std::sync::Arc;

pub fn router<S: Store + 'static>() -> Router<Arc<ApiState<S>>> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/number/:order_number", get(get_order_by_number))
        .route("/orders/user/:user_id", get(list_orders_by_user))
        .route("/orders/status/:status", get(list_orders_by_status))
        .route("/orders/:id/status", patch(update_order_status))
        .route(
            "/orders/:id",
            get(get_order).put(update_order).delete(cancel_order),
        )
}

async fn create_order<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ServiceError> {
    let order = state.orders.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn get_order<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ServiceError> {
    Ok(Json(state.orders.get_order(id).await?))
}

async fn get_order_by_number<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path(order_number): Path<String>,
) -> Result<Json<OrderResponse>, ServiceError> {
    Ok(Json(state.orders.get_order_by_number(&order_number).await?))
}

async fn list_orders<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<OrderResponse>>, ServiceError> {
    let page = params.to_page_request();
    Ok(Json(state.orders.get_all_orders(&page).await?))
}

async fn list_orders_by_user<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path(user_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<OrderResponse>>, ServiceError> {
    let page = params.to_page_request();
    Ok(Json(state.orders.get_orders_by_user(user_id, &page).await?))
}

async fn list_orders_by_status<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path(status): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<OrderResponse>>, ServiceError> {
    let page = params.to_page_request();
    Ok(Json(state.orders.get_orders_by_status(&status, &page).await?))
}

async fn update_order<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateOrderRequest>,
) -> Result<Json<OrderResponse>, ServiceError> {
    Ok(Json(state.orders.update_order(id, request).await?))
}

async fn update_order_status<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<OrderResponse>, ServiceError> {
    Ok(Json(
        state
            .orders
            .update_order_status(id, &request.status)
            .await?,
    ))
}

async fn cancel_order<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    state.orders.cancel_order(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
