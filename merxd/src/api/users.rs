//! User endpoints.

use super::{ApiState, PageParams, SearchParams};
use crate::error::ServiceError;
use crate::services::{CreateUserRequest, UpdateUserRequest, UserResponse};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use merx_store::{PageResponse, Store};
use std::sync::Arc;

pub fn router<S: Store + 'static>() -> Router<Arc<ApiState<S>>> {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route("/users/search", get(search_users))
        .route("/users/email/:email", get(get_user_by_email))
        .route("/users/status/:status", get(list_users_by_status))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

async fn create_user<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ServiceError> {
    let user = state.users.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ServiceError> {
    Ok(Json(state.users.get_user(id).await?))
}

async fn get_user_by_email<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path(email): Path<String>,
) -> Result<Json<UserResponse>, ServiceError> {
    Ok(Json(state.users.get_user_by_email(&email).await?))
}

async fn list_users<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<UserResponse>>, ServiceError> {
    let page = params.to_page_request();
    Ok(Json(state.users.get_all_users(&page).await?))
}

async fn list_users_by_status<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path(status): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<UserResponse>>, ServiceError> {
    let page = params.to_page_request();
    Ok(Json(state.users.get_users_by_status(&status, &page).await?))
}

async fn search_users<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<PageResponse<UserResponse>>, ServiceError> {
    let page = params.to_page_request();
    Ok(Json(state.users.search_users(&params.q, &page).await?))
}

async fn update_user<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ServiceError> {
    Ok(Json(state.users.update_user(id, request).await?))
}

async fn delete_user<S: Store + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    state.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
