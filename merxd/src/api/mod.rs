//! HTTP API for the Merx daemon.
//!
//! Routes:
//! - `/health`
//! - `/users` CRUD, search, status filter
//! - `/products` CRUD, search, category filter, inventory adjustment
//! - `/orders` create, queries, full update, status update, cancel
//!
//! Error mapping: NotFound -> 404, Conflict -> 409, BusinessRule -> 422,
//! Validation -> 400, Config/Infra -> 500.

pub mod orders;
pub mod products;
pub mod users;

use crate::error::ServiceError;
use crate::services::{OrderService, ProductService, UserService};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use merx_store::{PageRequest, Paginator, SortDirection, Store};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};

// =============================================================================
// API State
// =============================================================================

/// Shared state for API handlers.
pub struct ApiState<S: Store> {
    pub users: UserService<S>,
    pub products: ProductService<S>,
    pub orders: OrderService<S>,
}

impl<S: Store> ApiState<S> {
    pub fn new(store: Arc<S>, paginator: Paginator) -> Self {
        Self {
            users: UserService::new(Arc::clone(&store), paginator.clone()),
            products: ProductService::new(Arc::clone(&store), paginator.clone()),
            orders: OrderService::new(store, paginator),
        }
    }
}

// =============================================================================
// Router
// =============================================================================

/// Create the API router.
pub fn create_router<S: Store + 'static>(state: Arc<ApiState<S>>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .merge(users::router())
        .merge(products::router())
        .merge(orders::router())
        .with_state(state)
}

// =============================================================================
// Shared request/response types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Pagination query parameters shared by all list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i32>,
    pub size: Option<i32>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
}

impl PageParams {
    /// Convert to a page request; direction defaults to DESC like the list
    /// endpoints advertise
    pub fn to_page_request(&self) -> PageRequest {
        build_page_request(
            self.page,
            self.size,
            self.sort_by.clone(),
            self.sort_direction.as_deref(),
        )
    }
}

/// Search query parameters: the term plus pagination.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub page: Option<i32>,
    pub size: Option<i32>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
}

impl SearchParams {
    pub fn to_page_request(&self) -> PageRequest {
        build_page_request(
            self.page,
            self.size,
            self.sort_by.clone(),
            self.sort_direction.as_deref(),
        )
    }
}

fn build_page_request(
    page: Option<i32>,
    size: Option<i32>,
    sort_by: Option<String>,
    sort_direction: Option<&str>,
) -> PageRequest {
    PageRequest::new(
        page.unwrap_or(0),
        size.unwrap_or(20),
        sort_by,
        sort_direction
            .map(SortDirection::parse_lenient)
            .unwrap_or(SortDirection::Desc),
    )
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, label) = match &self {
            ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            ServiceError::Conflict(_) => (StatusCode::CONFLICT, "Conflict"),
            ServiceError::BusinessRule(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "Unprocessable Entity")
            },
            ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, "Bad Request"),
            ServiceError::Config(_) | ServiceError::Infra(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            },
        };

        match &self {
            ServiceError::Config(msg) | ServiceError::Infra(msg) => {
                error!(error = %msg, "request failed");
            },
            other => {
                warn!(error = %other, "request rejected");
            },
        }

        let body = ErrorResponse {
            status: status.as_u16(),
            error: label.to_string(),
            message: self.to_string(),
            timestamp: Utc::now(),
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_defaults() {
        let params = PageParams::default();
        let request = params.to_page_request();

        assert_eq!(request.page, 0);
        assert_eq!(request.size, 20);
        assert_eq!(request.sort_by, None);
        assert_eq!(request.sort_direction, SortDirection::Desc);
    }

    #[test]
    fn test_page_params_pass_through() {
        let params = PageParams {
            page: Some(3),
            size: Some(50),
            sort_by: Some("created_at".to_string()),
            sort_direction: Some("asc".to_string()),
        };
        let request = params.to_page_request();

        assert_eq!(request.page, 3);
        assert_eq!(request.size, 50);
        assert_eq!(request.sort_by.as_deref(), Some("created_at"));
        assert_eq!(request.sort_direction, SortDirection::Asc);
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorResponse {
            status: 409,
            error: "Conflict".to_string(),
            message: "Order was modified by another transaction".to_string(),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], 409);
        assert_eq!(json["error"], "Conflict");
        assert!(json["timestamp"].is_string());
    }
}
