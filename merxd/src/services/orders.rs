//! Order business logic: creation with inventory reservation, the lifecycle
//! state machine, and cancellation with inventory restoration.
//!
//! Inventory restoration is deliberately asymmetric: the dedicated
//! status-update and cancel paths restore stock when an order becomes
//! CANCELLED, the general update path does not. Callers that flip the status
//! through `update_order` get no restoration.

use crate::error::{ServiceError, ServiceResult};
use chrono::{DateTime, Utc};
use merx_domain::{Order, OrderId, OrderItem, OrderStatus, UserId};
use merx_store::{AdjustOutcome, PageRequest, PageResponse, Paginator, Store};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::Validate;

// =============================================================================
// Request/Response types
// =============================================================================

/// One requested line of a new order.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemRequest {
    pub product_id: i64,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

/// Payload for creating an order.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub user_id: i64,

    #[validate(length(min = 1, message = "Order must have at least one item"))]
    #[validate(nested)]
    pub items: Vec<OrderItemRequest>,

    #[validate(length(max = 500, message = "Shipping address cannot exceed 500 characters"))]
    pub shipping_address: Option<String>,

    #[validate(length(max = 500, message = "Billing address cannot exceed 500 characters"))]
    pub billing_address: Option<String>,
}

/// Payload for the full order update. A status value is transition-validated
/// but does not trigger inventory restoration on this path.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateOrderRequest {
    pub status: Option<String>,

    #[validate(length(max = 500, message = "Shipping address cannot exceed 500 characters"))]
    pub shipping_address: Option<String>,

    #[validate(length(max = 500, message = "Billing address cannot exceed 500 characters"))]
    pub billing_address: Option<String>,

    pub version: i32,
}

/// Payload for the status-only update.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

/// Order line as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price.as_decimal(),
            total_price: item.total_price,
        }
    }
}

/// Order as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub shipping_address: Option<String>,
    pub billing_address: Option<String>,
    pub order_date: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i32,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.to_string(),
            user_id: order.user_id,
            total_amount: order.total_amount,
            status: order.status,
            shipping_address: order.shipping_address,
            billing_address: order.billing_address,
            order_date: order.order_date,
            items: order.items.into_iter().map(Into::into).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
            version: order.version,
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Service for order business logic.
pub struct OrderService<S: Store> {
    store: Arc<S>,
    paginator: Paginator,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: Arc<S>, paginator: Paginator) -> Self {
        Self { store, paginator }
    }

    /// Create a new order.
    ///
    /// Validates the user and every referenced product, checks availability,
    /// snapshots unit prices into the lines, and hands the assembled order to
    /// the store, which persists order, items, and the per-line inventory
    /// decrements as one atomic unit.
    pub async fn create_order(&self, request: CreateOrderRequest) -> ServiceResult<OrderResponse> {
        request.validate()?;
        info!(user_id = request.user_id, "creating order");

        if !self.store.users().exists_by_id(request.user_id).await? {
            return Err(ServiceError::NotFound(format!(
                "User not found with ID: {}",
                request.user_id
            )));
        }

        // Validate products, snapshot prices, and accumulate the total
        let mut total_amount = Decimal::ZERO;
        let mut items = Vec::with_capacity(request.items.len());

        for line in &request.items {
            let product = self
                .store
                .products()
                .find_by_id(line.product_id)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Product not found with ID: {}",
                        line.product_id
                    ))
                })?;

            if !product.has_stock(line.quantity) {
                return Err(ServiceError::BusinessRule(format!(
                    "Insufficient inventory for product: {}. Available: {}, Requested: {}",
                    product.name, product.quantity, line.quantity
                )));
            }

            let item = OrderItem::new(product.id, line.quantity, product.price);
            total_amount += item.total_price;
            items.push(item);
        }

        let mut order = Order::new(
            request.user_id,
            total_amount,
            request.shipping_address,
            request.billing_address,
        );
        order.items = items;

        let saved = self.store.orders().create(&order).await?;
        info!(
            order_id = saved.id,
            order_number = %saved.order_number,
            total = %saved.total_amount,
            "order created"
        );

        Ok(saved.into())
    }

    /// Get order by ID.
    pub async fn get_order(&self, id: OrderId) -> ServiceResult<OrderResponse> {
        debug!(order_id = id, "fetching order");

        self.store
            .orders()
            .find_by_id(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| ServiceError::NotFound(format!("Order not found with ID: {}", id)))
    }

    /// Get order by order number.
    pub async fn get_order_by_number(&self, order_number: &str) -> ServiceResult<OrderResponse> {
        debug!(order_number, "fetching order by number");

        self.store
            .orders()
            .find_by_order_number(order_number)
            .await?
            .map(Into::into)
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Order not found with order number: {}",
                    order_number
                ))
            })
    }

    /// Get all orders with pagination.
    pub async fn get_all_orders(
        &self,
        request: &PageRequest,
    ) -> ServiceResult<PageResponse<OrderResponse>> {
        let normalized = self.paginator.normalize(request);
        let orders = self.store.orders().find_all(&normalized).await?;
        let total = self.store.orders().count().await?;

        let responses: Vec<OrderResponse> = orders.into_iter().map(Into::into).collect();
        Ok(self.paginator.build_page_response(responses, total, &normalized))
    }

    /// Get a user's orders with pagination.
    pub async fn get_orders_by_user(
        &self,
        user_id: UserId,
        request: &PageRequest,
    ) -> ServiceResult<PageResponse<OrderResponse>> {
        if !self.store.users().exists_by_id(user_id).await? {
            return Err(ServiceError::NotFound(format!(
                "User not found with ID: {}",
                user_id
            )));
        }

        let normalized = self.paginator.normalize(request);
        let orders = self.store.orders().find_by_user(user_id, &normalized).await?;
        let total = self.store.orders().count_by_user(user_id).await?;

        let responses: Vec<OrderResponse> = orders.into_iter().map(Into::into).collect();
        Ok(self.paginator.build_page_response(responses, total, &normalized))
    }

    /// Get orders by status with pagination.
    pub async fn get_orders_by_status(
        &self,
        status: &str,
        request: &PageRequest,
    ) -> ServiceResult<PageResponse<OrderResponse>> {
        let status = OrderStatus::from_str(status)?;

        let normalized = self.paginator.normalize(request);
        let orders = self.store.orders().find_by_status(status, &normalized).await?;

        let responses: Vec<OrderResponse> = orders.into_iter().map(Into::into).collect();
        let total = responses.len() as i64;
        Ok(self.paginator.build_page_response(responses, total, &normalized))
    }

    /// Update an existing order (addresses and/or status in one versioned
    /// write). No inventory restoration happens here, even for CANCELLED.
    pub async fn update_order(
        &self,
        id: OrderId,
        request: UpdateOrderRequest,
    ) -> ServiceResult<OrderResponse> {
        request.validate()?;
        info!(order_id = id, "updating order");

        let mut existing = self
            .store
            .orders()
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order not found with ID: {}", id)))?;

        if let Some(status) = request.status.as_deref() {
            let new_status = OrderStatus::from_str(status)?;
            existing.status.validate_transition(new_status)?;
            existing.status = new_status;
        }
        if let Some(shipping) = request.shipping_address {
            existing.shipping_address = Some(shipping);
        }
        if let Some(billing) = request.billing_address {
            existing.billing_address = Some(billing);
        }

        existing.version = request.version;

        let outcome = self.store.orders().update(&existing).await?;
        if !outcome.is_applied() {
            return Err(ServiceError::Conflict(
                "Order was modified by another transaction. Please refresh and try again."
                    .to_string(),
            ));
        }

        info!(order_id = id, "order updated");
        self.get_order(id).await
    }

    /// Update order status.
    ///
    /// Validates the transition, performs the versioned status write, and for
    /// CANCELLED restores inventory for every item (best-effort: individual
    /// restoration failures are logged and skipped, never fatal).
    pub async fn update_order_status(
        &self,
        id: OrderId,
        status: &str,
    ) -> ServiceResult<OrderResponse> {
        let new_status = OrderStatus::from_str(status)?;
        info!(order_id = id, status = %new_status, "updating order status");

        let order = self
            .store
            .orders()
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order not found with ID: {}", id)))?;

        order.status.validate_transition(new_status)?;

        let outcome = self
            .store
            .orders()
            .update_status(id, new_status, order.version)
            .await?;
        if !outcome.is_applied() {
            return Err(ServiceError::Conflict(
                "Order was modified by another transaction. Please refresh and try again."
                    .to_string(),
            ));
        }

        if new_status == OrderStatus::Cancelled {
            self.restore_inventory(&order).await;
        }

        self.get_order(id).await
    }

    /// Cancel an order: restore inventory, set status CANCELLED, soft-delete
    /// the row. Only PENDING and CONFIRMED orders can be cancelled.
    pub async fn cancel_order(&self, id: OrderId) -> ServiceResult<()> {
        info!(order_id = id, "cancelling order");

        let order = self
            .store
            .orders()
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order not found with ID: {}", id)))?;

        if !order.status.is_cancellable() {
            return Err(ServiceError::BusinessRule(
                "Cannot cancel order that has been shipped or delivered".to_string(),
            ));
        }

        let outcome = self
            .store
            .orders()
            .update_status(id, OrderStatus::Cancelled, order.version)
            .await?;
        if !outcome.is_applied() {
            return Err(ServiceError::Conflict(
                "Order was modified by another transaction. Please refresh and try again."
                    .to_string(),
            ));
        }

        self.restore_inventory(&order).await;

        self.store.orders().delete(id).await?;
        info!(order_id = id, "order cancelled");
        Ok(())
    }

    /// Restore inventory for every item of a cancelled order.
    ///
    /// Best-effort: each restoration runs the adjustment protocol against
    /// the product's current version; failures are logged and counted, and
    /// the cancellation proceeds regardless.
    async fn restore_inventory(&self, order: &Order) {
        let mut skipped = 0usize;

        for item in &order.items {
            let product = match self.store.products().find_by_id(item.product_id).await {
                Ok(Some(product)) => product,
                Ok(None) => {
                    warn!(
                        order_id = order.id,
                        product_id = item.product_id,
                        "skipping restoration: product no longer exists"
                    );
                    skipped += 1;
                    continue;
                },
                Err(err) => {
                    warn!(
                        order_id = order.id,
                        product_id = item.product_id,
                        error = %err,
                        "skipping restoration: product read failed"
                    );
                    skipped += 1;
                    continue;
                },
            };

            match self
                .store
                .products()
                .adjust_quantity(item.product_id, item.quantity, product.version)
                .await
            {
                Ok(AdjustOutcome::Applied { .. }) => {},
                Ok(outcome) => {
                    warn!(
                        order_id = order.id,
                        product_id = item.product_id,
                        ?outcome,
                        "skipping restoration: adjustment rejected"
                    );
                    skipped += 1;
                },
                Err(err) => {
                    warn!(
                        order_id = order.id,
                        product_id = item.product_id,
                        error = %err,
                        "skipping restoration: adjustment failed"
                    );
                    skipped += 1;
                },
            }
        }

        if skipped > 0 {
            warn!(
                order_id = order.id,
                skipped,
                total = order.items.len(),
                "inventory restoration incomplete"
            );
        }
    }
}
