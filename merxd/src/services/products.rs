//! Product business logic, including the inventory adjustment entry point.

use crate::error::{ServiceError, ServiceResult};
use chrono::{DateTime, Utc};
use merx_domain::{Price, Product, ProductId, ProductStatus, Sku};
use merx_store::{AdjustOutcome, PageRequest, PageResponse, Paginator, Store};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

// =============================================================================
// Request/Response types
// =============================================================================

/// Payload for creating a product.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 64, message = "SKU must be between 1 and 64 characters"))]
    pub sku: String,

    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    pub description: Option<String>,

    /// Non-negative; enforced by the Price value object
    pub price: Decimal,

    #[validate(range(min = 0, message = "Quantity must not be negative"))]
    #[serde(default)]
    pub quantity: i32,

    pub category: Option<String>,
}

/// Payload for updating a product. Absent fields are left unchanged; the
/// version is required for optimistic locking.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 64, message = "SKU must be between 1 and 64 characters"))]
    pub sku: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,
    pub price: Option<Decimal>,

    #[validate(range(min = 0, message = "Quantity must not be negative"))]
    pub quantity: Option<i32>,

    pub category: Option<String>,
    pub status: Option<String>,

    pub version: i32,
}

/// Payload for a signed inventory adjustment.
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustQuantityRequest {
    pub quantity_change: i32,
}

/// Product as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    pub category: Option<String>,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i32,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            sku: product.sku.to_string(),
            name: product.name,
            description: product.description,
            price: product.price.as_decimal(),
            quantity: product.quantity,
            category: product.category,
            status: product.status,
            created_at: product.created_at,
            updated_at: product.updated_at,
            version: product.version,
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Service for product business logic.
pub struct ProductService<S: Store> {
    store: Arc<S>,
    paginator: Paginator,
}

impl<S: Store> ProductService<S> {
    pub fn new(store: Arc<S>, paginator: Paginator) -> Self {
        Self { store, paginator }
    }

    /// Create a new product.
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> ServiceResult<ProductResponse> {
        request.validate()?;
        info!(sku = %request.sku, "creating product");

        if self.store.products().exists_by_sku(&request.sku).await? {
            return Err(ServiceError::Conflict(format!(
                "Product with SKU already exists: {}",
                request.sku
            )));
        }

        let product = Product::new(
            Sku::new(request.sku)?,
            request.name,
            request.description,
            Price::new(request.price)?,
            request.quantity,
            request.category,
        );

        let saved = self.store.products().create(&product).await?;
        info!(product_id = saved.id, "product created");

        Ok(saved.into())
    }

    /// Get product by ID.
    pub async fn get_product(&self, id: ProductId) -> ServiceResult<ProductResponse> {
        debug!(product_id = id, "fetching product");

        self.store
            .products()
            .find_by_id(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| ServiceError::NotFound(format!("Product not found with ID: {}", id)))
    }

    /// Get product by SKU.
    pub async fn get_product_by_sku(&self, sku: &str) -> ServiceResult<ProductResponse> {
        debug!(sku, "fetching product by SKU");

        self.store
            .products()
            .find_by_sku(sku)
            .await?
            .map(Into::into)
            .ok_or_else(|| ServiceError::NotFound(format!("Product not found with SKU: {}", sku)))
    }

    /// Get all products with pagination.
    pub async fn get_all_products(
        &self,
        request: &PageRequest,
    ) -> ServiceResult<PageResponse<ProductResponse>> {
        let normalized = self.paginator.normalize(request);
        let products = self.store.products().find_all(&normalized).await?;
        let total = self.store.products().count().await?;

        let responses: Vec<ProductResponse> = products.into_iter().map(Into::into).collect();
        Ok(self.paginator.build_page_response(responses, total, &normalized))
    }

    /// Get products by category with pagination.
    pub async fn get_products_by_category(
        &self,
        category: &str,
        request: &PageRequest,
    ) -> ServiceResult<PageResponse<ProductResponse>> {
        let normalized = self.paginator.normalize(request);
        let products = self
            .store
            .products()
            .find_by_category(category, &normalized)
            .await?;
        let total = self.store.products().count_by_category(category).await?;

        let responses: Vec<ProductResponse> = products.into_iter().map(Into::into).collect();
        Ok(self.paginator.build_page_response(responses, total, &normalized))
    }

    /// Search products by name.
    pub async fn search_products(
        &self,
        term: &str,
        request: &PageRequest,
    ) -> ServiceResult<PageResponse<ProductResponse>> {
        let normalized = self.paginator.normalize(request);
        let products = self
            .store
            .products()
            .search_by_name(term, &normalized)
            .await?;

        let responses: Vec<ProductResponse> = products.into_iter().map(Into::into).collect();
        let total = responses.len() as i64;
        Ok(self.paginator.build_page_response(responses, total, &normalized))
    }

    /// Update an existing product.
    pub async fn update_product(
        &self,
        id: ProductId,
        request: UpdateProductRequest,
    ) -> ServiceResult<ProductResponse> {
        request.validate()?;
        info!(product_id = id, "updating product");

        let mut existing = self
            .store
            .products()
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product not found with ID: {}", id)))?;

        // Check for SKU conflict if the SKU is being changed
        if let Some(sku) = request.sku {
            if sku != existing.sku.as_str() {
                if self.store.products().exists_by_sku(&sku).await? {
                    return Err(ServiceError::Conflict(format!(
                        "Product with SKU already exists: {}",
                        sku
                    )));
                }
                existing.sku = Sku::new(sku)?;
            }
        }

        if let Some(name) = request.name {
            existing.name = name;
        }
        if let Some(description) = request.description {
            existing.description = Some(description);
        }
        if let Some(price) = request.price {
            existing.price = Price::new(price)?;
        }
        if let Some(quantity) = request.quantity {
            existing.quantity = quantity;
        }
        if let Some(category) = request.category {
            existing.category = Some(category);
        }
        if let Some(status) = request.status.as_deref() {
            existing.status = status.parse::<ProductStatus>()?;
        }

        existing.version = request.version;

        let outcome = self.store.products().update(&existing).await?;
        if !outcome.is_applied() {
            return Err(ServiceError::Conflict(
                "Product was modified by another transaction. Please refresh and try again."
                    .to_string(),
            ));
        }

        info!(product_id = id, "product updated");
        self.get_product(id).await
    }

    /// Apply a signed quantity change (inventory management).
    ///
    /// Runs the inventory adjustment protocol against the product's current
    /// version: one atomic conditional write checks both the version and
    /// that the resulting quantity stays non-negative.
    pub async fn update_product_quantity(
        &self,
        id: ProductId,
        quantity_change: i32,
    ) -> ServiceResult<ProductResponse> {
        info!(product_id = id, quantity_change, "adjusting product quantity");

        let product = self
            .store
            .products()
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product not found with ID: {}", id)))?;

        let outcome = self
            .store
            .products()
            .adjust_quantity(id, quantity_change, product.version)
            .await?;

        match outcome {
            AdjustOutcome::Applied { .. } => self.get_product(id).await,
            AdjustOutcome::Stale => Err(ServiceError::Conflict(
                "Product was modified by another transaction. Please refresh and try again."
                    .to_string(),
            )),
            AdjustOutcome::InsufficientStock => Err(ServiceError::BusinessRule(format!(
                "Insufficient inventory for product: {}. Available: {}, Requested change: {}",
                product.name, product.quantity, quantity_change
            ))),
        }
    }

    /// Soft delete a product.
    pub async fn delete_product(&self, id: ProductId) -> ServiceResult<()> {
        info!(product_id = id, "deleting product");

        let deleted = self.store.products().delete(id).await?;
        if !deleted {
            return Err(ServiceError::NotFound(format!("Product not found with ID: {}", id)));
        }

        info!(product_id = id, "product deleted");
        Ok(())
    }
}
