//! Repository trait definitions (Ports)
//!
//! These traits define the storage interface for the domain.
//! Implementations can be PostgreSQL or in-memory for testing.
//!
//! # Optimistic locking
//!
//! Versioned writes take the version the caller read earlier and report
//! [`WriteOutcome::Stale`] when no row matched `id AND version AND NOT
//! deleted`. Stale means the row exists but was modified concurrently;
//! callers translate it into a conflict error and must never treat it as
//! not-found.
//!
//! # Soft delete
//!
//! `delete` sets the deleted flag and leaves the version untouched. Deletes
//! are deliberately not version-guarded; this is a documented relaxation of
//! the locking scheme, not an oversight.

use crate::error::StoreError;
use crate::pagination::PageRequest;
use async_trait::async_trait;
use merx_domain::{
    Order, OrderId, OrderItem, OrderStatus, Product, ProductId, User, UserId, UserStatus,
};

/// Outcome of a versioned conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The row matched and was written; version is now `new_version`
    /// (the supplied version + 1).
    Applied {
        /// Version after the write
        new_version: i32,
    },
    /// No row matched the id/version/not-deleted condition.
    Stale,
}

impl WriteOutcome {
    /// True if the write was applied
    pub fn is_applied(&self) -> bool {
        matches!(self, WriteOutcome::Applied { .. })
    }
}

/// Outcome of an inventory adjustment.
///
/// The version check and the non-negativity check are evaluated by one
/// atomic conditional update; the rejection reason is reported where the
/// implementation can classify it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustOutcome {
    /// Quantity changed by the delta; version is now `new_version`
    Applied {
        /// Version after the write
        new_version: i32,
    },
    /// The supplied version no longer matches the row
    Stale,
    /// Applying the delta would drive the quantity negative
    InsufficientStock,
}

impl AdjustOutcome {
    /// True if the adjustment was applied
    pub fn is_applied(&self) -> bool {
        matches!(self, AdjustOutcome::Applied { .. })
    }
}

/// Repository for User entities
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user, returning it with its generated id
    async fn create(&self, user: &User) -> Result<User, StoreError>;

    /// Find a user by ID (soft-deleted rows are absent)
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// List users with pagination
    async fn find_all(&self, page: &PageRequest) -> Result<Vec<User>, StoreError>;

    /// List users by status with pagination
    async fn find_by_status(
        &self,
        status: UserStatus,
        page: &PageRequest,
    ) -> Result<Vec<User>, StoreError>;

    /// Search users by name substring with pagination
    async fn search_by_name(
        &self,
        term: &str,
        page: &PageRequest,
    ) -> Result<Vec<User>, StoreError>;

    /// Count all users
    async fn count(&self) -> Result<i64, StoreError>;

    /// Count users by status
    async fn count_by_status(&self, status: UserStatus) -> Result<i64, StoreError>;

    /// Check if a user exists by ID
    async fn exists_by_id(&self, id: UserId) -> Result<bool, StoreError>;

    /// Check if an email is taken
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;

    /// Versioned update of mutable fields, conditioned on `user.version`
    async fn update(&self, user: &User) -> Result<WriteOutcome, StoreError>;

    /// Soft delete; returns false when no live row matched
    async fn delete(&self, id: UserId) -> Result<bool, StoreError>;
}

/// Repository for Product entities
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a new product, returning it with its generated id
    async fn create(&self, product: &Product) -> Result<Product, StoreError>;

    /// Find a product by ID (soft-deleted rows are absent)
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Find a product by SKU
    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError>;

    /// List products with pagination
    async fn find_all(&self, page: &PageRequest) -> Result<Vec<Product>, StoreError>;

    /// List products by category with pagination
    async fn find_by_category(
        &self,
        category: &str,
        page: &PageRequest,
    ) -> Result<Vec<Product>, StoreError>;

    /// Search products by name substring with pagination
    async fn search_by_name(
        &self,
        term: &str,
        page: &PageRequest,
    ) -> Result<Vec<Product>, StoreError>;

    /// Count all products
    async fn count(&self) -> Result<i64, StoreError>;

    /// Count products in a category
    async fn count_by_category(&self, category: &str) -> Result<i64, StoreError>;

    /// Check if a product exists by ID
    async fn exists_by_id(&self, id: ProductId) -> Result<bool, StoreError>;

    /// Check if a SKU is taken
    async fn exists_by_sku(&self, sku: &str) -> Result<bool, StoreError>;

    /// Versioned update of mutable fields, conditioned on `product.version`
    async fn update(&self, product: &Product) -> Result<WriteOutcome, StoreError>;

    /// Apply a signed quantity delta conditioned on `expected_version` and on
    /// the resulting quantity staying non-negative. Both conditions are part
    /// of the same atomic conditional write.
    async fn adjust_quantity(
        &self,
        id: ProductId,
        delta: i32,
        expected_version: i32,
    ) -> Result<AdjustOutcome, StoreError>;

    /// Soft delete; returns false when no live row matched
    async fn delete(&self, id: ProductId) -> Result<bool, StoreError>;
}

/// Repository for Order entities.
///
/// Orders exclusively own their items: `create` persists the order and all
/// of its items, and the find operations that return an order load the items
/// with it.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist a new order, its items, and one inventory decrement per item
    /// (delta = -quantity against each product's current version) as a
    /// single atomic unit. Any decrement failure aborts the whole creation:
    /// no order row, no items, and no partial reservation remain.
    ///
    /// # Errors
    /// - `StoreError::StaleVersion` when a product moved under the decrement
    /// - `StoreError::InsufficientStock` when a decrement would go negative
    async fn create(&self, order: &Order) -> Result<Order, StoreError>;

    /// Find an order by ID, items included
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Find an order by order number, items included
    async fn find_by_order_number(&self, order_number: &str) -> Result<Option<Order>, StoreError>;

    /// Load the items of an order
    async fn find_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError>;

    /// List orders with pagination, items included
    async fn find_all(&self, page: &PageRequest) -> Result<Vec<Order>, StoreError>;

    /// List a user's orders with pagination, items included
    async fn find_by_user(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> Result<Vec<Order>, StoreError>;

    /// List orders by status with pagination, items included
    async fn find_by_status(
        &self,
        status: OrderStatus,
        page: &PageRequest,
    ) -> Result<Vec<Order>, StoreError>;

    /// Count all orders
    async fn count(&self) -> Result<i64, StoreError>;

    /// Count a user's orders
    async fn count_by_user(&self, user_id: UserId) -> Result<i64, StoreError>;

    /// Versioned update of status and addresses, conditioned on
    /// `order.version`
    async fn update(&self, order: &Order) -> Result<WriteOutcome, StoreError>;

    /// Versioned status-only write
    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        expected_version: i32,
    ) -> Result<WriteOutcome, StoreError>;

    /// Soft delete; returns false when no live row matched
    async fn delete(&self, id: OrderId) -> Result<bool, StoreError>;
}

/// Combined store interface
pub trait Store: Send + Sync {
    /// Get user repository
    fn users(&self) -> &dyn UserRepository;

    /// Get product repository
    fn products(&self) -> &dyn ProductRepository;

    /// Get order repository
    fn orders(&self) -> &dyn OrderRepository;
}
