//! PostgreSQL store implementation.
//!
//! This module uses dynamic queries (sqlx::query) instead of compile-time
//! checked macros (sqlx::query!) to allow compilation without DATABASE_URL.
//! All SQL text comes from the [`QueryCatalog`]; list operations get their
//! ORDER BY/LIMIT/OFFSET fragment from the [`Paginator`].
//!
//! Optimistic locking is carried entirely by the backend: every versioned
//! write is a single `UPDATE ... WHERE id = $n AND version = $m AND deleted =
//! FALSE`, and an affected-row count of zero is reported as
//! [`WriteOutcome::Stale`]. Order creation runs order insert, item inserts,
//! and the per-line inventory decrements in one transaction, so a failing
//! decrement rolls the whole order back.

use crate::error::StoreError;
use crate::pagination::{PageRequest, Paginator};
use crate::queries::QueryCatalog;
use crate::repository::{
    AdjustOutcome, OrderRepository, ProductRepository, Store, UserRepository, WriteOutcome,
};
use async_trait::async_trait;
use chrono::Utc;
use merx_domain::{
    Email, Order, OrderId, OrderItem, OrderNumber, OrderStatus, Price, Product, ProductId,
    ProductStatus, Sku, User, UserId, UserRole, UserStatus,
};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::str::FromStr;
use std::sync::Arc;

/// PostgreSQL-backed store
pub struct PgStore {
    pool: Arc<PgPool>,
    catalog: QueryCatalog,
    paginator: Paginator,
}

impl PgStore {
    /// Create a new store over an existing pool
    pub fn new(pool: Arc<PgPool>, catalog: QueryCatalog, paginator: Paginator) -> Self {
        Self {
            pool,
            catalog,
            paginator,
        }
    }

    /// Get a reference to the underlying pool (for testing)
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn sql(&self, module: &str, operation: &str) -> Result<&str, StoreError> {
        self.catalog.get(module, operation)
    }

    fn paged_sql(
        &self,
        module: &str,
        operation: &str,
        page: &PageRequest,
    ) -> Result<String, StoreError> {
        Ok(format!(
            "{}{}",
            self.sql(module, operation)?,
            self.paginator.build_clause(page)
        ))
    }
}

// =============================================================================
// Row parsing
// =============================================================================

fn parse_user_row(row: &PgRow) -> Result<User, StoreError> {
    let email: String = row.try_get("email").map_err(db_err)?;
    let status: String = row.try_get("status").map_err(db_err)?;
    let role: String = row.try_get("role").map_err(db_err)?;

    Ok(User {
        id: row.try_get("id").map_err(db_err)?,
        email: Email::new(email).map_err(de_err)?,
        first_name: row.try_get("first_name").map_err(db_err)?,
        last_name: row.try_get("last_name").map_err(db_err)?,
        phone: row.try_get("phone").map_err(db_err)?,
        status: UserStatus::from_str(&status).map_err(de_err)?,
        role: UserRole::from_str(&role).map_err(de_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
        deleted: row.try_get("deleted").map_err(db_err)?,
        version: row.try_get("version").map_err(db_err)?,
    })
}

fn parse_product_row(row: &PgRow) -> Result<Product, StoreError> {
    let sku: String = row.try_get("sku").map_err(db_err)?;
    let status: String = row.try_get("status").map_err(db_err)?;
    let price: Decimal = row.try_get("price").map_err(db_err)?;

    Ok(Product {
        id: row.try_get("id").map_err(db_err)?,
        sku: Sku::new(sku).map_err(de_err)?,
        name: row.try_get("name").map_err(db_err)?,
        description: row.try_get("description").map_err(db_err)?,
        price: Price::new(price).map_err(de_err)?,
        quantity: row.try_get("quantity").map_err(db_err)?,
        category: row.try_get("category").map_err(db_err)?,
        status: ProductStatus::from_str(&status).map_err(de_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
        deleted: row.try_get("deleted").map_err(db_err)?,
        version: row.try_get("version").map_err(db_err)?,
    })
}

fn parse_order_row(row: &PgRow) -> Result<Order, StoreError> {
    let order_number: String = row.try_get("order_number").map_err(db_err)?;
    let status: String = row.try_get("status").map_err(db_err)?;

    Ok(Order {
        id: row.try_get("id").map_err(db_err)?,
        order_number: OrderNumber::parse(order_number).map_err(de_err)?,
        user_id: row.try_get("user_id").map_err(db_err)?,
        total_amount: row.try_get("total_amount").map_err(db_err)?,
        status: OrderStatus::from_str(&status).map_err(de_err)?,
        shipping_address: row.try_get("shipping_address").map_err(db_err)?,
        billing_address: row.try_get("billing_address").map_err(db_err)?,
        order_date: row.try_get("order_date").map_err(db_err)?,
        items: Vec::new(),
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
        deleted: row.try_get("deleted").map_err(db_err)?,
        version: row.try_get("version").map_err(db_err)?,
    })
}

fn parse_item_row(row: &PgRow) -> Result<OrderItem, StoreError> {
    let unit_price: Decimal = row.try_get("unit_price").map_err(db_err)?;

    Ok(OrderItem {
        id: row.try_get("id").map_err(db_err)?,
        order_id: row.try_get("order_id").map_err(db_err)?,
        product_id: row.try_get("product_id").map_err(db_err)?,
        quantity: row.try_get("quantity").map_err(db_err)?,
        unit_price: Price::new(unit_price).map_err(de_err)?,
        total_price: row.try_get("total_price").map_err(db_err)?,
    })
}

fn db_err(err: sqlx::Error) -> StoreError {
    StoreError::Database(err.to_string())
}

fn de_err(err: merx_domain::DomainError) -> StoreError {
    StoreError::Deserialization(err.to_string())
}

// =============================================================================
// UserRepository
// =============================================================================

#[async_trait]
impl UserRepository for PgStore {
    async fn create(&self, user: &User) -> Result<User, StoreError> {
        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(self.sql("user", "create")?)
            .bind(user.email.as_str())
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.phone)
            .bind(user.status.as_str())
            .bind(user.role.as_str())
            .bind(now)
            .bind(now)
            .fetch_one(self.pool.as_ref())
            .await?;

        let mut stored = user.clone();
        stored.id = id;
        stored.version = 1;
        stored.created_at = now;
        stored.updated_at = now;
        Ok(stored)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(self.sql("user", "findById")?)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;
        row.as_ref().map(parse_user_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(self.sql("user", "findByEmail")?)
            .bind(email)
            .fetch_optional(self.pool.as_ref())
            .await?;
        row.as_ref().map(parse_user_row).transpose()
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Vec<User>, StoreError> {
        let sql = self.paged_sql("user", "findAll", page)?;
        let rows = sqlx::query(&sql).fetch_all(self.pool.as_ref()).await?;
        rows.iter().map(parse_user_row).collect()
    }

    async fn find_by_status(
        &self,
        status: UserStatus,
        page: &PageRequest,
    ) -> Result<Vec<User>, StoreError> {
        let sql = self.paged_sql("user", "findByStatus", page)?;
        let rows = sqlx::query(&sql)
            .bind(status.as_str())
            .fetch_all(self.pool.as_ref())
            .await?;
        rows.iter().map(parse_user_row).collect()
    }

    async fn search_by_name(
        &self,
        term: &str,
        page: &PageRequest,
    ) -> Result<Vec<User>, StoreError> {
        let sql = self.paged_sql("user", "searchByName", page)?;
        let rows = sqlx::query(&sql)
            .bind(format!("%{}%", term))
            .fetch_all(self.pool.as_ref())
            .await?;
        rows.iter().map(parse_user_row).collect()
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(sqlx::query_scalar(self.sql("user", "count")?)
            .fetch_one(self.pool.as_ref())
            .await?)
    }

    async fn count_by_status(&self, status: UserStatus) -> Result<i64, StoreError> {
        Ok(sqlx::query_scalar(self.sql("user", "countByStatus")?)
            .bind(status.as_str())
            .fetch_one(self.pool.as_ref())
            .await?)
    }

    async fn exists_by_id(&self, id: UserId) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar(self.sql("user", "existsById")?)
            .bind(id)
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(count > 0)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar(self.sql("user", "existsByEmail")?)
            .bind(email)
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(count > 0)
    }

    async fn update(&self, user: &User) -> Result<WriteOutcome, StoreError> {
        let affected = sqlx::query(self.sql("user", "update")?)
            .bind(user.id)
            .bind(user.email.as_str())
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.phone)
            .bind(user.status.as_str())
            .bind(user.role.as_str())
            .bind(Utc::now())
            .bind(user.version)
            .execute(self.pool.as_ref())
            .await?
            .rows_affected();

        if affected == 0 {
            Ok(WriteOutcome::Stale)
        } else {
            Ok(WriteOutcome::Applied {
                new_version: user.version + 1,
            })
        }
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        let affected = sqlx::query(self.sql("user", "delete")?)
            .bind(id)
            .bind(Utc::now())
            .execute(self.pool.as_ref())
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}

// =============================================================================
// ProductRepository
// =============================================================================

#[async_trait]
impl ProductRepository for PgStore {
    async fn create(&self, product: &Product) -> Result<Product, StoreError> {
        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(self.sql("product", "create")?)
            .bind(product.sku.as_str())
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price.as_decimal())
            .bind(product.quantity)
            .bind(&product.category)
            .bind(product.status.as_str())
            .bind(now)
            .bind(now)
            .fetch_one(self.pool.as_ref())
            .await?;

        let mut stored = product.clone();
        stored.id = id;
        stored.version = 1;
        stored.created_at = now;
        stored.updated_at = now;
        Ok(stored)
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(self.sql("product", "findById")?)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;
        row.as_ref().map(parse_product_row).transpose()
    }

    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(self.sql("product", "findBySku")?)
            .bind(sku)
            .fetch_optional(self.pool.as_ref())
            .await?;
        row.as_ref().map(parse_product_row).transpose()
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Vec<Product>, StoreError> {
        let sql = self.paged_sql("product", "findAll", page)?;
        let rows = sqlx::query(&sql).fetch_all(self.pool.as_ref()).await?;
        rows.iter().map(parse_product_row).collect()
    }

    async fn find_by_category(
        &self,
        category: &str,
        page: &PageRequest,
    ) -> Result<Vec<Product>, StoreError> {
        let sql = self.paged_sql("product", "findByCategory", page)?;
        let rows = sqlx::query(&sql)
            .bind(category)
            .fetch_all(self.pool.as_ref())
            .await?;
        rows.iter().map(parse_product_row).collect()
    }

    async fn search_by_name(
        &self,
        term: &str,
        page: &PageRequest,
    ) -> Result<Vec<Product>, StoreError> {
        let sql = self.paged_sql("product", "searchByName", page)?;
        let rows = sqlx::query(&sql)
            .bind(format!("%{}%", term))
            .fetch_all(self.pool.as_ref())
            .await?;
        rows.iter().map(parse_product_row).collect()
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(sqlx::query_scalar(self.sql("product", "count")?)
            .fetch_one(self.pool.as_ref())
            .await?)
    }

    async fn count_by_category(&self, category: &str) -> Result<i64, StoreError> {
        Ok(sqlx::query_scalar(self.sql("product", "countByCategory")?)
            .bind(category)
            .fetch_one(self.pool.as_ref())
            .await?)
    }

    async fn exists_by_id(&self, id: ProductId) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar(self.sql("product", "existsById")?)
            .bind(id)
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(count > 0)
    }

    async fn exists_by_sku(&self, sku: &str) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar(self.sql("product", "existsBySku")?)
            .bind(sku)
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(count > 0)
    }

    async fn update(&self, product: &Product) -> Result<WriteOutcome, StoreError> {
        let affected = sqlx::query(self.sql("product", "update")?)
            .bind(product.id)
            .bind(product.sku.as_str())
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price.as_decimal())
            .bind(product.quantity)
            .bind(&product.category)
            .bind(product.status.as_str())
            .bind(Utc::now())
            .bind(product.version)
            .execute(self.pool.as_ref())
            .await?
            .rows_affected();

        if affected == 0 {
            Ok(WriteOutcome::Stale)
        } else {
            Ok(WriteOutcome::Applied {
                new_version: product.version + 1,
            })
        }
    }

    async fn adjust_quantity(
        &self,
        id: ProductId,
        delta: i32,
        expected_version: i32,
    ) -> Result<AdjustOutcome, StoreError> {
        let affected = sqlx::query(self.sql("product", "adjustQuantity")?)
            .bind(id)
            .bind(delta)
            .bind(Utc::now())
            .bind(expected_version)
            .execute(self.pool.as_ref())
            .await?
            .rows_affected();

        if affected > 0 {
            return Ok(AdjustOutcome::Applied {
                new_version: expected_version + 1,
            });
        }

        // The conditional update matched nothing; classify with a diagnostic
        // read of the row's committed state
        let row = sqlx::query(self.sql("product", "findStock")?)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or_else(|| StoreError::not_found("product", id))?;

        let version: i32 = row.try_get("version").map_err(db_err)?;
        let quantity: i32 = row.try_get("quantity").map_err(db_err)?;

        if version == expected_version && quantity + delta < 0 {
            Ok(AdjustOutcome::InsufficientStock)
        } else {
            Ok(AdjustOutcome::Stale)
        }
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        let affected = sqlx::query(self.sql("product", "delete")?)
            .bind(id)
            .bind(Utc::now())
            .execute(self.pool.as_ref())
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}

// =============================================================================
// OrderRepository
// =============================================================================

#[async_trait]
impl OrderRepository for PgStore {
    /// Order insert, item inserts, and per-line inventory decrements run in
    /// one transaction. Returning early on a failed decrement drops the
    /// transaction, which rolls everything back.
    async fn create(&self, order: &Order) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let order_id: i64 = sqlx::query_scalar(self.sql("order", "create")?)
            .bind(order.order_number.as_str())
            .bind(order.user_id)
            .bind(order.total_amount)
            .bind(order.status.as_str())
            .bind(&order.shipping_address)
            .bind(&order.billing_address)
            .bind(order.order_date)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        let mut stored = order.clone();
        stored.id = order_id;
        stored.version = 1;
        stored.created_at = now;
        stored.updated_at = now;

        for item in &mut stored.items {
            item.order_id = order_id;

            let item_id: i64 = sqlx::query_scalar(self.sql("order", "createItem")?)
                .bind(order_id)
                .bind(item.product_id)
                .bind(item.quantity)
                .bind(item.unit_price.as_decimal())
                .bind(item.total_price)
                .fetch_one(&mut *tx)
                .await?;
            item.id = item_id;

            // Reserve stock against the product's current version, re-read
            // at adjustment time
            let stock = sqlx::query(self.sql("product", "findStock")?)
                .bind(item.product_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| StoreError::not_found("product", item.product_id))?;

            let version: i32 = stock.try_get("version").map_err(db_err)?;
            let quantity: i32 = stock.try_get("quantity").map_err(db_err)?;

            if quantity < item.quantity {
                return Err(StoreError::InsufficientStock {
                    product_id: item.product_id,
                });
            }

            let affected = sqlx::query(self.sql("product", "adjustQuantity")?)
                .bind(item.product_id)
                .bind(-item.quantity)
                .bind(now)
                .bind(version)
                .execute(&mut *tx)
                .await?
                .rows_affected();

            if affected == 0 {
                return Err(StoreError::stale("product", item.product_id));
            }
        }

        tx.commit().await?;
        Ok(stored)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(self.sql("order", "findById")?)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        match row.as_ref().map(parse_order_row).transpose()? {
            Some(mut order) => {
                order.items = self.find_items(order.id).await?;
                Ok(Some(order))
            },
            None => Ok(None),
        }
    }

    async fn find_by_order_number(&self, order_number: &str) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(self.sql("order", "findByOrderNumber")?)
            .bind(order_number)
            .fetch_optional(self.pool.as_ref())
            .await?;

        match row.as_ref().map(parse_order_row).transpose()? {
            Some(mut order) => {
                order.items = self.find_items(order.id).await?;
                Ok(Some(order))
            },
            None => Ok(None),
        }
    }

    async fn find_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
        let rows = sqlx::query(self.sql("order", "findItems")?)
            .bind(order_id)
            .fetch_all(self.pool.as_ref())
            .await?;
        rows.iter().map(parse_item_row).collect()
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Vec<Order>, StoreError> {
        let sql = self.paged_sql("order", "findAll", page)?;
        let rows = sqlx::query(&sql).fetch_all(self.pool.as_ref()).await?;

        let mut orders: Vec<Order> = rows.iter().map(parse_order_row).collect::<Result<_, _>>()?;
        for order in &mut orders {
            order.items = self.find_items(order.id).await?;
        }
        Ok(orders)
    }

    async fn find_by_user(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> Result<Vec<Order>, StoreError> {
        let sql = self.paged_sql("order", "findByUserId", page)?;
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(self.pool.as_ref())
            .await?;

        let mut orders: Vec<Order> = rows.iter().map(parse_order_row).collect::<Result<_, _>>()?;
        for order in &mut orders {
            order.items = self.find_items(order.id).await?;
        }
        Ok(orders)
    }

    async fn find_by_status(
        &self,
        status: OrderStatus,
        page: &PageRequest,
    ) -> Result<Vec<Order>, StoreError> {
        let sql = self.paged_sql("order", "findByStatus", page)?;
        let rows = sqlx::query(&sql)
            .bind(status.as_str())
            .fetch_all(self.pool.as_ref())
            .await?;

        let mut orders: Vec<Order> = rows.iter().map(parse_order_row).collect::<Result<_, _>>()?;
        for order in &mut orders {
            order.items = self.find_items(order.id).await?;
        }
        Ok(orders)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(sqlx::query_scalar(self.sql("order", "count")?)
            .fetch_one(self.pool.as_ref())
            .await?)
    }

    async fn count_by_user(&self, user_id: UserId) -> Result<i64, StoreError> {
        Ok(sqlx::query_scalar(self.sql("order", "countByUserId")?)
            .bind(user_id)
            .fetch_one(self.pool.as_ref())
            .await?)
    }

    async fn update(&self, order: &Order) -> Result<WriteOutcome, StoreError> {
        let affected = sqlx::query(self.sql("order", "update")?)
            .bind(order.id)
            .bind(order.status.as_str())
            .bind(&order.shipping_address)
            .bind(&order.billing_address)
            .bind(Utc::now())
            .bind(order.version)
            .execute(self.pool.as_ref())
            .await?
            .rows_affected();

        if affected == 0 {
            Ok(WriteOutcome::Stale)
        } else {
            Ok(WriteOutcome::Applied {
                new_version: order.version + 1,
            })
        }
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        expected_version: i32,
    ) -> Result<WriteOutcome, StoreError> {
        let affected = sqlx::query(self.sql("order", "updateStatus")?)
            .bind(id)
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(expected_version)
            .execute(self.pool.as_ref())
            .await?
            .rows_affected();

        if affected == 0 {
            Ok(WriteOutcome::Stale)
        } else {
            Ok(WriteOutcome::Applied {
                new_version: expected_version + 1,
            })
        }
    }

    async fn delete(&self, id: OrderId) -> Result<bool, StoreError> {
        let affected = sqlx::query(self.sql("order", "delete")?)
            .bind(id)
            .bind(Utc::now())
            .execute(self.pool.as_ref())
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}

impl Store for PgStore {
    fn users(&self) -> &dyn UserRepository {
        self
    }

    fn products(&self) -> &dyn ProductRepository {
        self
    }

    fn orders(&self) -> &dyn OrderRepository {
        self
    }
}

// =============================================================================
// Tests
// =============================================================================
