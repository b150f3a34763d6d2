//! In-memory store implementation
//!
//! Used for testing and development without a database.
//! Thread-safe using RwLock for concurrent access.
//!
//! Versioned writes and inventory adjustments take the relevant write lock
//! for the whole check-and-apply, giving the same atomicity the SQL backend
//! gets from conditional updates. List operations order by id; the sort
//! column of a page request is honored by the SQL backend only.

use crate::error::StoreError;
use crate::pagination::PageRequest;
use crate::repository::{
    AdjustOutcome, OrderRepository, ProductRepository, Store, UserRepository, WriteOutcome,
};
use async_trait::async_trait;
use chrono::Utc;
use merx_domain::{
    Order, OrderId, OrderItem, OrderStatus, Product, ProductId, User, UserId, UserStatus,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;
use tracing::debug;

/// In-memory store for testing
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    products: RwLock<HashMap<ProductId, Product>>,
    orders: RwLock<HashMap<OrderId, Order>>,
    next_user_id: AtomicI64,
    next_product_id: AtomicI64,
    next_order_id: AtomicI64,
    next_item_id: AtomicI64,
}

impl MemoryStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            products: RwLock::new(HashMap::new()),
            orders: RwLock::new(HashMap::new()),
            next_user_id: AtomicI64::new(1),
            next_product_id: AtomicI64::new(1),
            next_order_id: AtomicI64::new(1),
            next_item_id: AtomicI64::new(1),
        }
    }

    /// Number of live (not soft-deleted) users
    pub fn user_count(&self) -> usize {
        self.users.read().unwrap().values().filter(|u| !u.deleted).count()
    }

    /// Number of live products
    pub fn product_count(&self) -> usize {
        self.products.read().unwrap().values().filter(|p| !p.deleted).count()
    }

    /// Number of live orders
    pub fn order_count(&self) -> usize {
        self.orders.read().unwrap().values().filter(|o| !o.deleted).count()
    }

    /// Clear all data (useful for test setup)
    pub fn clear(&self) {
        self.users.write().unwrap().clear();
        self.products.write().unwrap().clear();
        self.orders.write().unwrap().clear();
        self.next_user_id.store(1, Ordering::SeqCst);
        self.next_product_id.store(1, Ordering::SeqCst);
        self.next_order_id.store(1, Ordering::SeqCst);
        self.next_item_id.store(1, Ordering::SeqCst);
    }

    /// Read a soft-deleted or live order regardless of the deleted flag.
    /// Cancellation marks the row deleted and tests need to observe it.
    pub fn raw_order(&self, id: OrderId) -> Option<Order> {
        self.orders.read().unwrap().get(&id).cloned()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Slice one id-ordered page out of a filtered set
fn paginate<T, F>(mut matched: Vec<T>, page: &PageRequest, id_of: F) -> Vec<T>
where
    F: Fn(&T) -> i64,
{
    matched.sort_by_key(|entity| id_of(entity));

    let offset = page.offset().max(0) as usize;
    let size = page.size.max(0) as usize;

    matched.into_iter().skip(offset).take(size).collect()
}

// =============================================================================
// UserRepository
// =============================================================================

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &User) -> Result<User, StoreError> {
        let mut users = self.users.write().unwrap();

        if users
            .values()
            .any(|u| !u.deleted && u.email == user.email)
        {
            return Err(StoreError::duplicate("user", user.email.as_str()));
        }

        let mut stored = user.clone();
        stored.id = self.next_user_id.fetch_add(1, Ordering::SeqCst);
        stored.version = 1;
        users.insert(stored.id, stored.clone());

        Ok(stored)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let users = self.users.read().unwrap();
        Ok(users.get(&id).filter(|u| !u.deleted).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().unwrap();
        Ok(users
            .values()
            .find(|u| !u.deleted && u.email.as_str() == email)
            .cloned())
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().unwrap();
        let matched: Vec<User> = users.values().filter(|u| !u.deleted).cloned().collect();
        Ok(paginate(matched, page, |u| u.id))
    }

    async fn find_by_status(
        &self,
        status: UserStatus,
        page: &PageRequest,
    ) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().unwrap();
        let matched: Vec<User> = users
            .values()
            .filter(|u| !u.deleted && u.status == status)
            .cloned()
            .collect();
        Ok(paginate(matched, page, |u| u.id))
    }

    async fn search_by_name(
        &self,
        term: &str,
        page: &PageRequest,
    ) -> Result<Vec<User>, StoreError> {
        let needle = term.to_lowercase();
        let users = self.users.read().unwrap();
        let matched: Vec<User> = users
            .values()
            .filter(|u| {
                !u.deleted
                    && (u.first_name.to_lowercase().contains(&needle)
                        || u.last_name.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        Ok(paginate(matched, page, |u| u.id))
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.user_count() as i64)
    }

    async fn count_by_status(&self, status: UserStatus) -> Result<i64, StoreError> {
        let users = self.users.read().unwrap();
        Ok(users
            .values()
            .filter(|u| !u.deleted && u.status == status)
            .count() as i64)
    }

    async fn exists_by_id(&self, id: UserId) -> Result<bool, StoreError> {
        let users = self.users.read().unwrap();
        Ok(users.get(&id).map(|u| !u.deleted).unwrap_or(false))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let users = self.users.read().unwrap();
        Ok(users.values().any(|u| !u.deleted && u.email.as_str() == email))
    }

    async fn update(&self, user: &User) -> Result<WriteOutcome, StoreError> {
        let mut users = self.users.write().unwrap();

        match users.get_mut(&user.id) {
            Some(stored) if !stored.deleted && stored.version == user.version => {
                let new_version = stored.version + 1;
                let mut updated = user.clone();
                updated.version = new_version;
                updated.created_at = stored.created_at;
                updated.updated_at = Utc::now();
                *stored = updated;
                Ok(WriteOutcome::Applied { new_version })
            },
            _ => Ok(WriteOutcome::Stale),
        }
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        let mut users = self.users.write().unwrap();
        match users.get_mut(&id) {
            Some(stored) if !stored.deleted => {
                stored.deleted = true;
                stored.updated_at = Utc::now();
                Ok(true)
            },
            _ => Ok(false),
        }
    }
}

// =============================================================================
// ProductRepository
// =============================================================================

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn create(&self, product: &Product) -> Result<Product, StoreError> {
        let mut products = self.products.write().unwrap();

        if products.values().any(|p| !p.deleted && p.sku == product.sku) {
            return Err(StoreError::duplicate("product", product.sku.as_str()));
        }

        let mut stored = product.clone();
        stored.id = self.next_product_id.fetch_add(1, Ordering::SeqCst);
        stored.version = 1;
        products.insert(stored.id, stored.clone());

        Ok(stored)
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let products = self.products.read().unwrap();
        Ok(products.get(&id).filter(|p| !p.deleted).cloned())
    }

    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError> {
        let products = self.products.read().unwrap();
        Ok(products
            .values()
            .find(|p| !p.deleted && p.sku.as_str() == sku)
            .cloned())
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Vec<Product>, StoreError> {
        let products = self.products.read().unwrap();
        let matched: Vec<Product> = products.values().filter(|p| !p.deleted).cloned().collect();
        Ok(paginate(matched, page, |p| p.id))
    }

    async fn find_by_category(
        &self,
        category: &str,
        page: &PageRequest,
    ) -> Result<Vec<Product>, StoreError> {
        let products = self.products.read().unwrap();
        let matched: Vec<Product> = products
            .values()
            .filter(|p| !p.deleted && p.category.as_deref() == Some(category))
            .cloned()
            .collect();
        Ok(paginate(matched, page, |p| p.id))
    }

    async fn search_by_name(
        &self,
        term: &str,
        page: &PageRequest,
    ) -> Result<Vec<Product>, StoreError> {
        let needle = term.to_lowercase();
        let products = self.products.read().unwrap();
        let matched: Vec<Product> = products
            .values()
            .filter(|p| !p.deleted && p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        Ok(paginate(matched, page, |p| p.id))
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.product_count() as i64)
    }

    async fn count_by_category(&self, category: &str) -> Result<i64, StoreError> {
        let products = self.products.read().unwrap();
        Ok(products
            .values()
            .filter(|p| !p.deleted && p.category.as_deref() == Some(category))
            .count() as i64)
    }

    async fn exists_by_id(&self, id: ProductId) -> Result<bool, StoreError> {
        let products = self.products.read().unwrap();
        Ok(products.get(&id).map(|p| !p.deleted).unwrap_or(false))
    }

    async fn exists_by_sku(&self, sku: &str) -> Result<bool, StoreError> {
        let products = self.products.read().unwrap();
        Ok(products.values().any(|p| !p.deleted && p.sku.as_str() == sku))
    }

    async fn update(&self, product: &Product) -> Result<WriteOutcome, StoreError> {
        let mut products = self.products.write().unwrap();

        match products.get_mut(&product.id) {
            Some(stored) if !stored.deleted && stored.version == product.version => {
                let new_version = stored.version + 1;
                let mut updated = product.clone();
                updated.version = new_version;
                updated.created_at = stored.created_at;
                updated.updated_at = Utc::now();
                *stored = updated;
                Ok(WriteOutcome::Applied { new_version })
            },
            _ => Ok(WriteOutcome::Stale),
        }
    }

    async fn adjust_quantity(
        &self,
        id: ProductId,
        delta: i32,
        expected_version: i32,
    ) -> Result<AdjustOutcome, StoreError> {
        let mut products = self.products.write().unwrap();

        let stored = products
            .get_mut(&id)
            .filter(|p| !p.deleted)
            .ok_or_else(|| StoreError::not_found("product", id))?;

        if stored.version != expected_version {
            debug!(product_id = id, expected_version, actual = stored.version, "stale adjustment");
            return Ok(AdjustOutcome::Stale);
        }
        if stored.quantity + delta < 0 {
            debug!(product_id = id, delta, quantity = stored.quantity, "adjustment would go negative");
            return Ok(AdjustOutcome::InsufficientStock);
        }

        stored.quantity += delta;
        stored.version += 1;
        stored.updated_at = Utc::now();

        Ok(AdjustOutcome::Applied {
            new_version: stored.version,
        })
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        let mut products = self.products.write().unwrap();
        match products.get_mut(&id) {
            Some(stored) if !stored.deleted => {
                stored.deleted = true;
                stored.updated_at = Utc::now();
                Ok(true)
            },
            _ => Ok(false),
        }
    }
}

// =============================================================================
// OrderRepository
// =============================================================================

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn create(&self, order: &Order) -> Result<Order, StoreError> {
        // Lock order: products before orders, everywhere
        let mut products = self.products.write().unwrap();
        let mut orders = self.orders.write().unwrap();

        // Validate every decrement before applying any, so a late failure
        // leaves no partial reservation
        for item in &order.items {
            let product = products
                .get(&item.product_id)
                .filter(|p| !p.deleted)
                .ok_or_else(|| StoreError::not_found("product", item.product_id))?;

            if product.quantity < item.quantity {
                return Err(StoreError::InsufficientStock {
                    product_id: item.product_id,
                });
            }
        }

        for item in &order.items {
            if let Some(product) = products.get_mut(&item.product_id) {
                product.quantity -= item.quantity;
                product.version += 1;
                product.updated_at = Utc::now();
            }
        }

        let mut stored = order.clone();
        stored.id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
        stored.version = 1;
        for item in &mut stored.items {
            item.id = self.next_item_id.fetch_add(1, Ordering::SeqCst);
            item.order_id = stored.id;
        }
        orders.insert(stored.id, stored.clone());

        Ok(stored)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let orders = self.orders.read().unwrap();
        Ok(orders.get(&id).filter(|o| !o.deleted).cloned())
    }

    async fn find_by_order_number(&self, order_number: &str) -> Result<Option<Order>, StoreError> {
        let orders = self.orders.read().unwrap();
        Ok(orders
            .values()
            .find(|o| !o.deleted && o.order_number.as_str() == order_number)
            .cloned())
    }

    async fn find_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
        let orders = self.orders.read().unwrap();
        Ok(orders
            .get(&order_id)
            .map(|o| o.items.clone())
            .unwrap_or_default())
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().unwrap();
        let matched: Vec<Order> = orders.values().filter(|o| !o.deleted).cloned().collect();
        Ok(paginate(matched, page, |o| o.id))
    }

    async fn find_by_user(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().unwrap();
        let matched: Vec<Order> = orders
            .values()
            .filter(|o| !o.deleted && o.user_id == user_id)
            .cloned()
            .collect();
        Ok(paginate(matched, page, |o| o.id))
    }

    async fn find_by_status(
        &self,
        status: OrderStatus,
        page: &PageRequest,
    ) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().unwrap();
        let matched: Vec<Order> = orders
            .values()
            .filter(|o| !o.deleted && o.status == status)
            .cloned()
            .collect();
        Ok(paginate(matched, page, |o| o.id))
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.order_count() as i64)
    }

    async fn count_by_user(&self, user_id: UserId) -> Result<i64, StoreError> {
        let orders = self.orders.read().unwrap();
        Ok(orders
            .values()
            .filter(|o| !o.deleted && o.user_id == user_id)
            .count() as i64)
    }

    async fn update(&self, order: &Order) -> Result<WriteOutcome, StoreError> {
        let mut orders = self.orders.write().unwrap();

        match orders.get_mut(&order.id) {
            Some(stored) if !stored.deleted && stored.version == order.version => {
                let new_version = stored.version + 1;
                stored.status = order.status;
                stored.shipping_address = order.shipping_address.clone();
                stored.billing_address = order.billing_address.clone();
                stored.version = new_version;
                stored.updated_at = Utc::now();
                Ok(WriteOutcome::Applied { new_version })
            },
            _ => Ok(WriteOutcome::Stale),
        }
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        expected_version: i32,
    ) -> Result<WriteOutcome, StoreError> {
        let mut orders = self.orders.write().unwrap();

        match orders.get_mut(&id) {
            Some(stored) if !stored.deleted && stored.version == expected_version => {
                let new_version = stored.version + 1;
                stored.status = status;
                stored.version = new_version;
                stored.updated_at = Utc::now();
                Ok(WriteOutcome::Applied { new_version })
            },
            _ => Ok(WriteOutcome::Stale),
        }
    }

    async fn delete(&self, id: OrderId) -> Result<bool, StoreError> {
        let mut orders = self.orders.write().unwrap();
        match orders.get_mut(&id) {
            Some(stored) if !stored.deleted => {
                stored.deleted = true;
                stored.updated_at = Utc::now();
                Ok(true)
            },
            _ => Ok(false),
        }
    }
}

impl Store for MemoryStore {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::SortDirection;
    use merx_domain::{Email, Price, Sku};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn user(email: &str) -> User {
        User::new(
            Email::new(email).unwrap(),
            "Test".to_string(),
            "User".to_string(),
            None,
        )
    }

    fn product(sku: &str, quantity: i32) -> Product {
        Product::new(
            Sku::new(sku).unwrap(),
            format!("Product {}", sku),
            None,
            Price::new(dec!(10.00)).unwrap(),
            quantity,
            Some("tools".to_string()),
        )
    }

    fn page(size: i32) -> PageRequest {
        PageRequest::new(0, size, None, SortDirection::Asc)
    }

    #[tokio::test]
    async fn test_create_assigns_ids_and_version_one() {
        let store = MemoryStore::new();

        let saved = UserRepository::create(&store, &user("a@example.com")).await.unwrap();
        assert_eq!(saved.id, 1);
        assert_eq!(saved.version, 1);

        let saved = ProductRepository::create(&store, &product("SKU-1", 5)).await.unwrap();
        assert_eq!(saved.id, 1);
        assert_eq!(saved.version, 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_and_sku_are_rejected() {
        let store = MemoryStore::new();

        UserRepository::create(&store, &user("a@example.com")).await.unwrap();
        let err = UserRepository::create(&store, &user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));

        ProductRepository::create(&store, &product("SKU-1", 5)).await.unwrap();
        let err = ProductRepository::create(&store, &product("SKU-1", 5)).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_rows_and_keeps_version() {
        let store = MemoryStore::new();
        let saved = ProductRepository::create(&store, &product("SKU-1", 5)).await.unwrap();

        assert!(ProductRepository::delete(&store, saved.id).await.unwrap());
        assert!(ProductRepository::find_by_id(&store, saved.id).await.unwrap().is_none());
        assert!(!ProductRepository::exists_by_id(&store, saved.id).await.unwrap());

        // Version untouched by delete
        let raw = store.products.read().unwrap().get(&saved.id).cloned().unwrap();
        assert_eq!(raw.version, 1);
        assert!(raw.deleted);

        // Second delete is a no-op
        assert!(!ProductRepository::delete(&store, saved.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_update_never_mutates() {
        let store = MemoryStore::new();
        let saved = ProductRepository::create(&store, &product("SKU-1", 5)).await.unwrap();

        let mut changed = saved.clone();
        changed.name = "Renamed".to_string();
        changed.version = 99;

        let outcome = ProductRepository::update(&store, &changed).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Stale);

        let current = ProductRepository::find_by_id(&store, saved.id).await.unwrap().unwrap();
        assert_eq!(current.name, saved.name);
        assert_eq!(current.version, 1);
    }

    #[tokio::test]
    async fn test_versioned_update_increments_version() {
        let store = MemoryStore::new();
        let saved = ProductRepository::create(&store, &product("SKU-1", 5)).await.unwrap();

        let outcome = ProductRepository::update(&store, &saved).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Applied { new_version: 2 });

        // Re-issuing with the consumed version is stale
        let outcome = ProductRepository::update(&store, &saved).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Stale);
    }

    #[tokio::test]
    async fn test_adjust_quantity_applies_delta() {
        let store = MemoryStore::new();
        let saved = ProductRepository::create(&store, &product("SKU-1", 10)).await.unwrap();

        let outcome = store.adjust_quantity(saved.id, -3, 1).await.unwrap();
        assert_eq!(outcome, AdjustOutcome::Applied { new_version: 2 });

        let current = ProductRepository::find_by_id(&store, saved.id).await.unwrap().unwrap();
        assert_eq!(current.quantity, 7);
        assert_eq!(current.version, 2);
    }

    #[tokio::test]
    async fn test_adjust_quantity_rejects_negative_result_regardless_of_version() {
        let store = MemoryStore::new();
        let saved = ProductRepository::create(&store, &product("SKU-1", 10)).await.unwrap();

        let outcome = store.adjust_quantity(saved.id, -11, 1).await.unwrap();
        assert_eq!(outcome, AdjustOutcome::InsufficientStock);

        let current = ProductRepository::find_by_id(&store, saved.id).await.unwrap().unwrap();
        assert_eq!(current.quantity, 10);
        assert_eq!(current.version, 1);
    }

    #[tokio::test]
    async fn test_adjust_quantity_rejects_stale_version() {
        let store = MemoryStore::new();
        let saved = ProductRepository::create(&store, &product("SKU-1", 10)).await.unwrap();

        store.adjust_quantity(saved.id, -1, 1).await.unwrap();
        let outcome = store.adjust_quantity(saved.id, -1, 1).await.unwrap();
        assert_eq!(outcome, AdjustOutcome::Stale);

        let current = ProductRepository::find_by_id(&store, saved.id).await.unwrap().unwrap();
        assert_eq!(current.quantity, 9);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_same_version_adjustments_apply_exactly_once() {
        let store = Arc::new(MemoryStore::new());
        let saved = ProductRepository::create(store.as_ref(), &product("SKU-1", 100)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            let id = saved.id;
            handles.push(tokio::spawn(async move {
                store.adjust_quantity(id, -5, 1).await.unwrap()
            }));
        }

        let mut applied = 0;
        let mut stale = 0;
        for handle in handles {
            match handle.await.unwrap() {
                AdjustOutcome::Applied { .. } => applied += 1,
                AdjustOutcome::Stale => stale += 1,
                AdjustOutcome::InsufficientStock => panic!("unexpected stock rejection"),
            }
        }

        assert_eq!(applied, 1);
        assert_eq!(stale, 15);

        let current = ProductRepository::find_by_id(store.as_ref(), saved.id).await.unwrap().unwrap();
        assert_eq!(current.quantity, 95);
        assert_eq!(current.version, 2);
    }

    #[tokio::test]
    async fn test_order_create_decrements_stock_atomically() {
        let store = MemoryStore::new();
        let p1 = ProductRepository::create(&store, &product("SKU-1", 10)).await.unwrap();
        let p2 = ProductRepository::create(&store, &product("SKU-2", 1)).await.unwrap();

        let mut order = Order::new(1, dec!(0), None, None);
        order.items.push(OrderItem::new(p1.id, 3, p1.price));
        order.items.push(OrderItem::new(p2.id, 2, p2.price)); // exceeds stock

        let err = OrderRepository::create(&store, &order).await.unwrap_err();
        assert!(matches!(err, StoreError::InsufficientStock { product_id } if product_id == p2.id));

        // Nothing was reserved for the first line either
        let current = ProductRepository::find_by_id(&store, p1.id).await.unwrap().unwrap();
        assert_eq!(current.quantity, 10);
        assert_eq!(current.version, 1);
        assert_eq!(store.order_count(), 0);
    }

    #[tokio::test]
    async fn test_order_create_persists_items_with_ids() {
        let store = MemoryStore::new();
        let p1 = ProductRepository::create(&store, &product("SKU-1", 10)).await.unwrap();

        let mut order = Order::new(1, dec!(30.00), None, None);
        order.items.push(OrderItem::new(p1.id, 3, p1.price));

        let saved = OrderRepository::create(&store, &order).await.unwrap();
        assert_eq!(saved.items.len(), 1);
        assert!(saved.items[0].id > 0);
        assert_eq!(saved.items[0].order_id, saved.id);

        let current = ProductRepository::find_by_id(&store, p1.id).await.unwrap().unwrap();
        assert_eq!(current.quantity, 7);
        assert_eq!(current.version, 2);
    }

    #[tokio::test]
    async fn test_order_status_update_is_versioned() {
        let store = MemoryStore::new();
        let p1 = ProductRepository::create(&store, &product("SKU-1", 10)).await.unwrap();

        let mut order = Order::new(1, dec!(10.00), None, None);
        order.items.push(OrderItem::new(p1.id, 1, p1.price));
        let saved = OrderRepository::create(&store, &order).await.unwrap();

        let outcome = store
            .update_status(saved.id, OrderStatus::Confirmed, saved.version)
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Applied { new_version: 2 });

        let outcome = store
            .update_status(saved.id, OrderStatus::Cancelled, saved.version)
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Stale);
    }

    #[tokio::test]
    async fn test_pagination_slices_by_id() {
        let store = MemoryStore::new();
        for i in 0..5 {
            ProductRepository::create(&store, &product(&format!("SKU-{}", i), 1)).await.unwrap();
        }

        let first = ProductRepository::find_all(&store, &page(2)).await.unwrap();
        assert_eq!(first.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);

        let second = ProductRepository::find_all(
            &store,
            &PageRequest::new(1, 2, None, SortDirection::Asc),
        )
        .await
        .unwrap();
        assert_eq!(second.iter().map(|p| p.id).collect::<Vec<_>>(), vec![3, 4]);
    }

    #[tokio::test]
    async fn test_find_by_email_and_sku() {
        let store = MemoryStore::new();
        UserRepository::create(&store, &user("a@example.com")).await.unwrap();
        ProductRepository::create(&store, &product("SKU-1", 5)).await.unwrap();

        assert!(store.find_by_email("a@example.com").await.unwrap().is_some());
        assert!(store.find_by_email("b@example.com").await.unwrap().is_none());
        assert!(store.find_by_sku("SKU-1").await.unwrap().is_some());
        assert!(store.find_by_sku("SKU-9").await.unwrap().is_none());
    }
}
