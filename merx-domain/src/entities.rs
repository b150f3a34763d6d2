//! Domain entities for Merx
//!
//! Core business entities with identity, audit fields, a soft-delete flag,
//! and a monotonic version used for optimistic locking. Versions start at 1
//! and are incremented by the storage layer on every successful write.

use crate::status::{OrderStatus, ProductStatus, UserRole, UserStatus};
use crate::value_objects::{Email, OrderNumber, Price, Sku};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Unique identifier for a User
pub type UserId = i64;

/// Unique identifier for a Product
pub type ProductId = i64;

/// Unique identifier for an Order
pub type OrderId = i64;

/// Unique identifier for an OrderItem
pub type OrderItemId = i64;

// =============================================================================
// User
// =============================================================================

/// User account. Referenced by orders by ID only; never owned by them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// 0 until the row is persisted and a key is generated
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub status: UserStatus,
    pub role: UserRole,

    // Audit
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    pub version: i32,
}

impl User {
    /// Create a new unpersisted user with default status and role
    pub fn new(email: Email, first_name: String, last_name: String, phone: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            email,
            first_name,
            last_name,
            phone,
            status: UserStatus::Active,
            role: UserRole::User,
            created_at: now,
            updated_at: now,
            deleted: false,
            version: 1,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// =============================================================================
// Product
// =============================================================================

/// Product in the catalog.
///
/// # Invariants
/// - `quantity` is never negative
/// - A versioned write succeeds only when the caller's version matches the
///   stored one, after which the version is incremented
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: Sku,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub quantity: i32,
    pub category: Option<String>,
    pub status: ProductStatus,

    // Audit
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    pub version: i32,
}

impl Product {
    /// Create a new unpersisted product with ACTIVE status
    pub fn new(
        sku: Sku,
        name: String,
        description: Option<String>,
        price: Price,
        quantity: i32,
        category: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            sku,
            name,
            description,
            price,
            quantity,
            category,
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
            deleted: false,
            version: 1,
        }
    }

    /// True if `requested` units can be reserved from current stock
    pub fn has_stock(&self, requested: i32) -> bool {
        self.quantity >= requested
    }
}

// =============================================================================
// Order
// =============================================================================

/// Customer order. Exclusively owns its items: they are created with the
/// order, loaded with it, and have no independent API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub user_id: UserId,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub shipping_address: Option<String>,
    pub billing_address: Option<String>,
    pub order_date: DateTime<Utc>,
    pub items: Vec<OrderItem>,

    // Audit
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    pub version: i32,
}

impl Order {
    /// Create a new unpersisted PENDING order with a fresh order number
    pub fn new(
        user_id: UserId,
        total_amount: Decimal,
        shipping_address: Option<String>,
        billing_address: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            order_number: OrderNumber::generate(),
            user_id,
            total_amount,
            status: OrderStatus::Pending,
            shipping_address,
            billing_address,
            order_date: now,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted: false,
            version: 1,
        }
    }

    /// Sum of line totals over the attached items
    pub fn computed_total(&self) -> Decimal {
        self.items.iter().map(|item| item.total_price).sum()
    }
}

// =============================================================================
// OrderItem
// =============================================================================

/// One product/quantity/price line within an order.
///
/// `unit_price` is a snapshot taken at order time; the line is immutable
/// after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Price,
    pub total_price: Decimal,
}

impl OrderItem {
    /// Create a new unpersisted line; `total_price` is derived
    pub fn new(product_id: ProductId, quantity: i32, unit_price: Price) -> Self {
        Self {
            id: 0,
            order_id: 0,
            product_id,
            quantity,
            unit_price,
            total_price: unit_price.line_total(quantity),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn price(value: Decimal) -> Price {
        Price::new(value).unwrap()
    }

    #[test]
    fn test_new_entities_start_at_version_one() {
        let user = User::new(
            Email::new("bob@example.com").unwrap(),
            "Bob".to_string(),
            "Jones".to_string(),
            None,
        );
        assert_eq!(user.version, 1);
        assert!(!user.deleted);
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.role, UserRole::User);

        let product = Product::new(
            Sku::new("SKU-1").unwrap(),
            "Widget".to_string(),
            None,
            price(dec!(9.99)),
            5,
            None,
        );
        assert_eq!(product.version, 1);
        assert_eq!(product.status, ProductStatus::Active);
    }

    #[test]
    fn test_user_full_name() {
        let user = User::new(
            Email::new("bob@example.com").unwrap(),
            "Bob".to_string(),
            "Jones".to_string(),
            None,
        );
        assert_eq!(user.full_name(), "Bob Jones");
    }

    #[test]
    fn test_product_stock_check() {
        let product = Product::new(
            Sku::new("SKU-1").unwrap(),
            "Widget".to_string(),
            None,
            price(dec!(10)),
            10,
            None,
        );
        assert!(product.has_stock(10));
        assert!(product.has_stock(3));
        assert!(!product.has_stock(11));
    }

    #[test]
    fn test_order_item_total_is_derived() {
        let item = OrderItem::new(7, 3, price(dec!(10.00)));
        assert_eq!(item.total_price, dec!(30.00));
    }

    #[test]
    fn test_order_total_matches_item_sum() {
        let mut order = Order::new(1, dec!(50.00), None, None);
        order.items.push(OrderItem::new(1, 2, price(dec!(10.00))));
        order.items.push(OrderItem::new(2, 3, price(dec!(10.00))));

        assert_eq!(order.computed_total(), dec!(50.00));
        assert_eq!(order.computed_total(), order.total_amount);
    }

    #[test]
    fn test_new_order_is_pending_with_generated_number() {
        let order = Order::new(1, dec!(0), None, None);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.order_number.as_str().starts_with("ORD-"));
        assert_eq!(order.version, 1);
        assert!(!order.deleted);
    }
}
