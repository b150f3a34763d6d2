//! End-to-end order lifecycle tests over the in-memory store.
//!
//! Covers creation with inventory reservation, the status state machine,
//! optimistic-concurrency conflicts, and cancellation with restoration.

use merx_store::repository::{OrderRepository, WriteOutcome};
use merx_store::{MemoryStore, Paginator, Store};
use merxd::error::ServiceError;
use merxd::services::{
    CreateOrderRequest, CreateProductRequest, CreateUserRequest, OrderItemRequest, OrderResponse,
    OrderService, ProductService, UpdateOrderRequest, UserService,
};
use merx_domain::OrderStatus;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

struct Harness {
    store: Arc<MemoryStore>,
    users: UserService<MemoryStore>,
    products: ProductService<MemoryStore>,
    orders: OrderService<MemoryStore>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let paginator = Paginator::default();
    Harness {
        users: UserService::new(Arc::clone(&store), paginator.clone()),
        products: ProductService::new(Arc::clone(&store), paginator.clone()),
        orders: OrderService::new(Arc::clone(&store), paginator),
        store,
    }
}

async fn seed_user(h: &Harness) -> i64 {
    h.users
        .create_user(CreateUserRequest {
            email: "buyer@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: None,
            role: None,
        })
        .await
        .expect("user seed")
        .id
}

async fn seed_product(h: &Harness, sku: &str, price: Decimal, quantity: i32) -> i64 {
    h.products
        .create_product(CreateProductRequest {
            sku: sku.to_string(),
            name: format!("Product {}", sku),
            description: None,
            price,
            quantity,
            category: Some("test".to_string()),
        })
        .await
        .expect("product seed")
        .id
}

async fn create_order(h: &Harness, user_id: i64, lines: &[(i64, i32)]) -> OrderResponse {
    h.orders
        .create_order(CreateOrderRequest {
            user_id,
            items: lines
                .iter()
                .map(|(product_id, quantity)| OrderItemRequest {
                    product_id: *product_id,
                    quantity: *quantity,
                })
                .collect(),
            shipping_address: Some("1 Test Lane".to_string()),
            billing_address: None,
        })
        .await
        .expect("order creation")
}

// Scenario A: qty 3 at 10.00 against stock 10
#[tokio::test]
async fn create_order_reserves_stock_and_computes_total() {
    let h = harness();
    let user_id = seed_user(&h).await;
    let product_id = seed_product(&h, "SKU-A", dec!(10.00), 10).await;

    let order = create_order(&h, user_id, &[(product_id, 3)]).await;

    assert_eq!(order.total_amount, dec!(30.00));
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.order_number.starts_with("ORD-"));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].unit_price, dec!(10.00));
    assert_eq!(order.items[0].total_price, dec!(30.00));

    let product = h.products.get_product(product_id).await.unwrap();
    assert_eq!(product.quantity, 7);
    assert_eq!(product.version, 2);
}

// Scenario B: requested quantity exceeds stock
#[tokio::test]
async fn create_order_rejects_insufficient_inventory_without_side_effects() {
    let h = harness();
    let user_id = seed_user(&h).await;
    let product_id = seed_product(&h, "SKU-B", dec!(10.00), 10).await;

    let err = h
        .orders
        .create_order(CreateOrderRequest {
            user_id,
            items: vec![OrderItemRequest {
                product_id,
                quantity: 11,
            }],
            shipping_address: None,
            billing_address: None,
        })
        .await
        .unwrap_err();

    match err {
        ServiceError::BusinessRule(message) => {
            assert!(message.contains("Insufficient inventory"), "{}", message);
        },
        other => panic!("Expected BusinessRule, got {:?}", other),
    }

    let product = h.products.get_product(product_id).await.unwrap();
    assert_eq!(product.quantity, 10);
    assert_eq!(product.version, 1);
    assert_eq!(h.store.order_count(), 0);
}

// Order total invariant over multiple lines
#[tokio::test]
async fn order_total_is_sum_of_line_totals() {
    let h = harness();
    let user_id = seed_user(&h).await;
    let p1 = seed_product(&h, "SKU-T1", dec!(19.99), 10).await;
    let p2 = seed_product(&h, "SKU-T2", dec!(5.50), 10).await;

    let order = create_order(&h, user_id, &[(p1, 2), (p2, 4)]).await;

    let expected: Decimal = order
        .items
        .iter()
        .map(|item| item.unit_price * Decimal::from(item.quantity))
        .sum();
    assert_eq!(order.total_amount, expected);
    assert_eq!(order.total_amount, dec!(61.98));
}

#[tokio::test]
async fn create_order_for_unknown_user_is_not_found() {
    let h = harness();
    let product_id = seed_product(&h, "SKU-U", dec!(10.00), 10).await;

    let err = h
        .orders
        .create_order(CreateOrderRequest {
            user_id: 999,
            items: vec![OrderItemRequest {
                product_id,
                quantity: 1,
            }],
            shipping_address: None,
            billing_address: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn create_order_with_empty_items_is_rejected() {
    let h = harness();
    let user_id = seed_user(&h).await;

    let err = h
        .orders
        .create_order(CreateOrderRequest {
            user_id,
            items: Vec::new(),
            shipping_address: None,
            billing_address: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Validation(_)));
}

// Scenario C: two writers with the same version; exactly one wins
#[tokio::test]
async fn concurrent_status_writes_with_same_version_conflict() {
    let h = harness();
    let user_id = seed_user(&h).await;
    let product_id = seed_product(&h, "SKU-C", dec!(10.00), 10).await;
    let order = create_order(&h, user_id, &[(product_id, 1)]).await;

    let first = h
        .store
        .orders()
        .update_status(order.id, OrderStatus::Confirmed, order.version)
        .await
        .unwrap();
    assert_eq!(first, WriteOutcome::Applied { new_version: order.version + 1 });

    let second = h
        .store
        .orders()
        .update_status(order.id, OrderStatus::Confirmed, order.version)
        .await
        .unwrap();
    assert_eq!(second, WriteOutcome::Stale);
}

#[tokio::test]
async fn stale_service_update_surfaces_conflict() {
    let h = harness();
    let user_id = seed_user(&h).await;
    let product_id = seed_product(&h, "SKU-C2", dec!(10.00), 10).await;
    let order = create_order(&h, user_id, &[(product_id, 1)]).await;

    // A concurrent writer consumes version 1
    h.store
        .orders()
        .update_status(order.id, OrderStatus::Confirmed, order.version)
        .await
        .unwrap();

    // A caller still holding version 1 must get a conflict, not not-found
    let err = h
        .orders
        .update_order(
            order.id,
            UpdateOrderRequest {
                status: None,
                shipping_address: Some("2 New Street".to_string()),
                billing_address: None,
                version: order.version,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn illegal_transitions_are_business_rule_violations() {
    let h = harness();
    let user_id = seed_user(&h).await;
    let product_id = seed_product(&h, "SKU-S", dec!(10.00), 10).await;
    let order = create_order(&h, user_id, &[(product_id, 1)]).await;

    // PENDING -> DELIVERED is not in the table
    let err = h
        .orders
        .update_order_status(order.id, "DELIVERED")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::BusinessRule(_)));

    // Unknown literal is a validation failure
    let err = h
        .orders
        .update_order_status(order.id, "MISPLACED")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn terminal_states_reject_all_further_transitions() {
    let h = harness();
    let user_id = seed_user(&h).await;
    let product_id = seed_product(&h, "SKU-TERM", dec!(10.00), 10).await;
    let order = create_order(&h, user_id, &[(product_id, 1)]).await;

    // Walk to DELIVERED
    h.orders.update_order_status(order.id, "CONFIRMED").await.unwrap();
    h.orders.update_order_status(order.id, "SHIPPED").await.unwrap();
    let delivered = h.orders.update_order_status(order.id, "DELIVERED").await.unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);

    let err = h
        .orders
        .update_order_status(order.id, "CONFIRMED")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::BusinessRule(_)));
}

// Scenario: status update to CANCELLED restores stock
#[tokio::test]
async fn status_update_to_cancelled_restores_inventory() {
    let h = harness();
    let user_id = seed_user(&h).await;
    let product_id = seed_product(&h, "SKU-R", dec!(10.00), 10).await;
    let order = create_order(&h, user_id, &[(product_id, 3)]).await;

    assert_eq!(h.products.get_product(product_id).await.unwrap().quantity, 7);

    let cancelled = h
        .orders
        .update_order_status(order.id, "CANCELLED")
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let product = h.products.get_product(product_id).await.unwrap();
    assert_eq!(product.quantity, 10);
}

// Scenario D: cancel a CONFIRMED order
#[tokio::test]
async fn cancel_restores_inventory_and_soft_deletes() {
    let h = harness();
    let user_id = seed_user(&h).await;
    let product_id = seed_product(&h, "SKU-D", dec!(10.00), 10).await;
    let order = create_order(&h, user_id, &[(product_id, 3)]).await;

    h.orders.update_order_status(order.id, "CONFIRMED").await.unwrap();
    assert_eq!(h.products.get_product(product_id).await.unwrap().quantity, 7);

    h.orders.cancel_order(order.id).await.unwrap();

    let product = h.products.get_product(product_id).await.unwrap();
    assert_eq!(product.quantity, 10);

    // The row is gone from the live view but still carries both marks
    let err = h.orders.get_order(order.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let raw = h.store.raw_order(order.id).expect("row should still exist");
    assert_eq!(raw.status, OrderStatus::Cancelled);
    assert!(raw.deleted);
}

// Scenario E: cancel a SHIPPED order
#[tokio::test]
async fn cancel_of_shipped_order_is_rejected_without_changes() {
    let h = harness();
    let user_id = seed_user(&h).await;
    let product_id = seed_product(&h, "SKU-E", dec!(10.00), 10).await;
    let order = create_order(&h, user_id, &[(product_id, 3)]).await;

    h.orders.update_order_status(order.id, "CONFIRMED").await.unwrap();
    h.orders.update_order_status(order.id, "SHIPPED").await.unwrap();

    let err = h.orders.cancel_order(order.id).await.unwrap_err();
    match err {
        ServiceError::BusinessRule(message) => {
            assert!(message.contains("shipped or delivered"), "{}", message);
        },
        other => panic!("Expected BusinessRule, got {:?}", other),
    }

    let product = h.products.get_product(product_id).await.unwrap();
    assert_eq!(product.quantity, 7);

    let current = h.orders.get_order(order.id).await.unwrap();
    assert_eq!(current.status, OrderStatus::Shipped);
}

// Pins the reference asymmetry: the general update path never restores stock
#[tokio::test]
async fn update_order_to_cancelled_does_not_restore_inventory() {
    let h = harness();
    let user_id = seed_user(&h).await;
    let product_id = seed_product(&h, "SKU-ASYM", dec!(10.00), 10).await;
    let order = create_order(&h, user_id, &[(product_id, 3)]).await;

    let updated = h
        .orders
        .update_order(
            order.id,
            UpdateOrderRequest {
                status: Some("CANCELLED".to_string()),
                shipping_address: None,
                billing_address: None,
                version: order.version,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, OrderStatus::Cancelled);

    // Stock stays reserved on this path
    let product = h.products.get_product(product_id).await.unwrap();
    assert_eq!(product.quantity, 7);
}

// Restoration is best-effort: a vanished product is skipped, not fatal
#[tokio::test]
async fn cancellation_proceeds_when_a_product_cannot_be_restored() {
    let h = harness();
    let user_id = seed_user(&h).await;
    let p1 = seed_product(&h, "SKU-BE1", dec!(10.00), 10).await;
    let p2 = seed_product(&h, "SKU-BE2", dec!(10.00), 10).await;
    let order = create_order(&h, user_id, &[(p1, 2), (p2, 2)]).await;

    // The second product disappears before cancellation
    h.products.delete_product(p2).await.unwrap();

    let cancelled = h
        .orders
        .update_order_status(order.id, "CANCELLED")
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    // First product restored; second skipped
    assert_eq!(h.products.get_product(p1).await.unwrap().quantity, 10);
    assert!(matches!(
        h.products.get_product(p2).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
}

#[tokio::test]
async fn orders_are_queryable_by_number_user_and_status() {
    let h = harness();
    let user_id = seed_user(&h).await;
    let product_id = seed_product(&h, "SKU-Q", dec!(10.00), 10).await;
    let order = create_order(&h, user_id, &[(product_id, 1)]).await;

    let by_number = h
        .orders
        .get_order_by_number(&order.order_number)
        .await
        .unwrap();
    assert_eq!(by_number.id, order.id);

    let page = merx_store::PageRequest::default();
    let by_user = h.orders.get_orders_by_user(user_id, &page).await.unwrap();
    assert_eq!(by_user.total_elements, 1);
    assert_eq!(by_user.content.len(), 1);

    let by_status = h.orders.get_orders_by_status("PENDING", &page).await.unwrap();
    assert_eq!(by_status.content.len(), 1);

    let none = h.orders.get_orders_by_status("SHIPPED", &page).await.unwrap();
    assert!(none.content.is_empty());
}
