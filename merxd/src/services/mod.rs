//! Business logic services.
//!
//! One service per aggregate, generic over the [`Store`] implementation so
//! tests run against the in-memory store and the daemon runs against
//! PostgreSQL. Services own request validation, natural-key conflict checks,
//! the order lifecycle rules, and the translation of storage outcomes into
//! the service error taxonomy.

pub mod orders;
pub mod products;
pub mod users;

pub use orders::{
    CreateOrderRequest, OrderItemRequest, OrderItemResponse, OrderResponse, OrderService,
    UpdateOrderRequest, UpdateOrderStatusRequest,
};
pub use products::{
    AdjustQuantityRequest, CreateProductRequest, ProductResponse, ProductService,
    UpdateProductRequest,
};
pub use users::{CreateUserRequest, UpdateUserRequest, UserResponse, UserService};
