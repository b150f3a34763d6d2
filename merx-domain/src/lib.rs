//! Merx Domain
//!
//! Core business entities and value objects for the Merx commerce backend.
//!
//! This crate is pure: no I/O, no async, no database coupling. Everything
//! here enforces its invariants at construction time so the storage and
//! service layers can rely on values being well-formed.
//!
//! # Components
//!
//! - **Entities**: User, Product, Order, OrderItem (with audit fields,
//!   soft-delete flag, and optimistic-locking version)
//! - **Value Objects**: Email, Sku, Price, OrderNumber
//! - **Status enums**: UserStatus, UserRole, ProductStatus, OrderStatus
//!   (including the order lifecycle transition table)

#![warn(clippy::all)]

pub mod entities;
pub mod status;
pub mod value_objects;

// Re-exports for convenience
pub use entities::{Order, OrderId, OrderItem, OrderItemId, Product, ProductId, User, UserId};
pub use status::{OrderStatus, ProductStatus, UserRole, UserStatus};
pub use value_objects::{DomainError, Email, OrderNumber, Price, Sku};
