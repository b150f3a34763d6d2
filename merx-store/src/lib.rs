//! Merx storage layer
//!
//! Ports and adapters between the domain and the relational backend:
//!
//! - `repository`: trait definitions (ports) plus the optimistic-locking
//!   write outcomes
//! - `pagination`: page/size normalization and SQL clause building
//! - `queries`: the embedded SQL query catalog keyed by (module, operation)
//! - `memory`: in-memory store for tests and development
//! - `postgres` (feature `postgres`): sqlx/PostgreSQL store
//! - `registry` (feature `postgres`): named connection pool registry
//!
//! Concurrency correctness is delegated to the backend's atomic conditional
//! updates (`UPDATE ... WHERE id = ? AND version = ?`); no in-process lock
//! serializes access to a row.

#![warn(clippy::all)]

pub mod error;
pub mod memory;
pub mod pagination;
pub mod queries;
pub mod repository;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub mod registry;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use pagination::{PageRequest, PageResponse, PaginationConfig, Paginator, SortDirection};
pub use queries::QueryCatalog;
pub use repository::{
    AdjustOutcome, OrderRepository, ProductRepository, Store, UserRepository, WriteOutcome,
};

#[cfg(feature = "postgres")]
pub use postgres::PgStore;

#[cfg(feature = "postgres")]
pub use registry::PoolRegistry;
