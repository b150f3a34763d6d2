//! Merx Daemon Library
//!
//! REST backend for users, products, and orders over PostgreSQL.
//!
//! # Architecture
//!
//! ```text
//! HTTP (axum) → Services → Store (ports) → PostgreSQL / MemoryStore
//!                  │
//!           order state machine
//!           inventory adjustment
//! ```
//!
//! # Components
//!
//! - **API**: HTTP endpoints and error-to-status mapping
//! - **Services**: business logic (conflict checks, order lifecycle,
//!   inventory reservation and restoration)
//! - **Config**: environment-based configuration
//! - **db**: CLI subcommands for migrations and seeding
//!
//! # Example
//!
//! ```rust,ignore
//! use merxd::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     server::run(config).await
//! }
//! ```

#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod error;
pub mod server;
pub mod services;

#[cfg(feature = "postgres")]
pub mod db;

// Re-exports for convenience
pub use config::{ApiConfig, Config, DatabaseConfig, Environment};
pub use error::{ServiceError, ServiceResult};
