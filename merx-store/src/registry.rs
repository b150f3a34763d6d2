//! Named connection pool registry.
//!
//! Maps logical database names to connection pools. The mapping is built
//! once at startup from configuration and is immutable afterwards: there is
//! no runtime registration or removal, and the primary pool is fixed for the
//! process lifetime.

use crate::error::StoreError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Immutable registry of named connection pools
pub struct PoolRegistry {
    pools: HashMap<String, Arc<PgPool>>,
    primary: String,
}

impl PoolRegistry {
    /// Build a registry with a single primary pool
    pub fn new(primary_name: impl Into<String>, primary_pool: Arc<PgPool>) -> Self {
        let primary = primary_name.into();
        let mut pools = HashMap::new();
        pools.insert(primary.clone(), primary_pool);
        info!(primary = %primary, "pool registry initialized");
        Self { pools, primary }
    }

    /// Add a named pool during construction (builder style). The primary
    /// cannot be replaced.
    pub fn with_pool(mut self, name: impl Into<String>, pool: Arc<PgPool>) -> Self {
        let name = name.into();
        if name != self.primary {
            info!(name = %name, "registered datasource");
            self.pools.insert(name, pool);
        }
        self
    }

    /// Connect the primary pool from a database URL
    pub async fn connect(
        primary_name: impl Into<String>,
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to connect: {}", e)))?;

        Ok(Self::new(primary_name, Arc::new(pool)))
    }

    /// Name of the primary datasource
    pub fn primary_name(&self) -> &str {
        &self.primary
    }

    /// The primary pool
    pub fn primary(&self) -> Arc<PgPool> {
        // The constructor guarantees the primary entry exists
        Arc::clone(&self.pools[&self.primary])
    }

    /// Look up a pool by logical name
    ///
    /// # Errors
    /// Returns `StoreError::Connection` for an unregistered name
    pub fn get(&self, name: &str) -> Result<Arc<PgPool>, StoreError> {
        self.pools
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::Connection(format!("No datasource registered as '{}'", name)))
    }

    /// Registered datasource names
    pub fn names(&self) -> Vec<&str> {
        self.pools.keys().map(String::as_str).collect()
    }

    /// Check if a datasource is registered
    pub fn has(&self, name: &str) -> bool {
        self.pools.contains_key(name)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // connect_lazy builds a pool handle without touching the network
    fn lazy_pool(db: &str) -> Arc<PgPool> {
        let pool = PgPoolOptions::new()
            .connect_lazy(&format!("postgres://localhost/{}", db))
            .expect("lazy pool");
        Arc::new(pool)
    }

    #[test]
    fn test_primary_is_fixed_and_cannot_be_replaced() {
        let registry = PoolRegistry::new("primary", lazy_pool("main"))
            .with_pool("primary", lazy_pool("impostor"))
            .with_pool("reporting", lazy_pool("reporting"));

        assert_eq!(registry.primary_name(), "primary");
        assert!(registry.has("primary"));
        assert!(registry.has("reporting"));
        assert_eq!(registry.names().len(), 2);
    }

    #[test]
    fn test_unknown_name_is_a_connection_error() {
        let registry = PoolRegistry::new("primary", lazy_pool("main"));

        assert!(registry.get("primary").is_ok());
        match registry.get("nope") {
            Err(StoreError::Connection(message)) => {
                assert!(message.contains("nope"), "{}", message);
            },
            other => panic!("Expected Connection error, got {:?}", other.map(|_| ())),
        }
    }
}
