//! Storage layer errors

use thiserror::Error;

/// Errors that can occur in the storage layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found (absent or soft-deleted)
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity (user, product, order)
        entity_type: String,
        /// Entity ID or natural key
        id: String,
    },

    /// Unique constraint violation (duplicate email, SKU, order number)
    #[error("Duplicate entity: {entity_type} with key {key}")]
    Duplicate {
        /// Type of entity
        entity_type: String,
        /// Conflicting natural key
        key: String,
    },

    /// Optimistic-lock failure: the supplied version no longer matches the
    /// stored row. The row exists; callers must surface this as a conflict,
    /// never as not-found.
    #[error("Stale version for {entity_type} with id {id}")]
    StaleVersion {
        /// Type of entity
        entity_type: String,
        /// Entity ID
        id: String,
    },

    /// Inventory adjustment would drive a product's quantity negative
    #[error("Insufficient stock for product {product_id}")]
    InsufficientStock {
        /// Product whose stock could not cover the delta
        product_id: i64,
    },

    /// Named SQL fragment missing from the catalog. Configuration error,
    /// fatal at first use.
    #[error("No SQL registered for {module}/{operation}")]
    QueryText {
        /// Module key (user, product, order)
        module: String,
        /// Operation key (create, findById, ...)
        operation: String,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Connection error (pool lookup, backend unreachable)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Row could not be mapped back into a domain entity
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Domain error passthrough
    #[error("Domain error: {0}")]
    Domain(#[from] merx_domain::DomainError),
}

impl StoreError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Create a duplicate error
    pub fn duplicate(entity_type: impl Into<String>, key: impl ToString) -> Self {
        Self::Duplicate {
            entity_type: entity_type.into(),
            key: key.to_string(),
        }
    }

    /// Create a stale version error
    pub fn stale(entity_type: impl Into<String>, id: impl ToString) -> Self {
        Self::StaleVersion {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound {
                entity_type: "unknown".to_string(),
                id: "unknown".to_string(),
            },
            sqlx::Error::Database(db_err) => {
                // Unique constraint violation
                if db_err.code().map(|c| c == "23505").unwrap_or(false) {
                    StoreError::Duplicate {
                        entity_type: "unknown".to_string(),
                        key: db_err.constraint().unwrap_or("unknown").to_string(),
                    }
                } else {
                    StoreError::Database(db_err.to_string())
                }
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Connection(err.to_string())
            },
            _ => StoreError::Database(err.to_string()),
        }
    }
}
