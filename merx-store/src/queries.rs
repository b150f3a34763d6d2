//! Embedded SQL query catalog
//!
//! Named SQL fragments keyed by `(module, operation)`, mirroring the on-disk
//! layout `sql/{module}/{operation}.sql`. The files are embedded at compile
//! time, so a missing file is a build failure and a missing key at runtime is
//! a configuration error, never a per-request retryable condition.
//!
//! The catalog is an explicit value constructed once at startup and passed by
//! reference into the stores; there is no process-wide mutable cache.

use crate::error::StoreError;
use std::collections::HashMap;

/// All embedded SQL fragments as (module, operation, raw text)
static EMBEDDED: &[(&str, &str, &str)] = &[
    // user
    ("user", "create", include_str!("../sql/user/create.sql")),
    ("user", "findById", include_str!("../sql/user/findById.sql")),
    ("user", "findByEmail", include_str!("../sql/user/findByEmail.sql")),
    ("user", "findAll", include_str!("../sql/user/findAll.sql")),
    ("user", "findByStatus", include_str!("../sql/user/findByStatus.sql")),
    ("user", "searchByName", include_str!("../sql/user/searchByName.sql")),
    ("user", "count", include_str!("../sql/user/count.sql")),
    ("user", "countByStatus", include_str!("../sql/user/countByStatus.sql")),
    ("user", "existsById", include_str!("../sql/user/existsById.sql")),
    ("user", "existsByEmail", include_str!("../sql/user/existsByEmail.sql")),
    ("user", "update", include_str!("../sql/user/update.sql")),
    ("user", "delete", include_str!("../sql/user/delete.sql")),
    // product
    ("product", "create", include_str!("../sql/product/create.sql")),
    ("product", "findById", include_str!("../sql/product/findById.sql")),
    ("product", "findBySku", include_str!("../sql/product/findBySku.sql")),
    ("product", "findAll", include_str!("../sql/product/findAll.sql")),
    ("product", "findByCategory", include_str!("../sql/product/findByCategory.sql")),
    ("product", "searchByName", include_str!("../sql/product/searchByName.sql")),
    ("product", "count", include_str!("../sql/product/count.sql")),
    ("product", "countByCategory", include_str!("../sql/product/countByCategory.sql")),
    ("product", "existsById", include_str!("../sql/product/existsById.sql")),
    ("product", "existsBySku", include_str!("../sql/product/existsBySku.sql")),
    ("product", "update", include_str!("../sql/product/update.sql")),
    ("product", "adjustQuantity", include_str!("../sql/product/adjustQuantity.sql")),
    ("product", "findStock", include_str!("../sql/product/findStock.sql")),
    ("product", "delete", include_str!("../sql/product/delete.sql")),
    // order
    ("order", "create", include_str!("../sql/order/create.sql")),
    ("order", "createItem", include_str!("../sql/order/createItem.sql")),
    ("order", "findById", include_str!("../sql/order/findById.sql")),
    ("order", "findByOrderNumber", include_str!("../sql/order/findByOrderNumber.sql")),
    ("order", "findItems", include_str!("../sql/order/findItems.sql")),
    ("order", "findAll", include_str!("../sql/order/findAll.sql")),
    ("order", "findByUserId", include_str!("../sql/order/findByUserId.sql")),
    ("order", "findByStatus", include_str!("../sql/order/findByStatus.sql")),
    ("order", "count", include_str!("../sql/order/count.sql")),
    ("order", "countByUserId", include_str!("../sql/order/countByUserId.sql")),
    ("order", "update", include_str!("../sql/order/update.sql")),
    ("order", "updateStatus", include_str!("../sql/order/updateStatus.sql")),
    ("order", "delete", include_str!("../sql/order/delete.sql")),
];

/// Catalog of named SQL fragments
#[derive(Debug, Clone)]
pub struct QueryCatalog {
    entries: HashMap<(String, String), String>,
}

impl QueryCatalog {
    /// Build the catalog from the embedded SQL files, normalizing each
    /// fragment (comments stripped, whitespace collapsed).
    pub fn embedded() -> Self {
        let mut entries = HashMap::with_capacity(EMBEDDED.len());
        for (module, operation, raw) in EMBEDDED {
            entries.insert(
                (module.to_string(), operation.to_string()),
                normalize_sql(raw),
            );
        }
        Self { entries }
    }

    /// Get a fragment by module and operation.
    ///
    /// # Errors
    /// Returns `StoreError::QueryText` when the key is not registered.
    pub fn get(&self, module: &str, operation: &str) -> Result<&str, StoreError> {
        self.entries
            .get(&(module.to_string(), operation.to_string()))
            .map(String::as_str)
            .ok_or_else(|| StoreError::QueryText {
                module: module.to_string(),
                operation: operation.to_string(),
            })
    }

    /// Check if a fragment is registered
    pub fn contains(&self, module: &str, operation: &str) -> bool {
        self.entries
            .contains_key(&(module.to_string(), operation.to_string()))
    }

    /// Number of registered fragments
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for QueryCatalog {
    fn default() -> Self {
        Self::embedded()
    }
}

/// Strip `--` comments and collapse whitespace into single spaces
fn normalize_sql(raw: &str) -> String {
    let without_comments: Vec<&str> = raw
        .lines()
        .map(|line| match line.find("--") {
            Some(idx) => &line[..idx],
            None => line,
        })
        .collect();

    without_comments
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_catalog_is_fully_populated() {
        let catalog = QueryCatalog::embedded();
        assert_eq!(catalog.len(), EMBEDDED.len());

        for (module, operation, _) in EMBEDDED {
            assert!(
                catalog.contains(module, operation),
                "missing {}/{}",
                module,
                operation
            );
        }
    }

    #[test]
    fn test_missing_key_is_a_query_text_error() {
        let catalog = QueryCatalog::embedded();
        match catalog.get("user", "findByShoeSize") {
            Err(StoreError::QueryText { module, operation }) => {
                assert_eq!(module, "user");
                assert_eq!(operation, "findByShoeSize");
            },
            other => panic!("Expected QueryText error, got {:?}", other),
        }
    }

    #[test]
    fn test_normalization_strips_comments_and_whitespace() {
        let normalized = normalize_sql("-- leading comment\nSELECT 1,\n       2 -- trailing\nFROM t\n");
        assert_eq!(normalized, "SELECT 1, 2 FROM t");
    }

    #[test]
    fn test_fragments_are_normalized() {
        let catalog = QueryCatalog::embedded();
        let sql = catalog.get("product", "adjustQuantity").unwrap();

        assert!(!sql.contains("--"));
        assert!(!sql.contains('\n'));
        assert!(sql.contains("quantity + $2 >= 0"));
        assert!(sql.contains("version = $4"));
    }
}
