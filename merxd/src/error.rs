//! Service-level error taxonomy.
//!
//! Four kinds surface to callers: not-found, conflict (stale version or
//! duplicate key), business-rule violation, and configuration/infrastructure
//! failure. Validation failures on request payloads are a fifth, caller-side
//! kind. Nothing here is retried by the services; a conflict is the caller's
//! signal to re-read and retry.

use merx_domain::DomainError;
use merx_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Referenced entity absent or soft-deleted
    #[error("{0}")]
    NotFound(String),

    /// Optimistic-version mismatch or unique-constraint violation
    #[error("{0}")]
    Conflict(String),

    /// Invalid status transition, insufficient inventory, illegal cancel
    #[error("{0}")]
    BusinessRule(String),

    /// Request payload failed validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Configuration error (missing query text, bad environment)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend failure (database unreachable, driver error)
    #[error("Storage error: {0}")]
    Infra(String),
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ServiceError::NotFound(err.to_string()),
            StoreError::Duplicate { .. } => ServiceError::Conflict(err.to_string()),
            StoreError::StaleVersion { .. } => ServiceError::Conflict(
                "Modified by another transaction. Please refresh and try again.".to_string(),
            ),
            StoreError::InsufficientStock { product_id } => ServiceError::BusinessRule(format!(
                "Insufficient inventory for product with ID: {}",
                product_id
            )),
            StoreError::QueryText { .. } => ServiceError::Config(err.to_string()),
            StoreError::Database(_) | StoreError::Connection(_) | StoreError::Deserialization(_) => {
                ServiceError::Infra(err.to_string())
            },
            StoreError::Domain(domain) => domain.into(),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidStatusTransition { .. } | DomainError::TerminalStatus(_) => {
                ServiceError::BusinessRule(err.to_string())
            },
            _ => ServiceError::Validation(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use merx_domain::OrderStatus;

    #[test]
    fn test_store_error_mapping() {
        let err: ServiceError = StoreError::not_found("user", 7).into();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err: ServiceError = StoreError::stale("order", 7).into();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err: ServiceError = StoreError::duplicate("product", "SKU-1").into();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err: ServiceError = StoreError::InsufficientStock { product_id: 7 }.into();
        assert!(matches!(err, ServiceError::BusinessRule(_)));

        let err: ServiceError = StoreError::QueryText {
            module: "user".into(),
            operation: "create".into(),
        }
        .into();
        assert!(matches!(err, ServiceError::Config(_)));
    }

    #[test]
    fn test_domain_error_mapping() {
        let err: ServiceError = DomainError::InvalidStatusTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Delivered,
        }
        .into();
        assert!(matches!(err, ServiceError::BusinessRule(_)));

        let err: ServiceError = DomainError::InvalidEmail("nope".into()).into();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
