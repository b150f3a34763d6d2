//! Value Objects for the Merx domain
//!
//! Immutable, validated domain primitives.
//! All value objects enforce invariants at construction time.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Domain errors for value object and state machine validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Email must have a local part and a domain
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// SKU must be non-empty and use the allowed character set
    #[error("Invalid SKU: {0}")]
    InvalidSku(String),

    /// Price must be non-negative
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    /// Order number must match the ORD-XXXXXXXX format
    #[error("Invalid order number: {0}")]
    InvalidOrderNumber(String),

    /// Unknown status or role literal
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// Transition not present in the order lifecycle table
    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: crate::status::OrderStatus,
        to: crate::status::OrderStatus,
    },

    /// DELIVERED and CANCELLED accept no further transitions
    #[error("Cannot change status of {0} order")]
    TerminalStatus(crate::status::OrderStatus),

    /// Quantity must be at least 1 for an order line
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
}

// =============================================================================
// Email
// =============================================================================

/// Email represents a syntactically plausible email address.
///
/// # Invariants
/// - Exactly one `@` with non-empty local part and domain
/// - No whitespace
/// - At most 255 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Create a new Email with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidEmail` if the format is not plausible
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.len() > 255 {
            return Err(DomainError::InvalidEmail("Email exceeds 255 characters".to_string()));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidEmail("Email must not contain whitespace".to_string()));
        }

        let mut parts = value.splitn(2, '@');
        let local = parts.next().unwrap_or_default();
        let domain = parts.next().unwrap_or_default();

        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(DomainError::InvalidEmail(format!("Not a valid address: {}", value)));
        }

        Ok(Self(value))
    }

    /// Get the address as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Sku
// =============================================================================

/// Sku is a product's unique stock keeping unit.
///
/// # Invariants
/// - Non-empty, at most 64 characters
/// - Only `[A-Za-z0-9_-]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sku(String);

impl Sku {
    /// Create a new Sku with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidSku` on empty, overlong, or
    /// out-of-alphabet input
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.is_empty() {
            return Err(DomainError::InvalidSku("SKU must not be empty".to_string()));
        }
        if value.len() > 64 {
            return Err(DomainError::InvalidSku("SKU exceeds 64 characters".to_string()));
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(DomainError::InvalidSku(format!(
                "SKU may only contain alphanumerics, '_' and '-': {}",
                value
            )));
        }

        Ok(Self(value))
    }

    /// Get the SKU as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Price
// =============================================================================

/// Price represents a non-negative decimal money amount.
///
/// # Invariants
/// - Must be >= 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPrice` if value < 0
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value < Decimal::ZERO {
            return Err(DomainError::InvalidPrice("Price must not be negative".to_string()));
        }
        Ok(Self(value))
    }

    /// Get the underlying Decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Zero price
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Line total for a quantity of units at this price
    pub fn line_total(&self, quantity: i32) -> Decimal {
        self.0 * Decimal::from(quantity)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// OrderNumber
// =============================================================================

/// OrderNumber is the human-facing unique order reference.
///
/// Format: `ORD-` followed by an 8-character uppercase token taken from a
/// freshly generated UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generate a fresh order number
    pub fn generate() -> Self {
        let token = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
        Self(format!("ORD-{}", token))
    }

    /// Parse an existing order number (e.g. when reading from storage)
    ///
    /// # Errors
    /// Returns `DomainError::InvalidOrderNumber` if the format is wrong
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        let token = value
            .strip_prefix("ORD-")
            .ok_or_else(|| DomainError::InvalidOrderNumber(format!("Missing ORD- prefix: {}", value)))?;

        if token.len() != 8 || !token.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
            return Err(DomainError::InvalidOrderNumber(format!(
                "Expected 8 uppercase alphanumeric characters after ORD-: {}",
                value
            )));
        }

        Ok(Self(value))
    }

    /// Get the order number as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_email_accepts_plausible_addresses() {
        assert!(Email::new("alice@example.com").is_ok());
        assert!(Email::new("a.b+tag@sub.example.org").is_ok());
    }

    #[test]
    fn test_email_rejects_malformed_addresses() {
        assert!(Email::new("").is_err());
        assert!(Email::new("no-at-sign").is_err());
        assert!(Email::new("@example.com").is_err());
        assert!(Email::new("alice@").is_err());
        assert!(Email::new("ali ce@example.com").is_err());
        assert!(Email::new("a@b@c").is_err());
    }

    #[test]
    fn test_sku_validation() {
        assert!(Sku::new("WIDGET-001").is_ok());
        assert!(Sku::new("w_123").is_ok());
        assert!(Sku::new("").is_err());
        assert!(Sku::new("has space").is_err());
        assert!(Sku::new("semi;colon").is_err());
        assert!(Sku::new("x".repeat(65)).is_err());
    }

    #[test]
    fn test_price_rejects_negative() {
        assert!(Price::new(dec!(0)).is_ok());
        assert!(Price::new(dec!(19.99)).is_ok());
        assert!(Price::new(dec!(-0.01)).is_err());
    }

    #[test]
    fn test_price_line_total() {
        let price = Price::new(dec!(10.00)).unwrap();
        assert_eq!(price.line_total(3), dec!(30.00));
        assert_eq!(price.line_total(0), dec!(0.00));
    }

    #[test]
    fn test_order_number_format() {
        let number = OrderNumber::generate();
        let s = number.as_str();

        assert!(s.starts_with("ORD-"));
        assert_eq!(s.len(), 12);
        assert!(s[4..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_order_number_generation_is_unique() {
        let a = OrderNumber::generate();
        let b = OrderNumber::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_order_number_parse_round_trip() {
        let generated = OrderNumber::generate();
        let parsed = OrderNumber::parse(generated.as_str()).unwrap();
        assert_eq!(generated, parsed);

        assert!(OrderNumber::parse("ORD-12AB34CD").is_ok());
        assert!(OrderNumber::parse("ORD-12ab34cd").is_err());
        assert!(OrderNumber::parse("ORD-1234").is_err());
        assert!(OrderNumber::parse("XYZ-12AB34CD").is_err());
    }
}
