//! Status enums and the order lifecycle state machine
//!
//! All statuses are stored as SCREAMING_SNAKE text in the database and on
//! the wire; `FromStr`/`Display` round-trip through that representation.

use crate::value_objects::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// User status / role
// =============================================================================

/// Account status of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Inactive => "INACTIVE",
            UserStatus::Suspended => "SUSPENDED",
        }
    }
}

impl FromStr for UserStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(UserStatus::Active),
            "INACTIVE" => Ok(UserStatus::Inactive),
            "SUSPENDED" => Ok(UserStatus::Suspended),
            other => Err(DomainError::InvalidStatus(format!("Unknown user status: {}", other))),
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "USER",
            UserRole::Admin => "ADMIN",
        }
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(UserRole::User),
            "ADMIN" => Ok(UserRole::Admin),
            other => Err(DomainError::InvalidStatus(format!("Unknown user role: {}", other))),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Product status
// =============================================================================

/// Catalog status of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    Active,
    Inactive,
    Discontinued,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "ACTIVE",
            ProductStatus::Inactive => "INACTIVE",
            ProductStatus::Discontinued => "DISCONTINUED",
        }
    }
}

impl FromStr for ProductStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(ProductStatus::Active),
            "INACTIVE" => Ok(ProductStatus::Inactive),
            "DISCONTINUED" => Ok(ProductStatus::Discontinued),
            other => Err(DomainError::InvalidStatus(format!("Unknown product status: {}", other))),
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Order status state machine
// =============================================================================

/// Lifecycle status of an order.
///
/// Legal transitions:
///
/// ```text
/// PENDING ──► CONFIRMED ──► SHIPPED ──► DELIVERED
///    │             │
///    └──► CANCELLED ◄──┘
/// ```
///
/// DELIVERED and CANCELLED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// True if no further status change is accepted from this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// True if the order may still be cancelled from this state
    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    /// Check whether `self -> next` is in the transition table
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (*self, next),
            (OrderStatus::Pending, OrderStatus::Confirmed)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Confirmed, OrderStatus::Shipped)
                | (OrderStatus::Confirmed, OrderStatus::Cancelled)
                | (OrderStatus::Shipped, OrderStatus::Delivered)
        )
    }

    /// Validate a transition, with terminal states reported separately
    ///
    /// # Errors
    /// - `DomainError::TerminalStatus` if `self` is DELIVERED or CANCELLED
    /// - `DomainError::InvalidStatusTransition` for any other illegal pair
    pub fn validate_transition(&self, next: OrderStatus) -> Result<(), DomainError> {
        if self.is_terminal() {
            return Err(DomainError::TerminalStatus(*self));
        }
        if !self.can_transition_to(next) {
            return Err(DomainError::InvalidStatusTransition { from: *self, to: next });
        }
        Ok(())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::InvalidStatus(format!("Unknown order status: {}", other))),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    #[test]
    fn test_legal_transitions() {
        assert!(OrderStatus::Pending.validate_transition(OrderStatus::Confirmed).is_ok());
        assert!(OrderStatus::Pending.validate_transition(OrderStatus::Cancelled).is_ok());
        assert!(OrderStatus::Confirmed.validate_transition(OrderStatus::Shipped).is_ok());
        assert!(OrderStatus::Confirmed.validate_transition(OrderStatus::Cancelled).is_ok());
        assert!(OrderStatus::Shipped.validate_transition(OrderStatus::Delivered).is_ok());
    }

    #[test]
    fn test_every_other_pair_is_rejected() {
        let legal = [
            (OrderStatus::Pending, OrderStatus::Confirmed),
            (OrderStatus::Pending, OrderStatus::Cancelled),
            (OrderStatus::Confirmed, OrderStatus::Shipped),
            (OrderStatus::Confirmed, OrderStatus::Cancelled),
            (OrderStatus::Shipped, OrderStatus::Delivered),
        ];

        for from in ALL {
            for to in ALL {
                let expected_ok = legal.contains(&(from, to));
                assert_eq!(
                    from.validate_transition(to).is_ok(),
                    expected_ok,
                    "transition {} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_terminal_states_report_terminal_error() {
        match OrderStatus::Delivered.validate_transition(OrderStatus::Pending) {
            Err(DomainError::TerminalStatus(OrderStatus::Delivered)) => {},
            other => panic!("Expected TerminalStatus, got {:?}", other),
        }
        match OrderStatus::Cancelled.validate_transition(OrderStatus::Confirmed) {
            Err(DomainError::TerminalStatus(OrderStatus::Cancelled)) => {},
            other => panic!("Expected TerminalStatus, got {:?}", other),
        }
    }

    #[test]
    fn test_cancellable_states() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Confirmed.is_cancellable());
        assert!(!OrderStatus::Shipped.is_cancellable());
        assert!(!OrderStatus::Delivered.is_cancellable());
        assert!(!OrderStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn test_status_round_trip() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("UNKNOWN".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_statuses_serialize_as_screaming_snake() {
        assert_eq!(serde_json::to_string(&OrderStatus::Pending).unwrap(), "\"PENDING\"");
        assert_eq!(serde_json::to_string(&UserStatus::Suspended).unwrap(), "\"SUSPENDED\"");
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(
            serde_json::to_string(&ProductStatus::Discontinued).unwrap(),
            "\"DISCONTINUED\""
        );

        let parsed: OrderStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(parsed, OrderStatus::Cancelled);
    }
}
