//! Status enums for orders.

use serde::{Deserialize, Serialize};

/// Order lifecycle status as reported by the backend.
///
/// The backend stores a free-form string; values this client does not know
/// about are kept verbatim in [`OrderStatus::Other`] rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    #[default]
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Other(String),
}

impl OrderStatus {
    /// Whether the order can still be cancelled by the shopper.
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        matches!(self, Self::Processing)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Processing => write!(f, "Processing"),
            Self::Shipped => write!(f, "Shipped"),
            Self::Delivered => write!(f, "Delivered"),
            Self::Cancelled => write!(f, "Cancelled"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Processing" => Self::Processing,
            "Shipped" => Self::Shipped,
            "Delivered" => Self::Delivered,
            "Cancelled" => Self::Cancelled,
            _ => Self::Other(s),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_statuses() {
        assert_eq!(
            OrderStatus::from("Cancelled".to_string()),
            OrderStatus::Cancelled
        );
        assert_eq!(
            OrderStatus::from("Returned".to_string()),
            OrderStatus::Other("Returned".to_string())
        );
        assert_eq!(String::from(OrderStatus::Other("Returned".into())), "Returned");
    }

    #[test]
    fn test_only_processing_is_cancellable() {
        assert!(OrderStatus::Processing.is_cancellable());
        assert!(!OrderStatus::Cancelled.is_cancellable());
        assert!(!OrderStatus::Shipped.is_cancellable());
    }
}
