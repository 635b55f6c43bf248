//! Order and payment status state machines.

use serde::{Deserialize, Serialize};

/// The visible state of an order.
///
/// Transitions under [`TransitionPolicy::Strict`]:
/// ```text
/// Pending ──┬──► Processing ──┬──► Delivered
///           │                 │
///           ├─────────────────┴──► Cancelled
///           └──► Delivered
/// ```
/// Delivered and Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order accepted, awaiting fulfilment.
    #[default]
    Pending,

    /// Order is being prepared/shipped.
    Processing,

    /// Order reached the customer (terminal).
    Delivered,

    /// Order was cancelled (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if no further transitions are possible under the
    /// strict policy.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment state, owned by the external payment collaborator.
///
/// The order core records the initial Pending value and reads it for
/// statistics; it never advances it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Success,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Success => "Success",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Refunded => "Refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which status transitions the status-update operation accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Forward-only graph: terminal states are frozen and an order never
    /// returns to an earlier state.
    #[default]
    Strict,

    /// Any transition is accepted. Intended for administrative correction
    /// of mis-set statuses.
    Lenient,
}

impl TransitionPolicy {
    /// Returns true if moving `from → to` is permitted.
    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            TransitionPolicy::Lenient => true,
            TransitionPolicy::Strict => matches!(
                (from, to),
                (
                    OrderStatus::Pending,
                    OrderStatus::Processing | OrderStatus::Delivered | OrderStatus::Cancelled
                ) | (
                    OrderStatus::Processing,
                    OrderStatus::Delivered | OrderStatus::Cancelled
                )
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_strict_allows_forward_transitions() {
        let policy = TransitionPolicy::Strict;
        assert!(policy.allows(OrderStatus::Pending, OrderStatus::Processing));
        assert!(policy.allows(OrderStatus::Pending, OrderStatus::Delivered));
        assert!(policy.allows(OrderStatus::Pending, OrderStatus::Cancelled));
        assert!(policy.allows(OrderStatus::Processing, OrderStatus::Delivered));
        assert!(policy.allows(OrderStatus::Processing, OrderStatus::Cancelled));
    }

    #[test]
    fn test_strict_rejects_backward_and_terminal_transitions() {
        let policy = TransitionPolicy::Strict;
        assert!(!policy.allows(OrderStatus::Processing, OrderStatus::Pending));
        assert!(!policy.allows(OrderStatus::Delivered, OrderStatus::Pending));
        assert!(!policy.allows(OrderStatus::Delivered, OrderStatus::Processing));
        assert!(!policy.allows(OrderStatus::Cancelled, OrderStatus::Processing));
        assert!(!policy.allows(OrderStatus::Cancelled, OrderStatus::Delivered));
    }

    #[test]
    fn test_strict_rejects_self_transitions() {
        let policy = TransitionPolicy::Strict;
        assert!(!policy.allows(OrderStatus::Pending, OrderStatus::Pending));
        assert!(!policy.allows(OrderStatus::Processing, OrderStatus::Processing));
    }

    #[test]
    fn test_lenient_allows_everything() {
        let policy = TransitionPolicy::Lenient;
        assert!(policy.allows(OrderStatus::Delivered, OrderStatus::Pending));
        assert!(policy.allows(OrderStatus::Cancelled, OrderStatus::Processing));
        assert!(policy.allows(OrderStatus::Pending, OrderStatus::Pending));
    }

    #[test]
    fn test_display() {
        assert_eq!(OrderStatus::Processing.to_string(), "Processing");
        assert_eq!(PaymentStatus::Refunded.to_string(), "Refunded");
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&OrderStatus::Delivered).unwrap();
        assert_eq!(json, "\"Delivered\"");
        let back: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, OrderStatus::Delivered);
    }
}
