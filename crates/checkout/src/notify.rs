//! Post-commit notification sink.
//!
//! The sink is invoked outside the order transaction, after commit.
//! Delivery failures are logged by the coordinator and never unwind a
//! committed order.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use domain::{Money, Order};
use thiserror::Error;

/// A notification could not be delivered.
#[derive(Debug, Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Receives a best-effort signal for every committed order.
#[async_trait]
pub trait NotifySink: Send + Sync {
    /// Called once per committed order.
    async fn order_placed(&self, order: &Order) -> Result<(), NotifyError>;
}

/// Sink that only logs. Used when no downstream notification channel is
/// configured.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifySink;

impl LoggingNotifySink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotifySink for LoggingNotifySink {
    async fn order_placed(&self, order: &Order) -> Result<(), NotifyError> {
        tracing::info!(
            order_code = %order.code,
            final_amount = order.final_amount.minor(),
            "order placed"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RecordingState {
    notifications: Vec<(OrderId, Money)>,
    fail_on_notify: bool,
}

/// In-memory sink for testing: records every notification and can be
/// configured to fail delivery.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifySink {
    state: Arc<RwLock<RecordingState>>,
}

impl RecordingNotifySink {
    /// Creates a new recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the sink to fail every delivery.
    pub fn set_fail_on_notify(&self, fail: bool) {
        self.state.write().unwrap().fail_on_notify = fail;
    }

    /// Returns the number of notifications received.
    pub fn notification_count(&self) -> usize {
        self.state.read().unwrap().notifications.len()
    }

    /// Returns true if a notification was received for the given order.
    pub fn has_notification_for(&self, order_id: OrderId) -> bool {
        self.state
            .read()
            .unwrap()
            .notifications
            .iter()
            .any(|(id, _)| *id == order_id)
    }
}

#[async_trait]
impl NotifySink for RecordingNotifySink {
    async fn order_placed(&self, order: &Order) -> Result<(), NotifyError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_notify {
            return Err(NotifyError("delivery channel unavailable".to_string()));
        }

        state.notifications.push((order.id, order.final_amount));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::UserId;
    use domain::{
        Address, InvoiceNumber, OrderCode, OrderStatus, PaymentDetails, PaymentMethod,
        PaymentStatus, StatusChange,
    };

    fn order() -> Order {
        let now = Utc::now();
        let user_id = UserId::new();
        Order {
            id: OrderId::new(),
            code: OrderCode::new("ORD-20250424-ABC123"),
            invoice_number: InvoiceNumber::new("INV-20250424-0001"),
            user_id,
            lines: vec![],
            shipping_address: Address {
                full_name: "Test".to_string(),
                email: None,
                phone: "01700000000".to_string(),
                district: "Dhaka".to_string(),
                address_line: "House 1".to_string(),
                postal_code: "1207".to_string(),
            },
            billing_address: Address {
                full_name: "Test".to_string(),
                email: None,
                phone: "01700000000".to_string(),
                district: "Dhaka".to_string(),
                address_line: "House 1".to_string(),
                postal_code: "1207".to_string(),
            },
            status: OrderStatus::Pending,
            status_history: vec![StatusChange {
                status: OrderStatus::Pending,
                changed_at: now,
                changed_by: user_id,
            }],
            payment_status: PaymentStatus::Pending,
            payment: PaymentDetails {
                gateway: "COD".to_string(),
                method: PaymentMethod::CashOnDelivery,
                amount: Money::from_minor(1400),
                currency: "BDT".to_string(),
                transaction_id: "txn".to_string(),
            },
            subtotal: Money::from_minor(1300),
            discount_amount: Money::zero(),
            shipping_fee: Money::from_minor(100),
            final_amount: Money::from_minor(1400),
            coupon_id: None,
            promo_code: None,
            notes: None,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_recording_sink_records() {
        let sink = RecordingNotifySink::new();
        let o = order();

        sink.order_placed(&o).await.unwrap();

        assert_eq!(sink.notification_count(), 1);
        assert!(sink.has_notification_for(o.id));
        assert!(!sink.has_notification_for(OrderId::new()));
    }

    #[tokio::test]
    async fn test_recording_sink_failure_injection() {
        let sink = RecordingNotifySink::new();
        sink.set_fail_on_notify(true);

        let result = sink.order_placed(&order()).await;
        assert!(result.is_err());
        assert_eq!(sink.notification_count(), 0);
    }

    #[tokio::test]
    async fn test_logging_sink_always_succeeds() {
        let sink = LoggingNotifySink::new();
        assert!(sink.order_placed(&order()).await.is_ok());
    }
}
