//! Built-in stuck-order rules.

use chrono::{DateTime, Duration, Utc};
use common::{NotificationType, OrderStatus};
use record_store::{Order, OrderFilter};

/// One stuck-order condition the scanner checks every tick.
///
/// A rule is a predicate over order state and age, the kind of
/// notification it raises, and the minimum time between repeat alerts for
/// the same order.
pub trait AutomationRule: Send + Sync {
    /// Short identifier used in logs and scan reports.
    fn name(&self) -> &'static str;

    /// The kind of notification this rule raises. Also the dedup key: an
    /// existing notification of this kind for the same order inside the
    /// re-alert window suppresses a fresh one.
    fn kind(&self) -> NotificationType;

    /// Minimum time since the last alert of this kind for an order before
    /// the scanner raises another.
    fn realert_window(&self) -> Duration;

    /// Builds the store predicate matching stuck candidates as of `now`.
    fn candidate_filter(&self, now: DateTime<Utc>) -> OrderFilter;

    /// Title of the raised notification.
    fn title(&self, order: &Order) -> String;

    /// Message body of the raised notification.
    fn message(&self, order: &Order) -> String;
}

/// Orders awaiting payment for more than 24 hours.
pub struct OverduePaymentRule;

impl AutomationRule for OverduePaymentRule {
    fn name(&self) -> &'static str {
        "overdue_payment"
    }

    fn kind(&self) -> NotificationType {
        NotificationType::PaymentOverdue
    }

    fn realert_window(&self) -> Duration {
        Duration::hours(24)
    }

    fn candidate_filter(&self, now: DateTime<Utc>) -> OrderFilter {
        OrderFilter::new()
            .with_status(OrderStatus::AwaitingPayment)
            .with_created_before(now - Duration::hours(24))
    }

    fn title(&self, order: &Order) -> String {
        format!("Payment Overdue: {}", order.order_number)
    }

    fn message(&self, order: &Order) -> String {
        format!(
            "Order awaiting payment for over 24 hours. Customer: {}, Amount: {}",
            order.customer_name, order.total
        )
    }
}

/// Orders sitting in shipping for more than 3 days.
pub struct DelayedShipmentRule;

impl AutomationRule for DelayedShipmentRule {
    fn name(&self) -> &'static str {
        "delayed_shipment"
    }

    fn kind(&self) -> NotificationType {
        NotificationType::ShipmentDelayed
    }

    fn realert_window(&self) -> Duration {
        Duration::hours(24)
    }

    fn candidate_filter(&self, now: DateTime<Utc>) -> OrderFilter {
        OrderFilter::new()
            .with_status(OrderStatus::Shipped)
            .with_updated_before(now - Duration::days(3))
    }

    fn title(&self, order: &Order) -> String {
        format!("Shipment Delayed: {}", order.order_number)
    }

    fn message(&self, order: &Order) -> String {
        format!(
            "Order in shipping for over 3 days. Customer: {}",
            order.customer_name
        )
    }
}
