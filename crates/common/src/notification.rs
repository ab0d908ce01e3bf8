//! Notification kinds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of a persisted notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    /// An order has been awaiting payment past the overdue threshold.
    PaymentOverdue,

    /// An order has been in shipping past the delay threshold.
    ShipmentDelayed,

    /// An order moved to a new status.
    StatusChange,

    /// Operator-facing system alert.
    SystemAlert,

    /// A new order was created.
    NewOrder,
}

impl NotificationType {
    /// All notification kinds.
    pub const ALL: [NotificationType; 5] = [
        NotificationType::PaymentOverdue,
        NotificationType::ShipmentDelayed,
        NotificationType::StatusChange,
        NotificationType::SystemAlert,
        NotificationType::NewOrder,
    ];

    /// Returns the wire form of the kind (e.g. `PAYMENT_OVERDUE`).
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::PaymentOverdue => "PAYMENT_OVERDUE",
            NotificationType::ShipmentDelayed => "SHIPMENT_DELAYED",
            NotificationType::StatusChange => "STATUS_CHANGE",
            NotificationType::SystemAlert => "SYSTEM_ALERT",
            NotificationType::NewOrder => "NEW_ORDER",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unrecognized notification kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid notification type '{given}'")]
pub struct ParseNotificationTypeError {
    /// The unrecognized input.
    pub given: String,
}

impl std::str::FromStr for NotificationType {
    type Err = ParseNotificationTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationType::ALL
            .iter()
            .find(|kind| kind.as_str() == s)
            .copied()
            .ok_or_else(|| ParseNotificationTypeError {
                given: s.to_string(),
            })
    }
}
