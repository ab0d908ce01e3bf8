//! Wire envelope for observer-facing frames.

use chrono::{DateTime, Utc};
use common::{NotificationId, NotificationType, OrderId, OrderStatus};
use record_store::{Notification, Order};
use serde::{Deserialize, Serialize};

/// A frame pushed to connected observers.
///
/// Every frame carries its envelope type tag and a timestamp; `data` fields
/// are camelCase on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WireMessage {
    /// Connection acknowledgment sent to a newly connected observer.
    #[serde(rename = "CONNECTED")]
    Connected {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A persisted notification being fanned out.
    #[serde(rename = "NOTIFICATION")]
    Notification {
        data: NotificationPayload,
        timestamp: DateTime<Utc>,
    },

    /// An order changed; carries the updated order snapshot.
    #[serde(rename = "ORDER_UPDATE")]
    OrderUpdate {
        data: OrderPayload,
        timestamp: DateTime<Utc>,
    },
}

impl WireMessage {
    /// Builds the connection acknowledgment frame.
    pub fn connected() -> Self {
        WireMessage::Connected {
            message: "Connected to order notification stream".to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Builds a notification frame.
    pub fn notification(notification: &Notification) -> Self {
        WireMessage::Notification {
            data: NotificationPayload::from(notification),
            timestamp: Utc::now(),
        }
    }

    /// Builds an order update frame.
    pub fn order_update(order: &Order) -> Self {
        WireMessage::OrderUpdate {
            data: OrderPayload::from(order),
            timestamp: Utc::now(),
        }
    }

    /// Serializes the frame to its JSON wire form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Notification body carried by a `NOTIFICATION` frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
}

impl From<&Notification> for NotificationPayload {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id,
            kind: notification.kind,
            title: notification.title.clone(),
            message: notification.message.clone(),
            order_id: notification.order_id,
            created_at: notification.created_at,
        }
    }
}

/// Order snapshot carried by an `ORDER_UPDATE` frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub id: OrderId,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub status_label: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderPayload {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.clone(),
            customer_name: order.customer_name.clone(),
            customer_email: order.customer_email.clone(),
            total_cents: order.total.cents(),
            status: order.status,
            status_label: order.status.label().to_string(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}
