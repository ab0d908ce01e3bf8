//! Record shapes persisted by the store.

use chrono::{DateTime, Utc};
use common::{AuditLogId, Money, NotificationId, NotificationType, OrderId, OrderStatus};
use serde::{Deserialize, Serialize};

/// A marketplace order.
///
/// The status field only changes through the transition engine; the store
/// enforces this with a conditional update (see
/// [`OrderStore::update_order_status`](crate::OrderStore::update_order_status)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    pub id: OrderId,

    /// Human-readable order number, unique at the store layer.
    pub order_number: String,

    /// Name of the customer who placed the order.
    pub customer_name: String,

    /// E-mail of the customer who placed the order.
    pub customer_email: String,

    /// Monetary total of the order.
    pub total: Money,

    /// Current lifecycle status.
    pub status: OrderStatus,

    /// When the order was created.
    pub created_at: DateTime<Utc>,

    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new order in the initial `AwaitingPayment` status,
    /// stamped with the current time.
    pub fn new(
        order_number: impl Into<String>,
        customer_name: impl Into<String>,
        customer_email: impl Into<String>,
        total: Money,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            order_number: order_number.into(),
            customer_name: customer_name.into(),
            customer_email: customer_email.into(),
            total,
            status: OrderStatus::AwaitingPayment,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An immutable audit record of one status transition.
///
/// `old_status` is `None` for the creation entry (the `NEW` sentinel on the
/// wire). Entries are never mutated or deleted; consumed in creation order
/// they form the full transition history of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Unique entry identifier.
    pub id: AuditLogId,

    /// The order this entry belongs to.
    pub order_id: OrderId,

    /// Status before the transition; `None` for the creation entry.
    pub old_status: Option<OrderStatus>,

    /// Status after the transition.
    pub new_status: OrderStatus,

    /// Who performed the transition. Free-form; recognized conventions are
    /// `SYSTEM`, `ADMIN`, and `CUSTOMER`.
    pub changed_by: String,

    /// Optional free-text reason for the transition.
    pub reason: Option<String>,

    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    /// Creates a new audit entry stamped with the current time.
    pub fn new(
        order_id: OrderId,
        old_status: Option<OrderStatus>,
        new_status: OrderStatus,
        changed_by: impl Into<String>,
        reason: Option<String>,
    ) -> Self {
        Self {
            id: AuditLogId::new(),
            order_id,
            old_status,
            new_status,
            changed_by: changed_by.into(),
            reason,
            created_at: Utc::now(),
        }
    }

    /// Returns the wire form of the prior status, using the `NEW` sentinel
    /// for the creation entry.
    pub fn old_status_str(&self) -> &'static str {
        self.old_status.map(|s| s.as_str()).unwrap_or("NEW")
    }
}

/// A persisted, typed alert, optionally tied to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: NotificationId,

    /// The kind of notification.
    pub kind: NotificationType,

    /// Short human-readable title.
    pub title: String,

    /// Full message body.
    pub message: String,

    /// The order this notification concerns, if any.
    pub order_id: Option<OrderId>,

    /// Whether an operator has read this notification.
    pub read: bool,

    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Creates a new unread notification stamped with the current time.
    pub fn new(
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        order_id: Option<OrderId>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            kind,
            title: title.into(),
            message: message.into(),
            order_id,
            read: false,
            created_at: Utc::now(),
        }
    }
}
