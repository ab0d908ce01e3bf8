//! Store traits and query filters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{NotificationId, NotificationType, OrderId, OrderStatus};

use crate::{AuditLogEntry, Notification, Order, Result};

/// Predicate over orders: status equality and timestamp comparisons.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Match orders in this status.
    pub status: Option<OrderStatus>,

    /// Match orders created strictly before this instant.
    pub created_before: Option<DateTime<Utc>>,

    /// Match orders last updated strictly before this instant.
    pub updated_before: Option<DateTime<Utc>>,
}

impl OrderFilter {
    /// Creates an empty filter matching every order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the filter to orders in `status`.
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts the filter to orders created before `instant`.
    pub fn with_created_before(mut self, instant: DateTime<Utc>) -> Self {
        self.created_before = Some(instant);
        self
    }

    /// Restricts the filter to orders last updated before `instant`.
    pub fn with_updated_before(mut self, instant: DateTime<Utc>) -> Self {
        self.updated_before = Some(instant);
        self
    }

    /// Returns true if `order` satisfies every set predicate.
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(status) = self.status
            && order.status != status
        {
            return false;
        }
        if let Some(cutoff) = self.created_before
            && order.created_at >= cutoff
        {
            return false;
        }
        if let Some(cutoff) = self.updated_before
            && order.updated_at >= cutoff
        {
            return false;
        }
        true
    }
}

/// Predicate over notifications: order, kind, and recency.
#[derive(Debug, Clone, Default)]
pub struct NotificationFilter {
    /// Match notifications tied to this order.
    pub order_id: Option<OrderId>,

    /// Match notifications of this kind.
    pub kind: Option<NotificationType>,

    /// Match notifications created at or after this instant.
    pub created_after: Option<DateTime<Utc>>,
}

impl NotificationFilter {
    /// Creates an empty filter matching every notification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the filter to notifications for `order_id`.
    pub fn with_order(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    /// Restricts the filter to notifications of `kind`.
    pub fn with_kind(mut self, kind: NotificationType) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Restricts the filter to notifications created at or after `instant`.
    pub fn with_created_after(mut self, instant: DateTime<Utc>) -> Self {
        self.created_after = Some(instant);
        self
    }

    /// Returns true if `notification` satisfies every set predicate.
    pub fn matches(&self, notification: &Notification) -> bool {
        if let Some(order_id) = self.order_id
            && notification.order_id != Some(order_id)
        {
            return false;
        }
        if let Some(kind) = self.kind
            && notification.kind != kind
        {
            return false;
        }
        if let Some(cutoff) = self.created_after
            && notification.created_at < cutoff
        {
            return false;
        }
        true
    }
}

/// Durable storage for orders.
///
/// All implementations must be thread-safe (Send + Sync). Per-order mutual
/// exclusion is the store's responsibility: [`update_order_status`] is a
/// compare-and-swap on the status column.
///
/// [`update_order_status`]: OrderStore::update_order_status
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order.
    ///
    /// Fails with [`StoreError::DuplicateOrderNumber`](crate::StoreError)
    /// if an order with the same order number already exists.
    async fn insert_order(&self, order: Order) -> Result<Order>;

    /// Retrieves an order by ID. Returns `None` if it doesn't exist.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Conditionally moves an order to `new_status`.
    ///
    /// The update only succeeds if the order is still in `expected`;
    /// otherwise it fails with
    /// [`StoreError::StatusConflict`](crate::StoreError) and leaves the row
    /// untouched. Returns the updated order.
    async fn update_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new_status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Order>;

    /// Retrieves orders matching `filter`, newest first.
    async fn find_orders(&self, filter: OrderFilter) -> Result<Vec<Order>>;
}

/// Append-only storage for audit entries.
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    /// Appends an audit entry. Entries are never mutated or deleted.
    async fn append_audit_entry(&self, entry: AuditLogEntry) -> Result<AuditLogEntry>;

    /// Retrieves all audit entries for an order, in creation order
    /// (oldest first).
    async fn audit_entries_for_order(&self, order_id: OrderId) -> Result<Vec<AuditLogEntry>>;

    /// Retrieves the most recent audit entries across all orders,
    /// newest first.
    async fn recent_audit_entries(&self, limit: usize) -> Result<Vec<AuditLogEntry>>;
}

/// Storage for notifications with read/unread state.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persists a new notification.
    async fn insert_notification(&self, notification: Notification) -> Result<Notification>;

    /// Retrieves a notification by ID. Returns `None` if it doesn't exist.
    async fn get_notification(&self, id: NotificationId) -> Result<Option<Notification>>;

    /// Retrieves notifications matching `filter`, newest first.
    async fn find_notifications(&self, filter: NotificationFilter) -> Result<Vec<Notification>>;

    /// Retrieves the most recent notifications, newest first.
    async fn recent_notifications(&self, limit: usize) -> Result<Vec<Notification>>;

    /// Returns the number of unread notifications.
    async fn unread_count(&self) -> Result<u64>;

    /// Marks one notification as read. Returns the updated notification.
    async fn mark_read(&self, id: NotificationId) -> Result<Notification>;

    /// Marks every unread notification as read. Returns how many were
    /// flipped.
    async fn mark_all_read(&self) -> Result<u64>;
}

/// Convenience supertrait for components that need all three stores.
pub trait RecordStore: OrderStore + AuditLogStore + NotificationStore {}

impl<T> RecordStore for T where T: OrderStore + AuditLogStore + NotificationStore {}
