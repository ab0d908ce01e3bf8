use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{NotificationId, OrderId, OrderStatus};
use tokio::sync::RwLock;

use crate::{
    AuditLogEntry, Notification, Order, Result, StoreError,
    store::{AuditLogStore, NotificationFilter, NotificationStore, OrderFilter, OrderStore},
};

/// In-memory record store for tests and local runs.
///
/// Provides the same interface and conditional-update semantics as the
/// PostgreSQL implementation. Audit entries and notifications are kept in
/// insertion order, which is their creation order.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    audit_log: Arc<RwLock<Vec<AuditLogEntry>>>,
    notifications: Arc<RwLock<Vec<Notification>>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Returns the total number of audit entries stored.
    pub async fn audit_entry_count(&self) -> usize {
        self.audit_log.read().await.len()
    }

    /// Returns the total number of notifications stored.
    pub async fn notification_count(&self) -> usize {
        self.notifications.read().await.len()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
        self.audit_log.write().await.clear();
        self.notifications.write().await.clear();
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: Order) -> Result<Order> {
        let mut orders = self.orders.write().await;

        if orders
            .values()
            .any(|existing| existing.order_number == order.order_number)
        {
            return Err(StoreError::DuplicateOrderNumber(order.order_number));
        }

        orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new_status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Order> {
        let mut orders = self.orders.write().await;

        let order = orders.get_mut(&id).ok_or(StoreError::OrderNotFound(id))?;

        if order.status != expected {
            return Err(StoreError::StatusConflict {
                order_id: id,
                expected,
                actual: order.status,
            });
        }

        order.status = new_status;
        order.updated_at = updated_at;
        Ok(order.clone())
    }

    async fn find_orders(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut matches: Vec<Order> = orders
            .values()
            .filter(|order| filter.matches(order))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches)
    }
}

#[async_trait]
impl AuditLogStore for InMemoryStore {
    async fn append_audit_entry(&self, entry: AuditLogEntry) -> Result<AuditLogEntry> {
        self.audit_log.write().await.push(entry.clone());
        Ok(entry)
    }

    async fn audit_entries_for_order(&self, order_id: OrderId) -> Result<Vec<AuditLogEntry>> {
        let log = self.audit_log.read().await;
        Ok(log
            .iter()
            .filter(|entry| entry.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn recent_audit_entries(&self, limit: usize) -> Result<Vec<AuditLogEntry>> {
        let log = self.audit_log.read().await;
        Ok(log.iter().rev().take(limit).cloned().collect())
    }
}

#[async_trait]
impl NotificationStore for InMemoryStore {
    async fn insert_notification(&self, notification: Notification) -> Result<Notification> {
        self.notifications.write().await.push(notification.clone());
        Ok(notification)
    }

    async fn get_notification(&self, id: NotificationId) -> Result<Option<Notification>> {
        let notifications = self.notifications.read().await;
        Ok(notifications.iter().find(|n| n.id == id).cloned())
    }

    async fn find_notifications(&self, filter: NotificationFilter) -> Result<Vec<Notification>> {
        let notifications = self.notifications.read().await;
        Ok(notifications
            .iter()
            .rev()
            .filter(|n| filter.matches(n))
            .cloned()
            .collect())
    }

    async fn recent_notifications(&self, limit: usize) -> Result<Vec<Notification>> {
        let notifications = self.notifications.read().await;
        Ok(notifications.iter().rev().take(limit).cloned().collect())
    }

    async fn unread_count(&self) -> Result<u64> {
        let notifications = self.notifications.read().await;
        Ok(notifications.iter().filter(|n| !n.read).count() as u64)
    }

    async fn mark_read(&self, id: NotificationId) -> Result<Notification> {
        let mut notifications = self.notifications.write().await;
        let notification = notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(StoreError::NotificationNotFound(id))?;
        notification.read = true;
        Ok(notification.clone())
    }

    async fn mark_all_read(&self) -> Result<u64> {
        let mut notifications = self.notifications.write().await;
        let mut flipped = 0;
        for notification in notifications.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            flipped += 1;
        }
        Ok(flipped)
    }
}
