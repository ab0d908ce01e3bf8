//! Integration tests for the automation scanner and scheduler.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use automation::{AutomationScanner, Scheduler};
use chrono::{DateTime, Duration, Utc};
use common::{Money, NotificationId, NotificationType, OrderId, OrderStatus};
use lifecycle::TransitionEngine;
use publisher::EventPublisher;
use record_store::{
    AuditLogEntry, AuditLogStore, InMemoryStore, Notification, NotificationFilter,
    NotificationStore, Order, OrderFilter, OrderStore, Result as StoreResult, StoreError,
};

fn scanner_over(store: InMemoryStore) -> AutomationScanner<InMemoryStore> {
    AutomationScanner::new(TransitionEngine::new(store, EventPublisher::new()))
}

/// An order that has been awaiting payment for `hours` hours.
fn awaiting_payment_for(hours: i64, number: &str) -> Order {
    let mut order = Order::new(number, "Ada Lovelace", "ada@example.com", Money::from_cents(4200));
    order.created_at = Utc::now() - Duration::hours(hours);
    order.updated_at = order.created_at;
    order
}

/// An order that has been sitting in `Shipped` for `days` days.
fn shipped_for(days: i64, number: &str) -> Order {
    let mut order = Order::new(number, "Grace Hopper", "grace@example.com", Money::from_cents(9900));
    order.status = OrderStatus::Shipped;
    order.created_at = Utc::now() - Duration::days(days + 2);
    order.updated_at = Utc::now() - Duration::days(days);
    order
}

#[tokio::test]
async fn overdue_payment_raises_one_alert() {
    let store = InMemoryStore::new();
    store
        .insert_order(awaiting_payment_for(30, "ORD-OLD"))
        .await
        .unwrap();
    store
        .insert_order(awaiting_payment_for(1, "ORD-FRESH"))
        .await
        .unwrap();

    let scanner = scanner_over(store.clone());
    let report = scanner.run_checks().await;

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.outcomes[0].rule, "overdue_payment");
    assert_eq!(report.outcomes[0].new_alerts, 1);
    assert!(report.outcomes[0].error.is_none());
    assert_eq!(report.outcomes[1].new_alerts, 0);

    let alerts = store
        .find_notifications(
            NotificationFilter::new().with_kind(NotificationType::PaymentOverdue),
        )
        .await
        .unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].title, "Payment Overdue: ORD-OLD");
    assert!(alerts[0].order_id.is_some());
}

#[tokio::test]
async fn delayed_shipment_respects_the_three_day_threshold() {
    let store = InMemoryStore::new();
    store.insert_order(shipped_for(4, "ORD-SLOW")).await.unwrap();
    store.insert_order(shipped_for(1, "ORD-OK")).await.unwrap();

    let scanner = scanner_over(store.clone());
    let report = scanner.run_checks().await;

    assert_eq!(report.outcomes[1].rule, "delayed_shipment");
    assert_eq!(report.outcomes[1].new_alerts, 1);

    let alerts = store
        .find_notifications(
            NotificationFilter::new().with_kind(NotificationType::ShipmentDelayed),
        )
        .await
        .unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].title, "Shipment Delayed: ORD-SLOW");
}

#[tokio::test]
async fn empty_match_set_is_a_noop() {
    let store = InMemoryStore::new();
    let scanner = scanner_over(store.clone());

    let report = scanner.run_checks().await;
    assert_eq!(report.total_new_alerts(), 0);
    assert_eq!(store.notification_count().await, 0);
}

#[tokio::test]
async fn second_run_inside_the_window_raises_nothing_new() {
    let store = InMemoryStore::new();
    store
        .insert_order(awaiting_payment_for(30, "ORD-OLD"))
        .await
        .unwrap();
    store.insert_order(shipped_for(4, "ORD-SLOW")).await.unwrap();

    let scanner = scanner_over(store.clone());

    let first = scanner.run_checks().await;
    assert_eq!(first.total_new_alerts(), 2);

    let second = scanner.run_checks().await;
    assert_eq!(second.total_new_alerts(), 0);
    assert_eq!(store.notification_count().await, 2);
}

#[tokio::test]
async fn alert_outside_the_window_is_refreshed() {
    let store = InMemoryStore::new();
    let order = store
        .insert_order(awaiting_payment_for(72, "ORD-OLD"))
        .await
        .unwrap();

    // The previous alert is older than the 24h re-alert window.
    let mut stale_alert = Notification::new(
        NotificationType::PaymentOverdue,
        "Payment Overdue: ORD-OLD",
        "stale",
        Some(order.id),
    );
    stale_alert.created_at = Utc::now() - Duration::hours(30);
    store.insert_notification(stale_alert).await.unwrap();

    let scanner = scanner_over(store.clone());
    let report = scanner.run_checks().await;

    assert_eq!(report.outcomes[0].new_alerts, 1);
    assert_eq!(store.notification_count().await, 2);
}

#[tokio::test]
async fn scanning_never_mutates_orders_or_audit_history() {
    let store = InMemoryStore::new();
    let order = store
        .insert_order(awaiting_payment_for(30, "ORD-OLD"))
        .await
        .unwrap();

    let scanner = scanner_over(store.clone());
    scanner.run_checks().await;

    let loaded = store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, OrderStatus::AwaitingPayment);
    assert_eq!(loaded.updated_at, order.updated_at);
    assert_eq!(store.audit_entry_count().await, 0);
}

#[tokio::test]
async fn alerts_are_published_to_observers() {
    let store = InMemoryStore::new();
    store
        .insert_order(awaiting_payment_for(30, "ORD-OLD"))
        .await
        .unwrap();

    let publisher = EventPublisher::new();
    let scanner = AutomationScanner::new(TransitionEngine::new(store, publisher.clone()));

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    publisher.register_observer(tx).await;

    scanner.run_checks().await;

    let frame: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
    assert_eq!(frame["type"], "NOTIFICATION");
    assert_eq!(frame["data"]["type"], "PAYMENT_OVERDUE");
}

/// Store wrapper with failure and latency knobs for scanner tests.
#[derive(Clone)]
struct KnobbedStore {
    inner: InMemoryStore,
    fail_awaiting_payment_query: Arc<AtomicBool>,
    find_delay: Option<StdDuration>,
}

impl KnobbedStore {
    fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            fail_awaiting_payment_query: Arc::new(AtomicBool::new(false)),
            find_delay: None,
        }
    }
}

#[async_trait]
impl OrderStore for KnobbedStore {
    async fn insert_order(&self, order: Order) -> StoreResult<Order> {
        self.inner.insert_order(order).await
    }

    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        self.inner.get_order(id).await
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new_status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Order> {
        self.inner
            .update_order_status(id, expected, new_status, updated_at)
            .await
    }

    async fn find_orders(&self, filter: OrderFilter) -> StoreResult<Vec<Order>> {
        if let Some(delay) = self.find_delay {
            tokio::time::sleep(delay).await;
        }
        if filter.status == Some(OrderStatus::AwaitingPayment)
            && self.fail_awaiting_payment_query.load(Ordering::SeqCst)
        {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.find_orders(filter).await
    }
}

#[async_trait]
impl AuditLogStore for KnobbedStore {
    async fn append_audit_entry(&self, entry: AuditLogEntry) -> StoreResult<AuditLogEntry> {
        self.inner.append_audit_entry(entry).await
    }

    async fn audit_entries_for_order(
        &self,
        order_id: OrderId,
    ) -> StoreResult<Vec<AuditLogEntry>> {
        self.inner.audit_entries_for_order(order_id).await
    }

    async fn recent_audit_entries(&self, limit: usize) -> StoreResult<Vec<AuditLogEntry>> {
        self.inner.recent_audit_entries(limit).await
    }
}

#[async_trait]
impl NotificationStore for KnobbedStore {
    async fn insert_notification(&self, notification: Notification) -> StoreResult<Notification> {
        self.inner.insert_notification(notification).await
    }

    async fn get_notification(&self, id: NotificationId) -> StoreResult<Option<Notification>> {
        self.inner.get_notification(id).await
    }

    async fn find_notifications(
        &self,
        filter: NotificationFilter,
    ) -> StoreResult<Vec<Notification>> {
        self.inner.find_notifications(filter).await
    }

    async fn recent_notifications(&self, limit: usize) -> StoreResult<Vec<Notification>> {
        self.inner.recent_notifications(limit).await
    }

    async fn unread_count(&self) -> StoreResult<u64> {
        self.inner.unread_count().await
    }

    async fn mark_read(&self, id: NotificationId) -> StoreResult<Notification> {
        self.inner.mark_read(id).await
    }

    async fn mark_all_read(&self) -> StoreResult<u64> {
        self.inner.mark_all_read().await
    }
}

#[tokio::test]
async fn one_failing_rule_does_not_halt_the_others() {
    let inner = InMemoryStore::new();
    inner
        .insert_order(awaiting_payment_for(30, "ORD-OLD"))
        .await
        .unwrap();
    inner.insert_order(shipped_for(4, "ORD-SLOW")).await.unwrap();

    let store = KnobbedStore::new(inner.clone());
    store
        .fail_awaiting_payment_query
        .store(true, Ordering::SeqCst);

    let scanner = AutomationScanner::new(TransitionEngine::new(store, EventPublisher::new()));
    let report = scanner.run_checks().await;

    assert_eq!(report.outcomes[0].rule, "overdue_payment");
    assert_eq!(report.outcomes[0].new_alerts, 0);
    assert!(report.outcomes[0].error.is_some());

    // The delayed-shipment rule still ran and alerted.
    assert_eq!(report.outcomes[1].rule, "delayed_shipment");
    assert_eq!(report.outcomes[1].new_alerts, 1);
    assert!(report.outcomes[1].error.is_none());
}

#[tokio::test]
async fn overlapping_ticks_are_skipped() {
    let mut store = KnobbedStore::new(InMemoryStore::new());
    store.find_delay = Some(StdDuration::from_millis(200));

    let scanner = Arc::new(AutomationScanner::new(TransitionEngine::new(
        store,
        EventPublisher::new(),
    )));

    let slow = {
        let scanner = Arc::clone(&scanner);
        tokio::spawn(async move { scanner.try_tick().await })
    };

    // Give the slow tick time to take the guard.
    tokio::time::sleep(StdDuration::from_millis(50)).await;
    assert!(scanner.try_tick().await.is_none());

    assert!(slow.await.unwrap().is_some());
}

#[tokio::test]
async fn scheduler_runs_immediately_and_stops_cleanly() {
    let store = InMemoryStore::new();
    store
        .insert_order(awaiting_payment_for(30, "ORD-OLD"))
        .await
        .unwrap();

    let scanner = Arc::new(scanner_over(store.clone()));
    let scheduler = Scheduler::start(Arc::clone(&scanner), StdDuration::from_secs(3600));

    // The first tick fires at startup, not an interval later.
    tokio::time::sleep(StdDuration::from_millis(200)).await;
    let alerts = store
        .find_notifications(
            NotificationFilter::new().with_kind(NotificationType::PaymentOverdue),
        )
        .await
        .unwrap();
    assert_eq!(alerts.len(), 1);

    scheduler.stop().await;
}

#[tokio::test]
async fn custom_rules_can_be_registered() {
    let store = InMemoryStore::new();
    let engine = TransitionEngine::new(store, EventPublisher::new());
    let mut scanner = AutomationScanner::with_rules(engine, vec![]);
    assert_eq!(scanner.rule_count(), 0);

    scanner.register(Box::new(automation::OverduePaymentRule));
    assert_eq!(scanner.rule_count(), 1);

    let report = scanner.run_checks().await;
    assert_eq!(report.outcomes.len(), 1);
}
