//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p record-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::Utc;
use common::{Money, NotificationType, OrderId, OrderStatus};
use record_store::{
    AuditLogEntry, AuditLogStore, Notification, NotificationFilter, NotificationStore, Order,
    OrderFilter, OrderStore, PostgresStore, StoreError,
};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for the schema
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_order_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE audit_log, notifications, orders")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

fn test_order(number: &str) -> Order {
    Order::new(
        number,
        "Ada Lovelace",
        "ada@example.com",
        Money::from_cents(4200),
    )
}

#[tokio::test]
#[serial]
async fn insert_and_get_order_roundtrip() {
    let store = get_test_store().await;

    let order = store.insert_order(test_order("ORD-PG-1")).await.unwrap();
    let loaded = store.get_order(order.id).await.unwrap().unwrap();

    assert_eq!(loaded.id, order.id);
    assert_eq!(loaded.order_number, "ORD-PG-1");
    assert_eq!(loaded.total, Money::from_cents(4200));
    assert_eq!(loaded.status, OrderStatus::AwaitingPayment);
}

#[tokio::test]
#[serial]
async fn duplicate_order_number_violates_constraint() {
    let store = get_test_store().await;

    store.insert_order(test_order("ORD-PG-1")).await.unwrap();
    let err = store.insert_order(test_order("ORD-PG-1")).await.unwrap_err();

    assert!(matches!(err, StoreError::DuplicateOrderNumber(n) if n == "ORD-PG-1"));
}

#[tokio::test]
#[serial]
async fn conditional_update_is_compare_and_swap() {
    let store = get_test_store().await;
    let order = store.insert_order(test_order("ORD-PG-1")).await.unwrap();

    let updated = store
        .update_order_status(
            order.id,
            OrderStatus::AwaitingPayment,
            OrderStatus::Preparation,
            Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Preparation);

    let err = store
        .update_order_status(
            order.id,
            OrderStatus::AwaitingPayment,
            OrderStatus::Cancelled,
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::StatusConflict {
            expected: OrderStatus::AwaitingPayment,
            actual: OrderStatus::Preparation,
            ..
        }
    ));

    let err = store
        .update_order_status(
            OrderId::new(),
            OrderStatus::AwaitingPayment,
            OrderStatus::Preparation,
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::OrderNotFound(_)));
}

#[tokio::test]
#[serial]
async fn find_orders_filters_by_status_and_age() {
    let store = get_test_store().await;

    let mut stale = test_order("ORD-PG-1");
    stale.created_at = Utc::now() - chrono::Duration::hours(30);
    store.insert_order(stale.clone()).await.unwrap();
    store.insert_order(test_order("ORD-PG-2")).await.unwrap();

    let cutoff = Utc::now() - chrono::Duration::hours(24);
    let matches = store
        .find_orders(
            OrderFilter::new()
                .with_status(OrderStatus::AwaitingPayment)
                .with_created_before(cutoff),
        )
        .await
        .unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id, stale.id);
}

#[tokio::test]
#[serial]
async fn audit_trail_preserves_creation_order() {
    let store = get_test_store().await;
    let order = store.insert_order(test_order("ORD-PG-1")).await.unwrap();

    for (old, new) in [
        (None, OrderStatus::AwaitingPayment),
        (Some(OrderStatus::AwaitingPayment), OrderStatus::Preparation),
        (Some(OrderStatus::Preparation), OrderStatus::Shipped),
    ] {
        store
            .append_audit_entry(AuditLogEntry::new(order.id, old, new, "SYSTEM", None))
            .await
            .unwrap();
    }

    let timeline = store.audit_entries_for_order(order.id).await.unwrap();
    assert_eq!(timeline.len(), 3);
    assert_eq!(timeline[0].old_status, None);
    assert_eq!(timeline[0].old_status_str(), "NEW");
    assert_eq!(timeline[2].new_status, OrderStatus::Shipped);

    let recent = store.recent_audit_entries(1).await.unwrap();
    assert_eq!(recent[0].new_status, OrderStatus::Shipped);
}

#[tokio::test]
#[serial]
async fn notification_dedup_window_query() {
    let store = get_test_store().await;
    let order = store.insert_order(test_order("ORD-PG-1")).await.unwrap();

    let mut old_alert = Notification::new(
        NotificationType::PaymentOverdue,
        "Payment Overdue",
        "stale",
        Some(order.id),
    );
    old_alert.created_at = Utc::now() - chrono::Duration::hours(48);
    store.insert_notification(old_alert).await.unwrap();

    // Outside the 24h window, the dedup query comes back empty.
    let window_start = Utc::now() - chrono::Duration::hours(24);
    let matches = store
        .find_notifications(
            NotificationFilter::new()
                .with_order(order.id)
                .with_kind(NotificationType::PaymentOverdue)
                .with_created_after(window_start),
        )
        .await
        .unwrap();
    assert!(matches.is_empty());

    store
        .insert_notification(Notification::new(
            NotificationType::PaymentOverdue,
            "Payment Overdue",
            "fresh",
            Some(order.id),
        ))
        .await
        .unwrap();

    let matches = store
        .find_notifications(
            NotificationFilter::new()
                .with_order(order.id)
                .with_kind(NotificationType::PaymentOverdue)
                .with_created_after(window_start),
        )
        .await
        .unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].message, "fresh");
}

#[tokio::test]
#[serial]
async fn read_state_flips() {
    let store = get_test_store().await;

    let first = store
        .insert_notification(Notification::new(
            NotificationType::NewOrder,
            "t",
            "m",
            None,
        ))
        .await
        .unwrap();
    store
        .insert_notification(Notification::new(
            NotificationType::SystemAlert,
            "t",
            "m",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(store.unread_count().await.unwrap(), 2);

    let updated = store.mark_read(first.id).await.unwrap();
    assert!(updated.read);
    assert_eq!(store.unread_count().await.unwrap(), 1);

    assert_eq!(store.mark_all_read().await.unwrap(), 1);
    assert_eq!(store.unread_count().await.unwrap(), 0);

    let err = store
        .mark_read(common::NotificationId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotificationNotFound(_)));
}
