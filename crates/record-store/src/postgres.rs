use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, NotificationId, NotificationType, OrderId, OrderStatus};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    AuditLogEntry, Notification, Order, Result, StoreError,
    store::{AuditLogStore, NotificationFilter, NotificationStore, OrderFilter, OrderStore},
};

/// PostgreSQL-backed record store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL record store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_number: row.try_get("order_number")?,
            customer_name: row.try_get("customer_name")?,
            customer_email: row.try_get("customer_email")?,
            total: Money::from_cents(row.try_get("total_cents")?),
            status: status.parse()?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_audit_entry(row: PgRow) -> Result<AuditLogEntry> {
        let old_status: Option<String> = row.try_get("old_status")?;
        let new_status: String = row.try_get("new_status")?;

        Ok(AuditLogEntry {
            id: common::AuditLogId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            old_status: old_status.map(|s| s.parse()).transpose()?,
            new_status: new_status.parse()?,
            changed_by: row.try_get("changed_by")?,
            reason: row.try_get("reason")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_notification(row: PgRow) -> Result<Notification> {
        let kind: String = row.try_get("kind")?;

        Ok(Notification {
            id: NotificationId::from_uuid(row.try_get::<Uuid, _>("id")?),
            kind: kind.parse::<NotificationType>()?,
            title: row.try_get("title")?,
            message: row.try_get("message")?,
            order_id: row
                .try_get::<Option<Uuid>, _>("order_id")?
                .map(OrderId::from_uuid),
            read: row.try_get("is_read")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert_order(&self, order: Order) -> Result<Order> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, order_number, customer_name, customer_email, total_cents, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.order_number)
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(order.total.cents())
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("unique_order_number")
            {
                return StoreError::DuplicateOrderNumber(order.order_number.clone());
            }
            StoreError::Database(e)
        })?;

        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new_status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Order> {
        // Compare-and-swap on the status column; a concurrent writer that
        // moved the row first makes this update match zero rows.
        let row = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, updated_at = $2
            WHERE id = $3 AND status = $4
            RETURNING *
            "#,
        )
        .bind(new_status.as_str())
        .bind(updated_at)
        .bind(id.as_uuid())
        .bind(expected.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Self::row_to_order(row);
        }

        // Distinguish a missing order from a lost race.
        match self.get_order(id).await? {
            Some(order) => Err(StoreError::StatusConflict {
                order_id: id,
                expected,
                actual: order.status,
            }),
            None => Err(StoreError::OrderNotFound(id)),
        }
    }

    async fn find_orders(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        let mut sql = String::from("SELECT * FROM orders WHERE 1=1");
        let mut param_count = 0;

        if filter.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ${param_count}"));
        }
        if filter.created_before.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at < ${param_count}"));
        }
        if filter.updated_before.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND updated_at < ${param_count}"));
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut query = sqlx::query(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(cutoff) = filter.created_before {
            query = query.bind(cutoff);
        }
        if let Some(cutoff) = filter.updated_before {
            query = query.bind(cutoff);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_order).collect()
    }
}

#[async_trait]
impl AuditLogStore for PostgresStore {
    async fn append_audit_entry(&self, entry: AuditLogEntry) -> Result<AuditLogEntry> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (id, order_id, old_status, new_status, changed_by, reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.order_id.as_uuid())
        .bind(entry.old_status.map(|s| s.as_str()))
        .bind(entry.new_status.as_str())
        .bind(&entry.changed_by)
        .bind(&entry.reason)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn audit_entries_for_order(&self, order_id: OrderId) -> Result<Vec<AuditLogEntry>> {
        let rows = sqlx::query("SELECT * FROM audit_log WHERE order_id = $1 ORDER BY seq ASC")
            .bind(order_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_audit_entry).collect()
    }

    async fn recent_audit_entries(&self, limit: usize) -> Result<Vec<AuditLogEntry>> {
        let rows = sqlx::query("SELECT * FROM audit_log ORDER BY seq DESC LIMIT $1")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_audit_entry).collect()
    }
}

#[async_trait]
impl NotificationStore for PostgresStore {
    async fn insert_notification(&self, notification: Notification) -> Result<Notification> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, kind, title, message, order_id, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(notification.id.as_uuid())
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.order_id.map(|id| id.as_uuid()))
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn get_notification(&self, id: NotificationId) -> Result<Option<Notification>> {
        let row = sqlx::query("SELECT * FROM notifications WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_notification).transpose()
    }

    async fn find_notifications(&self, filter: NotificationFilter) -> Result<Vec<Notification>> {
        let mut sql = String::from("SELECT * FROM notifications WHERE 1=1");
        let mut param_count = 0;

        if filter.order_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND order_id = ${param_count}"));
        }
        if filter.kind.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND kind = ${param_count}"));
        }
        if filter.created_after.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at >= ${param_count}"));
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut query = sqlx::query(&sql);
        if let Some(order_id) = filter.order_id {
            query = query.bind(order_id.as_uuid());
        }
        if let Some(kind) = filter.kind {
            query = query.bind(kind.as_str());
        }
        if let Some(cutoff) = filter.created_after {
            query = query.bind(cutoff);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_notification).collect()
    }

    async fn recent_notifications(&self, limit: usize) -> Result<Vec<Notification>> {
        let rows = sqlx::query("SELECT * FROM notifications ORDER BY created_at DESC LIMIT $1")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_notification).collect()
    }

    async fn unread_count(&self) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE NOT is_read")
                .fetch_one(&self.pool)
                .await?;
        Ok(count as u64)
    }

    async fn mark_read(&self, id: NotificationId) -> Result<Notification> {
        let row = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 RETURNING *")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_notification)
            .transpose()?
            .ok_or(StoreError::NotificationNotFound(id))
    }

    async fn mark_all_read(&self) -> Result<u64> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE NOT is_read")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
