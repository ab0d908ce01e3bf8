//! Notification list, read-state, and manual scan endpoints.

use std::sync::Arc;

use automation::ScanReport;
use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use common::{NotificationId, NotificationType, OrderId};
use record_store::{Notification, RecordStore};
use serde::Serialize;

use crate::error::ApiError;
use crate::routes::orders::AppState;

/// How many notifications the list endpoint returns.
const LIST_LIMIT: usize = 50;

#[derive(Serialize)]
pub struct NotificationResponse {
    pub id: NotificationId,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub order_id: Option<OrderId>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Notification> for NotificationResponse {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id,
            kind: notification.kind,
            title: notification.title.clone(),
            message: notification.message.clone(),
            order_id: notification.order_id,
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct NotificationListResponse {
    pub count: usize,
    pub unread_count: u64,
    pub data: Vec<NotificationResponse>,
}

#[derive(Serialize)]
pub struct MarkAllReadResponse {
    pub marked_read: u64,
}

/// GET /notifications — the most recent notifications plus the unread
/// count.
#[tracing::instrument(skip(state))]
pub async fn list<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<NotificationListResponse>, ApiError> {
    let store = state.engine.store();
    let notifications = store.recent_notifications(LIST_LIMIT).await?;
    let unread_count = store.unread_count().await?;

    Ok(Json(NotificationListResponse {
        count: notifications.len(),
        unread_count,
        data: notifications.iter().map(NotificationResponse::from).collect(),
    }))
}

/// PATCH /notifications/:id/read — mark one notification as read.
#[tracing::instrument(skip(state))]
pub async fn mark_read<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<NotificationResponse>, ApiError> {
    let uuid = uuid::Uuid::parse_str(&id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid notification id: {e}")))?;

    let notification = state
        .engine
        .store()
        .mark_read(NotificationId::from_uuid(uuid))
        .await?;
    Ok(Json(NotificationResponse::from(&notification)))
}

/// PATCH /notifications/read-all — mark every notification as read.
#[tracing::instrument(skip(state))]
pub async fn mark_all_read<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let marked_read = state.engine.store().mark_all_read().await?;
    Ok(Json(MarkAllReadResponse { marked_read }))
}

/// POST /notifications/check-now — run the automation rules once.
///
/// Safe alongside the scheduler; the dedup window keeps concurrent runs
/// from double-alerting.
#[tracing::instrument(skip(state))]
pub async fn check_now<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<ScanReport> {
    Json(state.scanner.run_checks().await)
}
