//! Audit log query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use common::OrderId;
use record_store::RecordStore;
use serde::Deserialize;

use crate::error::ApiError;
use crate::routes::orders::{AppState, AuditEntryResponse};

const DEFAULT_LIMIT: usize = 50;

#[derive(Deserialize)]
pub struct AuditLogParams {
    pub order_id: Option<uuid::Uuid>,
    pub limit: Option<usize>,
}

/// GET /audit-logs — recent audit entries, newest first; with `order_id`,
/// that order's timeline oldest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<AuditLogParams>,
) -> Result<Json<Vec<AuditEntryResponse>>, ApiError> {
    let store = state.engine.store();

    let entries = match params.order_id {
        Some(uuid) => {
            store
                .audit_entries_for_order(OrderId::from_uuid(uuid))
                .await?
        }
        None => {
            store
                .recent_audit_entries(params.limit.unwrap_or(DEFAULT_LIMIT))
                .await?
        }
    };

    Ok(Json(entries.iter().map(AuditEntryResponse::from).collect()))
}
