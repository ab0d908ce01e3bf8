//! Order CRUD and status transition endpoints.

use std::sync::Arc;

use automation::AutomationScanner;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, OrderStatus};
use lifecycle::{TransitionEngine, TransitionReceipt};
use publisher::EventPublisher;
use record_store::{Order, OrderFilter, RecordStore};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: RecordStore> {
    pub engine: TransitionEngine<S>,
    pub scanner: Arc<AutomationScanner<S>>,
    pub publisher: EventPublisher,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub total_cents: i64,
}

#[derive(Deserialize)]
pub struct ChangeStatusRequest {
    pub new_status: String,
    pub changed_by: Option<String>,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct ListOrdersParams {
    pub status: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct TransitionOption {
    pub status: OrderStatus,
    pub label: &'static str,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub allowed_transitions: Vec<TransitionOption>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.clone(),
            customer_name: order.customer_name.clone(),
            customer_email: order.customer_email.clone(),
            total_cents: order.total.cents(),
            status: order.status,
            status_label: order.status.label(),
            allowed_transitions: order
                .status
                .transitions()
                .iter()
                .map(|&status| TransitionOption {
                    status,
                    label: status.label(),
                })
                .collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct OrderReceiptResponse {
    pub order: OrderResponse,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
pub struct TransitionRecord {
    pub from: OrderStatus,
    pub from_label: &'static str,
    pub to: OrderStatus,
    pub to_label: &'static str,
    pub changed_by: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct ChangeStatusResponse {
    pub order: OrderResponse,
    pub transition: TransitionRecord,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
pub struct AuditEntryResponse {
    pub id: common::AuditLogId,
    pub order_id: OrderId,
    pub old_status: String,
    pub new_status: OrderStatus,
    pub changed_by: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&record_store::AuditLogEntry> for AuditEntryResponse {
    fn from(entry: &record_store::AuditLogEntry) -> Self {
        Self {
            id: entry.id,
            order_id: entry.order_id,
            old_status: entry.old_status_str().to_string(),
            new_status: entry.new_status,
            changed_by: entry.changed_by.clone(),
            reason: entry.reason.clone(),
            created_at: entry.created_at,
        }
    }
}

fn receipt_warnings(receipt: &TransitionReceipt) -> Vec<String> {
    receipt.warnings.iter().map(|w| w.to_string()).collect()
}

// -- Handlers --

/// POST /orders — create a new order.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderReceiptResponse>), ApiError> {
    let receipt = state
        .engine
        .create_order(lifecycle::NewOrder::new(
            req.customer_name,
            req.customer_email,
            Money::from_cents(req.total_cents),
        ))
        .await?;

    let response = OrderReceiptResponse {
        order: OrderResponse::from(&receipt.order),
        warnings: receipt_warnings(&receipt),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /orders — list orders, optionally filtered by status, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListOrdersParams>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let mut filter = OrderFilter::new();
    if let Some(ref status) = params.status {
        let status: OrderStatus = status
            .parse()
            .map_err(|e: common::ParseStatusError| ApiError::BadRequest(e.to_string()))?;
        filter = filter.with_status(status);
    }

    let orders = state.engine.store().find_orders(filter).await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// GET /orders/:id — load an order by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .engine
        .store()
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    Ok(Json(OrderResponse::from(&order)))
}

/// PATCH /orders/:id/status — apply a validated status transition.
#[tracing::instrument(skip(state, req))]
pub async fn change_status<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<ChangeStatusRequest>,
) -> Result<Json<ChangeStatusResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let new_status: OrderStatus = req
        .new_status
        .parse()
        .map_err(|e: common::ParseStatusError| ApiError::BadRequest(e.to_string()))?;
    let changed_by = req.changed_by.unwrap_or_else(|| "ADMIN".to_string());

    // The engine re-reads the current status; capture it for the response
    // from the audit entry rather than a second read.
    let receipt = state
        .engine
        .change_status(order_id, new_status, &changed_by, req.reason)
        .await?;

    let from = receipt
        .audit_entry
        .as_ref()
        .and_then(|entry| entry.old_status)
        .unwrap_or(new_status);

    let response = ChangeStatusResponse {
        transition: TransitionRecord {
            from,
            from_label: from.label(),
            to: new_status,
            to_label: new_status.label(),
            changed_by,
            timestamp: receipt.order.updated_at,
        },
        warnings: receipt_warnings(&receipt),
        order: OrderResponse::from(&receipt.order),
    };

    Ok(Json(response))
}

/// GET /orders/:id/audit — the order's transition timeline, oldest first.
#[tracing::instrument(skip(state))]
pub async fn audit_timeline<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AuditEntryResponse>>, ApiError> {
    let order_id = parse_order_id(&id)?;

    // 404 for unknown orders rather than an empty timeline.
    state
        .engine
        .store()
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    let entries = state
        .engine
        .store()
        .audit_entries_for_order(order_id)
        .await?;
    Ok(Json(entries.iter().map(AuditEntryResponse::from).collect()))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}
