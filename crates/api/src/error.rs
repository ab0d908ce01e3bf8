//! API error types with HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::OrderStatus;
use lifecycle::LifecycleError;
use record_store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Engine error.
    Lifecycle(LifecycleError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(msg) => error_body(StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => error_body(StatusCode::BAD_REQUEST, msg),
            ApiError::Lifecycle(err) => lifecycle_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                error_body(StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        }
    }
}

fn error_body(status: StatusCode, message: String) -> Response {
    let body = serde_json::json!({ "error": message });
    (status, Json(body)).into_response()
}

fn lifecycle_error_to_response(err: LifecycleError) -> Response {
    match &err {
        LifecycleError::OrderNotFound(_) => error_body(StatusCode::NOT_FOUND, err.to_string()),
        LifecycleError::MissingField(_) => error_body(StatusCode::BAD_REQUEST, err.to_string()),
        LifecycleError::InvalidTransition { from, allowed, .. } => {
            let message = if allowed.is_empty() {
                format!("'{}' is an end state; no transitions are allowed", from.label())
            } else {
                format!(
                    "From '{}' you can only transition to: {}",
                    from.label(),
                    allowed
                        .iter()
                        .map(|s| s.label())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            };
            let body = serde_json::json!({
                "error": err.to_string(),
                "message": message,
                "allowed_transitions": allowed
                    .iter()
                    .map(|s| transition_option(*s))
                    .collect::<Vec<_>>(),
            });
            (StatusCode::CONFLICT, Json(body)).into_response()
        }
        // A lost compare-and-swap or a duplicate order number is a conflict
        // the caller can retry; other store failures are internal.
        LifecycleError::Store(StoreError::StatusConflict { .. })
        | LifecycleError::Store(StoreError::DuplicateOrderNumber(_)) => {
            error_body(StatusCode::CONFLICT, err.to_string())
        }
        LifecycleError::Store(_) => {
            tracing::error!(error = %err, "store failure");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn transition_option(status: OrderStatus) -> serde_json::Value {
    serde_json::json!({ "status": status, "label": status.label() })
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        ApiError::Lifecycle(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotificationNotFound(id) => {
                ApiError::NotFound(format!("Notification {id} not found"))
            }
            StoreError::OrderNotFound(id) => ApiError::NotFound(format!("Order {id} not found")),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
