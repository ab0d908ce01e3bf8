//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use record_store::RecordStore;
use serde::Serialize;

use crate::routes::orders::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Number of observers currently connected to the notification stream.
    pub observers: usize,
}

/// GET /health — liveness plus the live observer count.
pub async fn check<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        observers: state.publisher.observer_count().await,
    })
}
