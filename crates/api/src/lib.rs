//! HTTP and WebSocket surface for the order lifecycle engine.
//!
//! Provides REST endpoints for orders, audit logs, and notifications, a
//! WebSocket endpoint for real-time observers, and Prometheus metrics,
//! with structured logging via tracing.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use automation::AutomationScanner;
use axum::Router;
use axum::routing::{get, patch, post};
use lifecycle::TransitionEngine;
use metrics_exporter_prometheus::PrometheusHandle;
use publisher::EventPublisher;
use record_store::RecordStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: RecordStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route(
            "/orders/{id}/status",
            patch(routes::orders::change_status::<S>),
        )
        .route("/orders/{id}/audit", get(routes::orders::audit_timeline::<S>))
        .route("/audit-logs", get(routes::audit_logs::list::<S>))
        .route("/notifications", get(routes::notifications::list::<S>))
        .route(
            "/notifications/read-all",
            patch(routes::notifications::mark_all_read::<S>),
        )
        .route(
            "/notifications/{id}/read",
            patch(routes::notifications::mark_read::<S>),
        )
        .route(
            "/notifications/check-now",
            post(routes::notifications::check_now::<S>),
        )
        .route("/ws", get(routes::ws::upgrade::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the engine, publisher, and scanner around a store.
pub fn create_default_state<S: RecordStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    let publisher = EventPublisher::new();
    let engine = TransitionEngine::new(store, publisher.clone());
    let scanner = Arc::new(AutomationScanner::new(engine.clone()));

    Arc::new(AppState {
        engine,
        scanner,
        publisher,
    })
}
