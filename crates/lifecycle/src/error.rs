//! Engine error and warning types.

use common::{OrderId, OrderStatus};
use record_store::StoreError;
use thiserror::Error;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The referenced order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// A required input field was missing or blank.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The requested edge is not in the transition table. Carries the full
    /// set of statuses reachable from `from` so callers can present only
    /// valid choices.
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
        allowed: Vec<OrderStatus>,
    },

    /// The store could not complete a read or write. The transition was
    /// not recorded; retrying the whole call re-validates from the current
    /// status.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// A non-fatal pipeline failure after the status write.
///
/// The status change itself is durable at this point; what failed is a
/// later step of the fixed-order pipeline, leaving the audit trail or
/// notification log incomplete relative to the status. Surfaced on the
/// [`TransitionReceipt`](crate::TransitionReceipt) rather than swallowed.
#[derive(Debug, Error)]
pub enum EngineWarning {
    /// The audit entry for an applied transition could not be appended.
    #[error("Audit entry not recorded: {0}")]
    AuditAppendFailed(StoreError),

    /// The notification for an applied transition could not be persisted.
    #[error("Notification not persisted: {0}")]
    NotificationPersistFailed(StoreError),
}
