use common::{NotificationId, OrderId, OrderStatus, ParseNotificationTypeError, ParseStatusError};
use thiserror::Error;

/// Errors that can occur when interacting with the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The referenced notification does not exist.
    #[error("Notification not found: {0}")]
    NotificationNotFound(NotificationId),

    /// A conditional status update found the order in a different status
    /// than the caller expected. The caller read a stale status; retrying
    /// re-validates from the current one.
    #[error("Status conflict for order {order_id}: expected {expected}, found {actual}")]
    StatusConflict {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// An order with the same order number already exists.
    #[error("Duplicate order number: {0}")]
    DuplicateOrderNumber(String),

    /// A stored status column holds a value outside the status set.
    #[error("Invalid status value in store: {0}")]
    InvalidStoredStatus(String),

    /// A stored kind column holds a value outside the notification type set.
    #[error("Invalid notification type value in store: {0}")]
    InvalidStoredKind(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ParseStatusError> for StoreError {
    fn from(err: ParseStatusError) -> Self {
        StoreError::InvalidStoredStatus(err.given)
    }
}

impl From<ParseNotificationTypeError> for StoreError {
    fn from(err: ParseNotificationTypeError) -> Self {
        StoreError::InvalidStoredKind(err.given)
    }
}

/// Result type for record store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
