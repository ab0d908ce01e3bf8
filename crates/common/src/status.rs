//! Order status and the legal-transition table.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The status of an order in its lifecycle.
///
/// Legal transitions:
/// ```text
/// AwaitingPayment ──► Preparation, Cancelled
/// Preparation     ──► Shipped, Cancelled, Returned
/// Shipped         ──► Delivered, Returned, Disputed
/// Delivered       ──► Completed, Returned, Disputed
/// Completed, Returned, Disputed, Cancelled: terminal
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order placed, payment not yet received.
    #[default]
    AwaitingPayment,

    /// Payment received, order is being prepared.
    Preparation,

    /// Order handed to the carrier.
    Shipped,

    /// Order arrived at the customer.
    Delivered,

    /// Order finished (terminal state).
    Completed,

    /// Order sent back by the customer (terminal state).
    Returned,

    /// Order under dispute (terminal state).
    Disputed,

    /// Order cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::AwaitingPayment,
        OrderStatus::Preparation,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Completed,
        OrderStatus::Returned,
        OrderStatus::Disputed,
        OrderStatus::Cancelled,
    ];

    /// Returns the set of statuses directly reachable from this one.
    ///
    /// Terminal statuses return the empty slice. This table is the single
    /// source of truth for transition validity; it has no side effects and
    /// is safe for unsynchronized concurrent reads.
    pub fn transitions(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::AwaitingPayment => {
                &[OrderStatus::Preparation, OrderStatus::Cancelled]
            }
            OrderStatus::Preparation => &[
                OrderStatus::Shipped,
                OrderStatus::Cancelled,
                OrderStatus::Returned,
            ],
            OrderStatus::Shipped => &[
                OrderStatus::Delivered,
                OrderStatus::Returned,
                OrderStatus::Disputed,
            ],
            OrderStatus::Delivered => &[
                OrderStatus::Completed,
                OrderStatus::Returned,
                OrderStatus::Disputed,
            ],
            OrderStatus::Completed
            | OrderStatus::Returned
            | OrderStatus::Disputed
            | OrderStatus::Cancelled => &[],
        }
    }

    /// Returns true if `to` is directly reachable from this status.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        self.transitions().contains(&to)
    }

    /// Returns true if this is a terminal status (no outgoing transitions).
    pub fn is_terminal(&self) -> bool {
        self.transitions().is_empty()
    }

    /// Returns the wire form of the status (e.g. `AWAITING_PAYMENT`).
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::AwaitingPayment => "AWAITING_PAYMENT",
            OrderStatus::Preparation => "PREPARATION",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Returned => "RETURNED",
            OrderStatus::Disputed => "DISPUTED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Returns a human-readable label (e.g. "Awaiting Payment").
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::AwaitingPayment => "Awaiting Payment",
            OrderStatus::Preparation => "Preparation",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Completed => "Completed",
            OrderStatus::Returned => "Returned",
            OrderStatus::Disputed => "Disputed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unrecognized status string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid status '{given}'. Valid statuses: {}", valid_list())]
pub struct ParseStatusError {
    /// The unrecognized input.
    pub given: String,
}

fn valid_list() -> String {
    OrderStatus::ALL
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl std::str::FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| ParseStatusError {
                given: s.to_string(),
            })
    }
}
