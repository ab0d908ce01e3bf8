//! Best-effort real-time fan-out of notifications to connected observers.
//!
//! The publisher keeps a synchronized registry of observer channels and
//! pushes serialized frames to every one of them. Delivery is
//! fire-and-forget: a dead observer is evicted, the others still receive
//! the frame, and the caller never sees a failure. Observers get no
//! backlog on connect; catching up on history is the query surface's job.

pub mod wire;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use record_store::{Notification, Order};
use tokio::sync::RwLock;
use tokio::sync::mpsc::UnboundedSender;

pub use wire::{NotificationPayload, OrderPayload, WireMessage};

/// Handle identifying a registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl std::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Default)]
struct PublisherInner {
    observers: RwLock<HashMap<ObserverId, UnboundedSender<String>>>,
    next_id: AtomicU64,
}

/// Fan-out publisher for observer-facing frames.
///
/// Cheap to clone; all clones share the same observer registry. The
/// registry is mutated concurrently by connect, disconnect, and publish,
/// so it lives behind an async `RwLock`.
#[derive(Clone, Default)]
pub struct EventPublisher {
    inner: Arc<PublisherInner>,
}

impl EventPublisher {
    /// Creates a new publisher with no observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer channel and returns its handle.
    pub async fn register_observer(&self, sender: UnboundedSender<String>) -> ObserverId {
        let id = ObserverId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.observers.write().await.insert(id, sender);
        tracing::debug!(observer = %id, "observer connected");
        id
    }

    /// Removes an observer. Returns true if it was still registered.
    pub async fn unregister_observer(&self, id: ObserverId) -> bool {
        let removed = self.inner.observers.write().await.remove(&id).is_some();
        if removed {
            tracing::debug!(observer = %id, "observer disconnected");
        }
        removed
    }

    /// Returns the number of currently registered observers.
    pub async fn observer_count(&self) -> usize {
        self.inner.observers.read().await.len()
    }

    /// Fans a notification frame out to every observer.
    ///
    /// Returns the number of observers the frame was handed to. Never
    /// fails: with no observers this is a no-op, and an observer whose
    /// channel is closed is evicted without affecting the others.
    pub async fn publish(&self, notification: &Notification) -> usize {
        let delivered = self.broadcast(WireMessage::notification(notification)).await;
        metrics::counter!("notifications_published_total").increment(1);
        tracing::debug!(
            title = %notification.title,
            delivered,
            "notification broadcast"
        );
        delivered
    }

    /// Fans an order update frame out to every observer.
    pub async fn publish_order_update(&self, order: &Order) -> usize {
        self.broadcast(WireMessage::order_update(order)).await
    }

    async fn broadcast(&self, frame: WireMessage) -> usize {
        let text = match frame.to_json() {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize frame");
                return 0;
            }
        };

        let mut dead = Vec::new();
        let mut delivered = 0;

        {
            let observers = self.inner.observers.read().await;
            for (id, sender) in observers.iter() {
                if sender.send(text.clone()).is_ok() {
                    delivered += 1;
                } else {
                    dead.push(*id);
                }
            }
        }

        if !dead.is_empty() {
            let mut observers = self.inner.observers.write().await;
            for id in dead {
                observers.remove(&id);
                tracing::debug!(observer = %id, "evicted dead observer");
            }
        }

        delivered
    }
}
