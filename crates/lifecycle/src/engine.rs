//! The transition engine.

use chrono::Utc;
use common::{Money, NotificationType, OrderId, OrderStatus};
use publisher::EventPublisher;
use record_store::{AuditLogEntry, Notification, Order, RecordStore, StoreError};

use crate::error::{EngineWarning, LifecycleError};
use crate::order_number::generate_order_number;

/// Actor recorded for engine-initiated transitions.
pub const SYSTEM_ACTOR: &str = "SYSTEM";

/// Input for creating a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Name of the customer placing the order.
    pub customer_name: String,

    /// E-mail of the customer placing the order.
    pub customer_email: String,

    /// Monetary total. Zero and negative totals are accepted; the engine
    /// validates presence, not sign.
    pub total: Money,
}

impl NewOrder {
    /// Creates a new order request.
    pub fn new(
        customer_name: impl Into<String>,
        customer_email: impl Into<String>,
        total: Money,
    ) -> Self {
        Self {
            customer_name: customer_name.into(),
            customer_email: customer_email.into(),
            total,
        }
    }
}

/// Result of an accepted engine operation.
#[derive(Debug)]
pub struct TransitionReceipt {
    /// The order after the operation.
    pub order: Order,

    /// The audit entry recorded for the operation, if the append succeeded.
    pub audit_entry: Option<AuditLogEntry>,

    /// The notification persisted for the operation, if the insert
    /// succeeded.
    pub notification: Option<Notification>,

    /// Pipeline failures after the status write. Empty on a fully recorded
    /// operation.
    pub warnings: Vec<EngineWarning>,
}

/// The sole authority for moving an order between statuses.
///
/// Receives its store and publisher at construction; holds no global
/// state. The store's conditional update provides per-order mutual
/// exclusion, so the engine takes no locks of its own.
#[derive(Clone)]
pub struct TransitionEngine<S> {
    store: S,
    publisher: EventPublisher,
}

impl<S: RecordStore> TransitionEngine<S> {
    /// Creates a new engine with the given store and publisher.
    pub fn new(store: S, publisher: EventPublisher) -> Self {
        Self { store, publisher }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a reference to the publisher.
    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    /// Creates a new order in `AwaitingPayment`.
    ///
    /// Persists the order, appends the creation audit entry (`NEW` sentinel,
    /// actor `SYSTEM`), and persists and publishes a `NEW_ORDER`
    /// notification. A failed order insert aborts the whole operation;
    /// later pipeline failures are carried as warnings on the receipt.
    #[tracing::instrument(skip(self, request))]
    pub async fn create_order(
        &self,
        request: NewOrder,
    ) -> Result<TransitionReceipt, LifecycleError> {
        if request.customer_name.trim().is_empty() {
            return Err(LifecycleError::MissingField("customer_name"));
        }
        if request.customer_email.trim().is_empty() {
            return Err(LifecycleError::MissingField("customer_email"));
        }

        let order = Order::new(
            generate_order_number(),
            request.customer_name,
            request.customer_email,
            request.total,
        );
        let order = self.store.insert_order(order).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_number = %order.order_number, "order created");

        let mut warnings = Vec::new();

        let audit_entry = self
            .append_audit(
                AuditLogEntry::new(
                    order.id,
                    None,
                    OrderStatus::AwaitingPayment,
                    SYSTEM_ACTOR,
                    Some("Order created".to_string()),
                ),
                &mut warnings,
            )
            .await;

        let notification = self
            .persist_and_publish(
                Notification::new(
                    NotificationType::NewOrder,
                    format!("New Order: {}", order.order_number),
                    format!(
                        "New order from {} - {}",
                        order.customer_name, order.total
                    ),
                    Some(order.id),
                ),
                &mut warnings,
            )
            .await;

        Ok(TransitionReceipt {
            order,
            audit_entry,
            notification,
            warnings,
        })
    }

    /// Moves an order to `new_status` if the edge is legal.
    ///
    /// Validates the edge against the transition table, then applies it
    /// with a conditional write: if a concurrent writer moved the order
    /// first, the store reports a status conflict and nothing is recorded;
    /// retrying the whole call re-validates from the current status. On
    /// success the audit entry and `STATUS_CHANGE` notification follow in
    /// fixed order, with post-write failures carried as warnings.
    #[tracing::instrument(skip(self, reason))]
    pub async fn change_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
        actor: &str,
        reason: Option<String>,
    ) -> Result<TransitionReceipt, LifecycleError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(LifecycleError::OrderNotFound(order_id))?;
        let old_status = order.status;

        if !old_status.can_transition_to(new_status) {
            metrics::counter!("order_transitions_rejected_total").increment(1);
            return Err(LifecycleError::InvalidTransition {
                from: old_status,
                to: new_status,
                allowed: old_status.transitions().to_vec(),
            });
        }

        let order = self
            .store
            .update_order_status(order_id, old_status, new_status, Utc::now())
            .await
            .map_err(|err| match err {
                StoreError::OrderNotFound(id) => LifecycleError::OrderNotFound(id),
                other => LifecycleError::Store(other),
            })?;

        metrics::counter!("order_transitions_total").increment(1);
        tracing::info!(
            order_number = %order.order_number,
            from = %old_status,
            to = %new_status,
            actor,
            "order status changed"
        );

        let mut warnings = Vec::new();

        let reason = reason
            .unwrap_or_else(|| format!("Status changed from {old_status} to {new_status}"));
        let audit_entry = self
            .append_audit(
                AuditLogEntry::new(
                    order.id,
                    Some(old_status),
                    new_status,
                    actor,
                    Some(reason),
                ),
                &mut warnings,
            )
            .await;

        let notification = self
            .persist_and_publish(
                Notification::new(
                    NotificationType::StatusChange,
                    format!("Order {} Updated", order.order_number),
                    format!(
                        "Status: {} → {}",
                        old_status.label(),
                        new_status.label()
                    ),
                    Some(order.id),
                ),
                &mut warnings,
            )
            .await;

        self.publisher.publish_order_update(&order).await;

        Ok(TransitionReceipt {
            order,
            audit_entry,
            notification,
            warnings,
        })
    }

    /// Persists and publishes a notification without touching order state.
    ///
    /// This is the notification path the automation scanner raises alerts
    /// through.
    #[tracing::instrument(skip(self, title, message))]
    pub async fn notify(
        &self,
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        order_id: Option<OrderId>,
    ) -> Result<Notification, LifecycleError> {
        let notification = self
            .store
            .insert_notification(Notification::new(kind, title, message, order_id))
            .await?;
        self.publisher.publish(&notification).await;
        Ok(notification)
    }

    async fn append_audit(
        &self,
        entry: AuditLogEntry,
        warnings: &mut Vec<EngineWarning>,
    ) -> Option<AuditLogEntry> {
        match self.store.append_audit_entry(entry).await {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(error = %err, "audit entry not recorded for applied transition");
                warnings.push(EngineWarning::AuditAppendFailed(err));
                None
            }
        }
    }

    async fn persist_and_publish(
        &self,
        notification: Notification,
        warnings: &mut Vec<EngineWarning>,
    ) -> Option<Notification> {
        match self.store.insert_notification(notification).await {
            Ok(notification) => {
                self.publisher.publish(&notification).await;
                Some(notification)
            }
            Err(err) => {
                tracing::warn!(error = %err, "notification not persisted for applied transition");
                warnings.push(EngineWarning::NotificationPersistFailed(err));
                None
            }
        }
    }
}
