//! The automation scanner.

use chrono::{DateTime, Utc};
use lifecycle::{LifecycleError, TransitionEngine};
use record_store::{NotificationFilter, RecordStore};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::rules::{AutomationRule, DelayedShipmentRule, OverduePaymentRule};

/// Outcome of one rule within a scan.
#[derive(Debug, Serialize)]
pub struct RuleOutcome {
    /// The rule's identifier.
    pub rule: &'static str,

    /// Number of fresh alerts the rule raised this scan.
    pub new_alerts: usize,

    /// Failure message if the rule's queries failed; the other rules still
    /// ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of one full scan over all rules.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    /// When the scan ran.
    pub ran_at: DateTime<Utc>,

    /// One outcome per registered rule, in registration order.
    pub outcomes: Vec<RuleOutcome>,
}

impl ScanReport {
    /// Total fresh alerts across all rules.
    pub fn total_new_alerts(&self) -> usize {
        self.outcomes.iter().map(|o| o.new_alerts).sum()
    }
}

/// Periodically detects orders stuck past a rule's threshold and raises
/// deduplicated alerts through the engine's notification path.
///
/// The scanner never mutates order status or audit history.
pub struct AutomationScanner<S> {
    engine: TransitionEngine<S>,
    rules: Vec<Box<dyn AutomationRule>>,
    tick_lock: Mutex<()>,
}

impl<S: RecordStore> AutomationScanner<S> {
    /// Creates a scanner with the two built-in rules (overdue payment,
    /// delayed shipment).
    pub fn new(engine: TransitionEngine<S>) -> Self {
        Self::with_rules(
            engine,
            vec![Box::new(OverduePaymentRule), Box::new(DelayedShipmentRule)],
        )
    }

    /// Creates a scanner with a custom rule set.
    pub fn with_rules(engine: TransitionEngine<S>, rules: Vec<Box<dyn AutomationRule>>) -> Self {
        Self {
            engine,
            rules,
            tick_lock: Mutex::new(()),
        }
    }

    /// Registers an additional rule.
    pub fn register(&mut self, rule: Box<dyn AutomationRule>) {
        self.rules.push(rule);
    }

    /// Returns the number of registered rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Runs every rule once and reports per-rule alert counts.
    ///
    /// Never fails: a rule whose queries error is recorded on the report
    /// and logged, and the remaining rules still run. Safe to invoke
    /// manually (e.g. from an operator endpoint) alongside the scheduler;
    /// the dedup window keeps concurrent runs from double-alerting.
    #[tracing::instrument(skip(self))]
    pub async fn run_checks(&self) -> ScanReport {
        let ran_at = Utc::now();
        let mut outcomes = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            let outcome = match self.run_rule(rule.as_ref(), ran_at).await {
                Ok(new_alerts) => RuleOutcome {
                    rule: rule.name(),
                    new_alerts,
                    error: None,
                },
                Err(err) => {
                    tracing::error!(rule = rule.name(), error = %err, "automation rule failed");
                    RuleOutcome {
                        rule: rule.name(),
                        new_alerts: 0,
                        error: Some(err.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }

        let report = ScanReport { ran_at, outcomes };
        tracing::info!(
            new_alerts = report.total_new_alerts(),
            "automation check completed"
        );
        report
    }

    /// Runs a scan unless one is already in flight.
    ///
    /// This is the scheduler's entry point: a tick that lands while the
    /// previous tick is still running is skipped, not queued, so
    /// overlapping scans cannot race each other into duplicate alerts.
    pub async fn try_tick(&self) -> Option<ScanReport> {
        let Ok(_guard) = self.tick_lock.try_lock() else {
            return None;
        };
        Some(self.run_checks().await)
    }

    async fn run_rule(
        &self,
        rule: &dyn AutomationRule,
        now: DateTime<Utc>,
    ) -> Result<usize, LifecycleError> {
        let candidates = self
            .engine
            .store()
            .find_orders(rule.candidate_filter(now))
            .await?;

        let mut new_alerts = 0;
        for order in candidates {
            let window_start = now - rule.realert_window();
            let existing = self
                .engine
                .store()
                .find_notifications(
                    NotificationFilter::new()
                        .with_order(order.id)
                        .with_kind(rule.kind())
                        .with_created_after(window_start),
                )
                .await?;

            if existing.is_empty() {
                self.engine
                    .notify(
                        rule.kind(),
                        rule.title(&order),
                        rule.message(&order),
                        Some(order.id),
                    )
                    .await?;
                metrics::counter!("automation_alerts_total").increment(1);
                tracing::info!(
                    rule = rule.name(),
                    order_number = %order.order_number,
                    "stuck-order alert raised"
                );
                new_alerts += 1;
            }
        }

        Ok(new_alerts)
    }
}
