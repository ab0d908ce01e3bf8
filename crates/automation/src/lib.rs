//! Stuck-order detection and alerting.
//!
//! This crate provides the automation side of the engine:
//! - [`AutomationRule`] describes one stuck-order condition: a candidate
//!   predicate over order state and age, a notification kind, and a
//!   re-alert window
//! - [`AutomationScanner`] runs every registered rule once per tick,
//!   deduplicates against recent notifications, and raises fresh alerts
//!   through the transition engine's notification path
//! - [`Scheduler`] owns the repeating tick with an explicit start/stop
//!   lifecycle and a tick-in-flight guard
//!
//! Scanning is read-heavy: it never mutates order status or audit history,
//! only creates notifications.

pub mod rules;
pub mod scanner;
pub mod scheduler;

pub use rules::{AutomationRule, DelayedShipmentRule, OverduePaymentRule};
pub use scanner::{AutomationScanner, RuleOutcome, ScanReport};
pub use scheduler::Scheduler;
