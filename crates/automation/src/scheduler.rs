//! Interval scheduler owning the repeating automation tick.

use std::sync::Arc;
use std::time::Duration;

use record_store::RecordStore;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::scanner::AutomationScanner;

/// Owns the background task that ticks the scanner on a fixed interval.
///
/// The first tick fires immediately at start. Ticks missed while a scan is
/// running are skipped (never queued), both by the interval's missed-tick
/// behavior and by the scanner's own in-flight guard.
pub struct Scheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Scheduler {
    /// Starts the repeating tick.
    ///
    /// `interval` must be non-zero. The default cadence is once per
    /// minute; production deployments should widen it.
    pub fn start<S>(scanner: Arc<AutomationScanner<S>>, interval: Duration) -> Self
    where
        S: RecordStore + 'static,
    {
        let (shutdown, mut rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!(
                interval_secs = interval.as_secs_f64(),
                "automation scheduler started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if scanner.try_tick().await.is_none() {
                            tracing::warn!("previous automation tick still running, skipping");
                        }
                    }
                    changed = rx.changed() => {
                        if changed.is_err() || *rx.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("automation scheduler stopped");
        });

        Self { shutdown, handle }
    }

    /// Signals shutdown and waits for the tick task to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }

    /// Returns true if the tick task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
