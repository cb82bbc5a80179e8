// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::orchestrator::RefreshOrchestrator;

/// Spawn a lightweight scheduler that keeps the snapshot warm.
///
/// Every tick calls `get_snapshot()`; when the cached entry is still live
/// this is a cheap hit, otherwise it triggers (or joins) a refresh. Failures
/// are logged and the next tick tries again.
pub fn spawn_refresh_scheduler(
    orchestrator: Arc<RefreshOrchestrator>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            counter!("scheduler_ticks_total").increment(1);

            match orchestrator.get_snapshot().await {
                Ok(snapshot) => {
                    gauge!("snapshot_items").set(snapshot.len() as f64);
                    tracing::info!(
                        target: "scheduler",
                        items = snapshot.len(),
                        captured_at = %snapshot.captured_at(),
                        "snapshot refresh tick"
                    );
                }
                Err(e) => {
                    counter!("scheduler_refresh_errors_total").increment(1);
                    tracing::warn!(
                        target: "scheduler",
                        error = %e,
                        kind = e.kind(),
                        "snapshot refresh tick failed"
                    );
                }
            }
        }
    })
}
