// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::aggregate::Aggregator;

/// Spawn the periodic fetch-and-persist task. The first tick fires immediately.
pub fn spawn_scheduler(aggregator: Arc<Aggregator>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match aggregator.fetch_and_store().await {
                Ok(report) => tracing::info!(
                    target: "ingest",
                    stored = report.stored(),
                    skipped = report.skipped(),
                    failed = report.failed(),
                    "scheduled ingest tick"
                ),
                Err(e) => tracing::error!(target: "ingest", error = %e, "scheduled ingest failed"),
            }
        }
    })
}
