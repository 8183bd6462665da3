use std::sync::Arc;

use tokio::time::{interval, Duration};

use crate::orchestrator::RecomputeOrchestrator;

/// Periodic recompute driver. Runs the full pipeline for all regions
/// every `interval_secs`. Skipped entirely when the interval is not
/// configured (on-demand mode).
pub struct RecomputeScheduler {
    orchestrator: Arc<RecomputeOrchestrator>,
    interval_secs: u64,
}

impl RecomputeScheduler {
    pub fn new(orchestrator: Arc<RecomputeOrchestrator>, interval_secs: u64) -> Self {
        Self {
            orchestrator,
            interval_secs,
        }
    }

    pub async fn run(&self) {
        tracing::info!(
            interval_secs = self.interval_secs,
            "Recompute scheduler started"
        );

        let mut tick = interval(Duration::from_secs(self.interval_secs.max(1)));
        // The first tick fires immediately; skip it so startup seeding
        // finishes before the first scheduled run
        tick.tick().await;
        loop {
            tick.tick().await;
            let summary = self.orchestrator.clone().run(None).await;
            if !summary.errors.is_empty() {
                tracing::warn!(
                    failed = summary.regions_failed,
                    errors = ?summary.errors,
                    "Scheduled recompute finished with errors"
                );
            }
        }
    }
}
