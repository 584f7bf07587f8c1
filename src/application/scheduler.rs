use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::application::refresh::{RefreshOutcome, RefreshService};

/// Periodic driver for refresh cycles. The first tick fires immediately so
/// the dashboard is populated at startup; ticks that land while a cycle is
/// still running are skipped, never queued.
pub struct Scheduler {
    refresh: Arc<RefreshService>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl Scheduler {
    pub fn new(
        refresh: Arc<RefreshService>,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            refresh,
            interval,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.refresh.refresh().await {
                        RefreshOutcome::Published(generation) => {
                            debug!(generation, "scheduled refresh complete");
                        }
                        RefreshOutcome::Coalesced => {
                            debug!("tick coalesced into in-flight cycle");
                        }
                        RefreshOutcome::Aborted => {}
                    }
                }
                _ = self.shutdown.changed() => {
                    info!("scheduler stopping");
                    return;
                }
            }
        }
    }
}
