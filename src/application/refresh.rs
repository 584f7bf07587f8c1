use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::application::validator;
use crate::domain::{DashboardSnapshot, Plugin};
use crate::ports::{PluginSource, ProbeRunner, SnapshotStore};

/// What a refresh request amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A full cycle ran and swapped in the snapshot of this generation
    Published(u64),
    /// Another cycle was already in flight; this request was dropped
    Coalesced,
    /// Plugins could not be enumerated or shutdown began; the previous
    /// snapshot stays published
    Aborted,
}

/// Runs one full refresh cycle: discover plugins, execute them under the
/// worker pool, validate every output, and publish the assembled snapshot
/// atomically. Single-flight: concurrent requests coalesce into the cycle
/// already running.
pub struct RefreshService {
    registry: Arc<dyn PluginSource>,
    runner: Arc<dyn ProbeRunner>,
    store: Arc<dyn SnapshotStore>,
    timeout_secs: u64,
    in_flight: Mutex<()>,
    shutdown: watch::Receiver<bool>,
}

impl RefreshService {
    pub fn new(
        registry: Arc<dyn PluginSource>,
        runner: Arc<dyn ProbeRunner>,
        store: Arc<dyn SnapshotStore>,
        timeout_secs: u64,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            registry,
            runner,
            store,
            timeout_secs,
            in_flight: Mutex::new(()),
            shutdown,
        }
    }

    /// Request a cycle. Returns immediately with `Coalesced` when one is
    /// already running; requests are dropped, never queued.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            return RefreshOutcome::Coalesced;
        };
        self.run_cycle().await
    }

    async fn run_cycle(&self) -> RefreshOutcome {
        let plugins = match self.registry.discover().await {
            Ok(plugins) => plugins,
            Err(e) => {
                warn!("{}, keeping previous snapshot", e);
                return RefreshOutcome::Aborted;
            }
        };
        let enabled: Vec<Plugin> = plugins.into_iter().filter(|p| p.enabled).collect();
        let previous = self.store.latest();

        // One result per plugin, in discovery order regardless of which
        // child finishes first; the runner's pool bounds concurrency
        let results =
            futures::future::join_all(enabled.iter().map(|plugin| self.runner.run(plugin))).await;

        let mut sections = Vec::with_capacity(enabled.len());
        for (plugin, result) in enabled.iter().zip(&results) {
            debug!(
                plugin = %plugin.id,
                ok = result.succeeded(),
                duration_ms = result.duration.as_millis() as u64,
                "probe finished"
            );
            if !result.stderr.is_empty() {
                warn!(
                    plugin = %plugin.id,
                    stderr = %String::from_utf8_lossy(&result.stderr).trim(),
                    "probe wrote to stderr"
                );
            }
            let fallback_title = previous
                .section_title(&plugin.id)
                .map(str::to_string)
                .unwrap_or_else(|| plugin.display_title());
            sections.push(validator::validate(
                plugin,
                result,
                &fallback_title,
                self.timeout_secs,
            ));
        }

        if *self.shutdown.borrow() {
            info!("shutdown during refresh cycle, discarding results");
            return RefreshOutcome::Aborted;
        }

        let snapshot = DashboardSnapshot::new(previous.generation + 1, sections);
        let generation = snapshot.generation;
        let degraded = snapshot.sections.iter().filter(|s| s.is_degraded()).count();
        self.store.publish(snapshot);
        info!(
            generation,
            plugins = enabled.len(),
            degraded,
            "published dashboard snapshot"
        );
        RefreshOutcome::Published(generation)
    }
}
