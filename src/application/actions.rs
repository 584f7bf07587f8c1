use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{info, warn};

use crate::application::refresh::RefreshService;
use crate::domain::{ActionError, ActionRequest, ActionResult};
use crate::ports::{ProbeRunner, SnapshotStore};

/// Executes operator-approved remediation commands. A command runs only if
/// it is byte-identical to one offered by an action button in the latest
/// published snapshot, so the engine never executes caller-supplied text.
/// At most one invocation per command string is in flight at a time;
/// distinct commands run concurrently.
pub struct ActionService {
    runner: Arc<dyn ProbeRunner>,
    store: Arc<dyn SnapshotStore>,
    refresh: Arc<RefreshService>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Removes the command from the in-flight set even when the invocation
/// future is dropped mid-run (e.g. the caller disconnected)
struct InFlightGuard {
    set: Arc<Mutex<HashSet<String>>>,
    command: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        // Must not panic in Drop; a poisoned set still needs the entry
        // cleared or the command stays blocked forever
        self.set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.command);
    }
}

impl ActionService {
    pub fn new(
        runner: Arc<dyn ProbeRunner>,
        store: Arc<dyn SnapshotStore>,
        refresh: Arc<RefreshService>,
    ) -> Self {
        Self {
            runner,
            store,
            refresh,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub async fn invoke(&self, request: ActionRequest) -> Result<ActionResult, ActionError> {
        if !self.store.latest().contains_command(&request.command) {
            warn!(command = %request.command, "rejected action not offered by the dashboard");
            return Err(ActionError::NotOffered);
        }

        let _guard = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            if !in_flight.insert(request.command.clone()) {
                return Err(ActionError::AlreadyRunning);
            }
            InFlightGuard {
                set: self.in_flight.clone(),
                command: request.command.clone(),
            }
        };

        info!(
            command = %request.command,
            actor = request.actor.as_deref().unwrap_or("unknown"),
            "invoking action"
        );
        let execution = self.runner.run_command(&request.command).await;
        if let Some(message) = execution.spawn_error {
            return Err(ActionError::Spawn(message));
        }

        let result = ActionResult {
            command: request.command,
            actor: request.actor,
            exit_code: execution.exit_code,
            stdout: String::from_utf8_lossy(&execution.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&execution.stderr).into_owned(),
            timed_out: execution.timed_out,
            duration_ms: execution.duration.as_millis() as u64,
            completed_at: Utc::now(),
        };

        if !result.succeeded() {
            warn!(
                command = %result.command,
                exit_code = ?result.exit_code,
                timed_out = result.timed_out,
                "action finished unsuccessfully"
            );
        }

        // Refresh out of band so the dashboard reflects the action's
        // effect; single-flight applies as usual
        let refresh = self.refresh.clone();
        tokio::spawn(async move {
            refresh.refresh().await;
        });

        Ok(result)
    }
}
