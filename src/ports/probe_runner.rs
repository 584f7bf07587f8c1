use std::time::Duration;

use async_trait::async_trait;

use crate::domain::Plugin;

/// Raw outcome of one child process run. Owned by the runner until handed
/// to the validator; failure causes are not interpreted here.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// None when the child was killed by a signal
    pub exit_code: Option<i32>,
    pub duration: Duration,
    pub timed_out: bool,
    /// Set when the child could not be launched at all
    pub spawn_error: Option<String>,
}

impl ExecutionResult {
    pub fn spawn_failure(message: impl Into<String>) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_code: None,
            duration: Duration::ZERO,
            timed_out: false,
            spawn_error: Some(message.into()),
        }
    }

    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.spawn_error.is_none() && self.exit_code == Some(0)
    }
}

/// Port for running probes and vetted action commands out of process
#[async_trait]
pub trait ProbeRunner: Send + Sync {
    /// Run one probe under timeout and worker-pool limits. Never fails:
    /// every problem is recorded inside the result.
    async fn run(&self, plugin: &Plugin) -> ExecutionResult;

    /// Run a vetted action command through the shell, under the same
    /// isolation discipline as a probe but outside the probe worker pool
    async fn run_command(&self, command: &str) -> ExecutionResult;
}
