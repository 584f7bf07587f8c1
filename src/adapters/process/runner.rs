use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::{watch, OnceCell, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::{Interpreter, Plugin};
use crate::ports::{ExecutionResult, ProbeRunner};

/// Runs probes and action commands as isolated child processes. A
/// semaphore bounds concurrent probe children so a large plugin directory
/// cannot storm the host; timeouts terminate with SIGTERM first and
/// SIGKILL after a grace period.
pub struct ProcessRunner {
    probe_timeout: Duration,
    action_timeout: Duration,
    kill_grace: Duration,
    pool: Semaphore,
    python: OnceCell<Option<String>>,
    shutdown: watch::Receiver<bool>,
}

impl ProcessRunner {
    pub fn new(
        probe_timeout: Duration,
        action_timeout: Duration,
        kill_grace: Duration,
        pool_width: usize,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            probe_timeout,
            action_timeout,
            kill_grace,
            pool: Semaphore::new(pool_width),
            python: OnceCell::new(),
            shutdown,
        }
    }

    /// Detect the Python interpreter once and cache the answer
    async fn python_command(&self) -> Option<String> {
        self.python
            .get_or_init(|| async {
                for candidate in ["python3", "python"] {
                    let probe = Command::new(candidate)
                        .arg("--version")
                        .stdout(Stdio::null())
                        .stderr(Stdio::null())
                        .status()
                        .await;
                    if matches!(probe, Ok(status) if status.success()) {
                        debug!(python = candidate, "detected Python interpreter");
                        return Some(candidate.to_string());
                    }
                }
                None
            })
            .await
            .clone()
    }

    async fn command_for(&self, plugin: &Plugin) -> Result<Command, String> {
        let cmd = match plugin.interpreter {
            Interpreter::Python => {
                let Some(python) = self.python_command().await else {
                    return Err("python not found (tried python3 and python)".to_string());
                };
                let mut c = Command::new(python);
                c.arg(&plugin.path);
                c
            }
            Interpreter::Bash => {
                let mut c = Command::new("bash");
                c.arg(&plugin.path);
                c
            }
            Interpreter::Node => {
                let mut c = Command::new("node");
                c.arg(&plugin.path);
                c
            }
            Interpreter::Native => Command::new(&plugin.path),
        };
        Ok(cmd)
    }

    async fn execute(&self, mut cmd: Command, limit: Duration) -> ExecutionResult {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return ExecutionResult::spawn_failure(e.to_string()),
        };

        // Drain pipes concurrently so a chatty child never blocks on a
        // full pipe buffer
        let stdout_task = drain(child.stdout.take());
        let stderr_task = drain(child.stderr.take());

        let mut shutdown = self.shutdown.clone();
        let mut timed_out = false;
        let mut wait_error = None;
        let status = tokio::select! {
            res = tokio::time::timeout(limit, child.wait()) => match res {
                Ok(Ok(status)) => Some(status),
                Ok(Err(e)) => {
                    warn!("failed to wait on child: {}", e);
                    wait_error = Some(format!("wait failed: {}", e));
                    None
                }
                Err(_) => {
                    timed_out = true;
                    self.terminate(&mut child).await;
                    None
                }
            },
            _ = shutdown.changed() => {
                self.terminate(&mut child).await;
                None
            }
        };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();

        ExecutionResult {
            // A timed-out probe's partial output is untrustworthy
            stdout: if timed_out { Vec::new() } else { stdout },
            stderr,
            exit_code: status.and_then(|s| s.code()),
            duration: start.elapsed(),
            timed_out,
            // A wait() failure is a launch-side problem, not a signal kill
            spawn_error: wait_error,
        }
    }

    /// SIGTERM, wait out the grace period, then SIGKILL
    async fn terminate(&self, child: &mut Child) {
        if let Some(pid) = child.id() {
            let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            if tokio::time::timeout(self.kill_grace, child.wait())
                .await
                .is_ok()
            {
                return;
            }
            warn!(pid, "child ignored SIGTERM, sending SIGKILL");
        }
        let _ = child.start_kill();
        let _ = child.wait().await;
    }
}

fn drain<R>(pipe: Option<R>) -> JoinHandle<Vec<u8>>
where
    R: AsyncReadExt + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        buf
    })
}

#[async_trait]
impl ProbeRunner for ProcessRunner {
    async fn run(&self, plugin: &Plugin) -> ExecutionResult {
        let _permit = match self.pool.acquire().await {
            Ok(permit) => permit,
            Err(_) => return ExecutionResult::spawn_failure("worker pool closed"),
        };
        let cmd = match self.command_for(plugin).await {
            Ok(cmd) => cmd,
            Err(message) => return ExecutionResult::spawn_failure(message),
        };
        self.execute(cmd, self.probe_timeout).await
    }

    async fn run_command(&self, command: &str) -> ExecutionResult {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        self.execute(cmd, self.action_timeout).await
    }
}
