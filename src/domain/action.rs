use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Operator request to run a command offered by an action button. The
/// command is vetted against the latest published snapshot before anything
/// is executed; free-form command text is never accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    pub command: String,
    #[serde(default)]
    pub actor: Option<String>,
}

/// Outcome of one action invocation, returned to the caller. A non-zero
/// exit code is surfaced here, not as a transport error.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResult {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

impl ActionResult {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Why an action request was refused before or during launch
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("command is not offered by the current dashboard")]
    NotOffered,

    #[error("command is already running")]
    AlreadyRunning,

    #[error("failed to launch command: {0}")]
    Spawn(String),
}
