use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{PluginId, Widget};

/// Why a probe run produced no usable section. Every variant degrades to
/// the same shape: a section with empty widgets and an error string, so
/// downstream code never special-cases the cause.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeFailure {
    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("exit code {0}")]
    Crash(i32),

    #[error("terminated by signal")]
    Signaled,

    #[error("invalid output")]
    MalformedOutput,

    #[error("{0}")]
    Spawn(String),
}

/// One plugin's contribution to the dashboard. Empty widgets with no error
/// is valid: the probe chose to render nothing this cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub plugin: PluginId,
    pub title: String,
    pub widgets: Vec<Widget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Section {
    pub fn ok(plugin: PluginId, title: impl Into<String>, widgets: Vec<Widget>) -> Self {
        Self {
            plugin,
            title: title.into(),
            widgets,
            error: None,
        }
    }

    /// The canonical "probe failed" representation: empty widgets, error
    /// string describing the cause
    pub fn failed(plugin: PluginId, title: impl Into<String>, failure: &ProbeFailure) -> Self {
        Self {
            plugin,
            title: title.into(),
            widgets: Vec::new(),
            error: Some(failure.to_string()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_messages() {
        assert_eq!(ProbeFailure::Timeout(10).to_string(), "timed out after 10s");
        assert_eq!(ProbeFailure::Crash(2).to_string(), "exit code 2");
        assert_eq!(ProbeFailure::MalformedOutput.to_string(), "invalid output");
    }

    #[test]
    fn failed_section_has_empty_widgets_and_error() {
        let section = Section::failed(
            PluginId::new("10_disk"),
            "Disk Usage",
            &ProbeFailure::Timeout(5),
        );
        assert!(section.widgets.is_empty());
        assert_eq!(section.error.as_deref(), Some("timed out after 5s"));
        assert!(section.is_degraded());
    }
}
