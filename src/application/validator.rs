use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::{Plugin, ProbeFailure, Section, Widget};
use crate::ports::ExecutionResult;

/// The document a probe must write to stdout
#[derive(Debug, Deserialize)]
struct RawSection {
    title: String,
    #[serde(default)]
    widgets: Vec<Widget>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Error)]
enum ContractViolation {
    #[error("not a contract document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("widget {index}: {problem}")]
    Widget { index: usize, problem: String },
}

fn parse_contract(stdout: &[u8]) -> Result<RawSection, ContractViolation> {
    let raw: RawSection = serde_json::from_slice(stdout)?;
    for (index, widget) in raw.widgets.iter().enumerate() {
        widget
            .validate()
            .map_err(|e| ContractViolation::Widget {
                index,
                problem: e.to_string(),
            })?;
    }
    Ok(raw)
}

/// Normalize one raw execution result into exactly one section. Timeout,
/// crash, and malformed output all collapse into the same degraded shape;
/// nothing downstream ever special-cases the cause.
///
/// `fallback_title` is the plugin's last-known or filename-derived title,
/// used when the probe never produced one.
pub fn validate(
    plugin: &Plugin,
    result: &ExecutionResult,
    fallback_title: &str,
    timeout_secs: u64,
) -> Section {
    if result.timed_out {
        return Section::failed(
            plugin.id.clone(),
            fallback_title,
            &ProbeFailure::Timeout(timeout_secs),
        );
    }

    if let Some(message) = &result.spawn_error {
        return Section::failed(
            plugin.id.clone(),
            fallback_title,
            &ProbeFailure::Spawn(message.clone()),
        );
    }

    match result.exit_code {
        Some(0) => {}
        Some(code) => {
            return Section::failed(plugin.id.clone(), fallback_title, &ProbeFailure::Crash(code));
        }
        None => {
            return Section::failed(plugin.id.clone(), fallback_title, &ProbeFailure::Signaled);
        }
    }

    match parse_contract(&result.stdout) {
        Ok(raw) => {
            let mut section = Section::ok(plugin.id.clone(), raw.title, raw.widgets);
            // A probe may self-report an error alongside its title
            section.error = raw.error;
            section
        }
        Err(violation) => {
            debug!(plugin = %plugin.id, %violation, "probe output rejected");
            Section::failed(
                plugin.id.clone(),
                fallback_title,
                &ProbeFailure::MalformedOutput,
            )
        }
    }
}
