use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Unique identifier for a plugin, derived from its filename stem
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PluginId(String);

impl PluginId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PluginId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for PluginId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for PluginId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a probe script is launched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpreter {
    Python,
    Bash,
    Node,
    /// Executed directly; requires the executable bit
    Native,
}

impl Interpreter {
    /// Pick an interpreter from the file extension. `None` means the file
    /// is not a probe (e.g. a README dropped into the plugin directory).
    pub fn for_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("py") => Some(Self::Python),
            Some("sh") => Some(Self::Bash),
            Some("js") => Some(Self::Node),
            Some(_) => None,
            None => Some(Self::Native),
        }
    }
}

/// Sort key derived from the filename's numeric prefix, full name as
/// tiebreak. Plugins without a numeric prefix sort after numbered ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct OrderKey {
    prefix: u32,
    name: String,
}

impl OrderKey {
    pub fn from_file_name(name: &str) -> Self {
        let digits: String = name.chars().take_while(|c| c.is_ascii_digit()).collect();
        let prefix = digits.parse().unwrap_or(u32::MAX);
        Self {
            prefix,
            name: name.to_string(),
        }
    }
}

/// A probe executable discovered for one refresh cycle. Immutable once
/// discovered; the directory is re-scanned every cycle.
#[derive(Debug, Clone)]
pub struct Plugin {
    pub id: PluginId,
    pub path: PathBuf,
    pub order_key: OrderKey,
    pub interpreter: Interpreter,
    pub enabled: bool,
}

impl Plugin {
    /// Human-readable title derived from the filename, used when the probe
    /// never produced a title of its own ("10_disk_usage" -> "Disk Usage").
    pub fn display_title(&self) -> String {
        let stem = self.id.as_str();
        let trimmed = stem
            .trim_start_matches(|c: char| c.is_ascii_digit())
            .trim_start_matches(['_', '-']);

        let words: Vec<String> = trimmed
            .split(['_', '-'])
            .filter(|w| !w.is_empty())
            .map(capitalize)
            .collect();

        if words.is_empty() {
            stem.to_string()
        } else {
            words.join(" ")
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
