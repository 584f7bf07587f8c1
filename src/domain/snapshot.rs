use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PluginId, Section, Widget};

/// One complete, ordered, immutable aggregation of all sections for a
/// cycle. Section order matches plugin discovery order; readers always see
/// a whole snapshot, never a partially-built one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub sections: Vec<Section>,
    pub generated_at: DateTime<Utc>,
    pub generation: u64,
}

impl DashboardSnapshot {
    /// The startup snapshot, before any cycle has run
    pub fn empty() -> Self {
        Self {
            sections: Vec::new(),
            generated_at: Utc::now(),
            generation: 0,
        }
    }

    pub fn new(generation: u64, sections: Vec<Section>) -> Self {
        Self {
            sections,
            generated_at: Utc::now(),
            generation,
        }
    }

    /// Every command currently offered by an action button widget
    pub fn action_commands(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .flat_map(|s| s.widgets.iter())
            .filter_map(Widget::command)
    }

    /// Byte-identical membership test used to vet action requests
    pub fn contains_command(&self, command: &str) -> bool {
        self.action_commands().any(|c| c == command)
    }

    /// Last-known title for a plugin, used when a probe fails before it
    /// could produce one
    pub fn section_title(&self, plugin: &PluginId) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| &s.plugin == plugin)
            .map(|s| s.title.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn action_section(plugin: &str, command: &str) -> Section {
        let widget = serde_json::from_value(json!({
            "type": "action_button",
            "data": { "label": "Run", "command": command }
        }))
        .unwrap();
        Section::ok(PluginId::new(plugin), "Actions", vec![widget])
    }

    #[test]
    fn empty_snapshot_is_generation_zero() {
        let snapshot = DashboardSnapshot::empty();
        assert_eq!(snapshot.generation, 0);
        assert!(snapshot.sections.is_empty());
        assert!(!snapshot.contains_command("anything"));
    }

    #[test]
    fn contains_command_is_byte_identical() {
        let snapshot = DashboardSnapshot::new(1, vec![action_section("50_update", "apt-get update")]);
        assert!(snapshot.contains_command("apt-get update"));
        assert!(!snapshot.contains_command("apt-get  update"));
        assert!(!snapshot.contains_command("apt-get update "));
    }

    #[test]
    fn section_title_lookup() {
        let snapshot = DashboardSnapshot::new(
            3,
            vec![Section::ok(PluginId::new("10_disk"), "Disk Usage", vec![])],
        );
        assert_eq!(
            snapshot.section_title(&PluginId::new("10_disk")),
            Some("Disk Usage")
        );
        assert_eq!(snapshot.section_title(&PluginId::new("20_docker")), None);
    }
}
