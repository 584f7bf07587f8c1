use std::sync::{Arc, RwLock};

use crate::domain::DashboardSnapshot;
use crate::ports::SnapshotStore;

/// In-memory snapshot store. The lock is held only for the pointer swap,
/// so readers never observe a half-built snapshot and writers never block
/// readers for the duration of a cycle.
pub struct MemoryStore {
    current: RwLock<Arc<DashboardSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(DashboardSnapshot::empty())),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore for MemoryStore {
    fn publish(&self, snapshot: DashboardSnapshot) {
        *self.current.write().unwrap() = Arc::new(snapshot);
    }

    fn latest(&self) -> Arc<DashboardSnapshot> {
        self.current.read().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PluginId, Section};

    #[test]
    fn starts_with_the_empty_snapshot() {
        let store = MemoryStore::new();
        let latest = store.latest();
        assert_eq!(latest.generation, 0);
        assert!(latest.sections.is_empty());
    }

    #[test]
    fn publish_swaps_wholesale() {
        let store = MemoryStore::new();
        let held = store.latest();

        store.publish(DashboardSnapshot::new(
            1,
            vec![Section::ok(PluginId::new("00_vitals"), "System Vitals", vec![])],
        ));

        // Old readers keep their snapshot, new readers see the new one
        assert_eq!(held.generation, 0);
        let latest = store.latest();
        assert_eq!(latest.generation, 1);
        assert_eq!(latest.sections.len(), 1);
    }
}
