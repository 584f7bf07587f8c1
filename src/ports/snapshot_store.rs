use std::sync::Arc;

use crate::domain::DashboardSnapshot;

/// Port for the single shared dashboard value. Created empty at startup,
/// replaced wholesale each successful cycle, read-only everywhere else.
pub trait SnapshotStore: Send + Sync {
    /// Atomically replace the published snapshot
    fn publish(&self, snapshot: DashboardSnapshot);

    /// The latest complete snapshot. Never blocks on an in-flight cycle.
    fn latest(&self) -> Arc<DashboardSnapshot>;
}
