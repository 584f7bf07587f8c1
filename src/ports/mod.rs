pub mod plugin_source;
pub mod probe_runner;
pub mod snapshot_store;

pub use plugin_source::{PluginSource, RegistryUnavailable};
pub use probe_runner::{ExecutionResult, ProbeRunner};
pub use snapshot_store::SnapshotStore;
