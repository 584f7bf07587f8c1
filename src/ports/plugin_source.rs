use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Plugin;

/// Plugin enumeration failed outright (directory exists but cannot be
/// read). Distinct from a missing or empty directory, which yields an
/// empty plugin list. Aborts the current cycle; the previous snapshot
/// stays published.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("plugin registry unavailable: {0}")]
pub struct RegistryUnavailable(pub String);

/// Port for discovering probe executables
#[async_trait]
pub trait PluginSource: Send + Sync {
    /// Enumerate plugins in ordering-key order. A missing or empty
    /// directory is an empty list, not an error.
    async fn discover(&self) -> Result<Vec<Plugin>, RegistryUnavailable>;
}
