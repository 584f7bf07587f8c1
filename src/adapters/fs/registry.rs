use std::collections::HashSet;
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{Interpreter, OrderKey, Plugin, PluginId};
use crate::ports::{PluginSource, RegistryUnavailable};

/// Plugin registry backed by one or more directories of probe scripts.
/// Re-scanned every cycle so probes can be dropped in or removed without
/// restarting the engine.
pub struct DirectoryRegistry {
    dirs: Vec<PathBuf>,
    disabled: HashSet<String>,
}

impl DirectoryRegistry {
    pub fn new(dirs: Vec<PathBuf>, disabled: impl IntoIterator<Item = String>) -> Self {
        Self {
            dirs,
            disabled: disabled.into_iter().collect(),
        }
    }

    async fn scan_dir(
        &self,
        dir: &Path,
        plugins: &mut Vec<Plugin>,
    ) -> Result<(), RegistryUnavailable> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(dir = %dir.display(), "plugin directory missing, treating as empty");
                return Ok(());
            }
            Err(e) => {
                return Err(RegistryUnavailable(format!("{}: {}", dir.display(), e)));
            }
        };

        loop {
            let entry = entries
                .next_entry()
                .await
                .map_err(|e| RegistryUnavailable(format!("{}: {}", dir.display(), e)))?;
            let Some(entry) = entry else { break };

            let path = entry.path();
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            match entry.file_type().await {
                Ok(ft) if ft.is_file() => {}
                _ => continue,
            }

            let Some(interpreter) = Interpreter::for_path(&path) else {
                debug!(file = name, "ignoring non-probe file");
                continue;
            };
            if interpreter == Interpreter::Native && !is_executable(&path).await {
                debug!(file = name, "ignoring file without executable bit");
                continue;
            }

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(name)
                .to_string();
            let enabled = !self.disabled.contains(&stem);

            plugins.push(Plugin {
                id: PluginId::new(stem),
                order_key: OrderKey::from_file_name(name),
                path,
                interpreter,
                enabled,
            });
        }

        Ok(())
    }
}

async fn is_executable(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[async_trait]
impl PluginSource for DirectoryRegistry {
    async fn discover(&self) -> Result<Vec<Plugin>, RegistryUnavailable> {
        let mut plugins = Vec::new();
        for dir in &self.dirs {
            self.scan_dir(dir, &mut plugins).await?;
        }
        plugins.sort_by(|a, b| a.order_key.cmp(&b.order_key));
        Ok(plugins)
    }
}
