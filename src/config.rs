use std::env;
use std::path::PathBuf;

use serde::Deserialize;

/// Application configuration. Values come from environment variables,
/// falling back to an optional TOML file named by `PROBEMON_CONFIG`, then
/// to defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub plugin_dirs: Vec<PathBuf>,
    /// Seconds between scheduled refresh cycles
    pub refresh_interval: u64,
    /// Per-probe wall-clock timeout, seconds
    pub plugin_timeout: u64,
    /// Per-action wall-clock timeout, seconds
    pub action_timeout: u64,
    /// Maximum concurrent probe child processes
    pub pool_width: usize,
    /// Seconds between SIGTERM and SIGKILL when terminating a child
    pub kill_grace: u64,
    /// Plugin ids excluded from execution
    pub disabled: Vec<String>,
    /// Shared secret for the x-agent-secret header; unset disables auth
    pub secret: Option<String>,
    pub log_level: String,
}

/// TOML overlay, every field optional
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    port: Option<u16>,
    plugin_dirs: Option<Vec<String>>,
    refresh_interval: Option<u64>,
    plugin_timeout: Option<u64>,
    action_timeout: Option<u64>,
    pool_width: Option<usize>,
    kill_grace: Option<u64>,
    disabled: Option<Vec<String>>,
    secret: Option<String>,
    log_level: Option<String>,
}

impl FileConfig {
    // Runs before the tracing subscriber exists, so problems are returned
    // as warning strings for main to log after init
    fn load(warnings: &mut Vec<String>) -> Self {
        let Some(path) = env::var("PROBEMON_CONFIG").ok() else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(contents) => Self::parse(&contents, &path, warnings),
            Err(e) => {
                warnings.push(format!("cannot read config file {}: {}, ignoring", path, e));
                Self::default()
            }
        }
    }

    fn parse(contents: &str, origin: &str, warnings: &mut Vec<String>) -> Self {
        match toml::from_str(contents) {
            Ok(config) => config,
            Err(e) => {
                warnings.push(format!(
                    "cannot parse config file {}: {}, ignoring",
                    origin, e
                ));
                Self::default()
            }
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

fn split_list(raw: &str, separator: char) -> Vec<String> {
    raw.split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn load() -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        let file = FileConfig::load(&mut warnings);
        (Self::from_file(file), warnings)
    }

    fn from_file(file: FileConfig) -> Self {
        let plugin_dirs = env::var("PROBEMON_PLUGIN_DIRS")
            .ok()
            .map(|raw| split_list(&raw, ':'))
            .or(file.plugin_dirs)
            .unwrap_or_else(|| vec!["./plugins".to_string()])
            .into_iter()
            .map(PathBuf::from)
            .collect();

        let disabled = env::var("PROBEMON_DISABLED")
            .ok()
            .map(|raw| split_list(&raw, ','))
            .or(file.disabled)
            .unwrap_or_default();

        Self {
            port: env_parse("PROBEMON_PORT").or(file.port).unwrap_or(3000),
            plugin_dirs,
            refresh_interval: env_parse("PROBEMON_REFRESH_INTERVAL")
                .or(file.refresh_interval)
                .unwrap_or(10),
            plugin_timeout: env_parse("PROBEMON_PLUGIN_TIMEOUT")
                .or(file.plugin_timeout)
                .unwrap_or(10),
            action_timeout: env_parse("PROBEMON_ACTION_TIMEOUT")
                .or(file.action_timeout)
                .unwrap_or(300),
            pool_width: env_parse("PROBEMON_POOL_WIDTH")
                .or(file.pool_width)
                .unwrap_or(4)
                .max(1),
            kill_grace: env_parse("PROBEMON_KILL_GRACE")
                .or(file.kill_grace)
                .unwrap_or(2),
            disabled,
            secret: env::var("PROBEMON_SECRET").ok().or(file.secret),
            log_level: env::var("PROBEMON_LOG_LEVEL")
                .ok()
                .or(file.log_level)
                .unwrap_or_else(|| "info".to_string()),
        }
    }
}
