// Settings store for the sync daemon.
//
// Config file: `~/.vaultsync/config.toml`, overridable with `--config` or
// the `VAULTSYNC_CONFIG` environment variable.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::git::ops::{DEFAULT_BRANCH, DEFAULT_COMMIT_MESSAGE, DEFAULT_REMOTE};

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "VAULTSYNC_CONFIG";

/// Root directory for vaultsync state: `~/.vaultsync/`.
pub fn global_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".vaultsync"))
}

/// Path to the default config file: `~/.vaultsync/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    global_dir().map(|d| d.join("config.toml"))
}

/// Resolve the config path: explicit argument, then `VAULTSYNC_CONFIG`, then
/// the default location.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(path));
    }
    default_config_path()
}

// ── Sync config ────────────────────────────────────────────────────

/// Everything the scheduler reads. Replaced wholesale through
/// `SyncScheduler::update_config`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Run timer and file-event cycles automatically.
    pub auto_sync_enabled: bool,
    /// Timer period in minutes (values below 1 are treated as 1).
    pub auto_sync_interval_minutes: u32,
    /// `;`-separated candidate vault directories; the first with `.git` wins.
    pub repositories: String,
    /// Moment-style format for status timestamps.
    pub time_format: String,
    pub git: GitConfig,
    pub debounce: DebounceSettings,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync_enabled: true,
            auto_sync_interval_minutes: 10,
            repositories: String::new(),
            time_format: "YYYY-MM-DD HH:mm:ss".into(),
            git: GitConfig::default(),
            debounce: DebounceSettings::default(),
        }
    }
}

impl SyncConfig {
    /// Load from `path`, returning defaults if the file doesn't exist or
    /// can't be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(config) => config,
            Err(ConfigError::Io(error)) if error.kind() == std::io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "using default config");
                Self::default()
            }
        }
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save to a specific path (creates parent directories).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Period of the repeating sync timer.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.auto_sync_interval_minutes.max(1)) * 60)
    }
}

/// Remote, branch and commit settings used to build `SyncOptions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GitConfig {
    pub remote: String,
    pub branch: String,
    /// Push with `--force`.
    pub force: bool,
    pub commit_message: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: DEFAULT_REMOTE.into(),
            branch: DEFAULT_BRANCH.into(),
            force: true,
            commit_message: DEFAULT_COMMIT_MESSAGE.into(),
        }
    }
}

/// Push debounce thresholds and the progress indicator grace delay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DebounceSettings {
    /// Minimum time since the last push before a modify event syncs.
    pub modify_push_secs: u64,
    /// Minimum time since the last push before a timer tick syncs.
    pub periodic_push_secs: u64,
    /// Delay before the in-progress indicator is cleared.
    pub progress_grace_ms: u64,
    /// Quiet window used to coalesce bursts of file events.
    pub file_event_window_ms: u64,
}

impl Default for DebounceSettings {
    fn default() -> Self {
        Self {
            modify_push_secs: 60,
            periodic_push_secs: 300,
            progress_grace_ms: 1500,
            file_event_window_ms: 250,
        }
    }
}

impl DebounceSettings {
    pub fn modify_push(&self) -> Duration {
        Duration::from_secs(self.modify_push_secs)
    }

    pub fn periodic_push(&self) -> Duration {
        Duration::from_secs(self.periodic_push_secs)
    }

    pub fn progress_grace(&self) -> Duration {
        Duration::from_millis(self.progress_grace_ms)
    }

    pub fn file_event_window(&self) -> Duration {
        Duration::from_millis(self.file_event_window_ms)
    }
}

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
