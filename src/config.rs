//! Configuration loading and management
//!
//! Handles parsing of `st.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::insight::{HttpInsights, InsightProvider, NoInsights, StaticInsights};
use crate::persist::DEFAULT_STORAGE_KEY;

pub const CONFIG_FILE_NAME: &str = "st.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where and under which key tasks are stored
    #[serde(default)]
    pub storage: StorageConfig,

    /// Notification scheduler settings
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Insight provider settings
    #[serde(default)]
    pub insights: InsightConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the task blob; platform data dir when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Storage key of the task blob
    #[serde(default = "default_storage_key")]
    pub key: String,

    /// How long a write waits for the file lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_lock_timeout_ms() -> u64 {
    crate::lock::DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: None,
            key: default_storage_key(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Minutes between evaluation passes
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
}

fn default_interval_minutes() -> u64 {
    30
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
        }
    }
}

/// Insight provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightConfig {
    /// `static`, `http` or `none`
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Knowledge box id; required for the http provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_box: Option<String>,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "static".to_string()
}

fn default_base_url() -> String {
    "https://nuclia.cloud/api/v1".to_string()
}

fn default_api_key_env() -> String {
    "ST_INSIGHTS_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            knowledge_box: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from an `st.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Platform config location (`~/.config/smart-tasks/st.toml` on Linux)
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "smart-tasks")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Load an explicit file, else the platform file if it exists, else defaults.
    ///
    /// An explicit path must exist; the platform file is optional.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.storage.validate()?;
        self.notifications.validate()?;
        self.insights.validate()?;
        Ok(())
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<()> {
        if self.key.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "storage.key cannot be empty".to_string(),
            ));
        }
        crate::storage::validate_key(&self.key)
            .map_err(|err| Error::InvalidConfig(format!("storage.key: {err}")))?;
        Ok(())
    }

    /// Directory the file store should use.
    pub fn resolve_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.dir {
            return Ok(dir.clone());
        }
        directories::ProjectDirs::from("", "", "smart-tasks")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                Error::OperationFailed(
                    "no home directory found; pass --store or set storage.dir".to_string(),
                )
            })
    }
}

impl NotificationConfig {
    fn validate(&self) -> Result<()> {
        if self.interval_minutes == 0 {
            return Err(Error::InvalidConfig(
                "notifications.interval_minutes must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }
}

impl InsightConfig {
    fn validate(&self) -> Result<()> {
        match self.provider.as_str() {
            "static" | "none" => {}
            "http" => {
                let missing = self
                    .knowledge_box
                    .as_deref()
                    .map(|kb| kb.trim().is_empty())
                    .unwrap_or(true);
                if missing {
                    return Err(Error::InvalidConfig(
                        "insights.knowledge_box is required for the http provider".to_string(),
                    ));
                }
                if self.base_url.trim().is_empty() {
                    return Err(Error::InvalidConfig(
                        "insights.base_url cannot be empty".to_string(),
                    ));
                }
            }
            other => {
                return Err(Error::InvalidConfig(format!(
                    "insights.provider: invalid value '{other}' (expected static|http|none)"
                )))
            }
        }
        if self.timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "insights.timeout_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the configured provider. The API key is read from the environment.
    pub fn build_provider(&self) -> Result<Arc<dyn InsightProvider>> {
        self.validate()?;
        match self.provider.as_str() {
            "none" => Ok(Arc::new(NoInsights)),
            "http" => {
                let knowledge_box = self.knowledge_box.clone().unwrap_or_default();
                let api_key = std::env::var(&self.api_key_env)
                    .ok()
                    .map(|key| key.trim().to_string())
                    .filter(|key| !key.is_empty());
                Ok(Arc::new(HttpInsights::new(
                    self.base_url.clone(),
                    knowledge_box,
                    api_key,
                    Duration::from_secs(self.timeout_secs),
                )))
            }
            _ => Ok(Arc::new(StaticInsights)),
        }
    }
}
