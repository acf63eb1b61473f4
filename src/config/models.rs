use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants::{DEFAULT_ENDPOINT, DEFAULT_IDLE_TIMEOUT_SECS, GREETING};
use super::defaults::*;

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Configuration {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GeneralConfig {
    #[serde(default)]
    pub verbose: bool,

    #[serde(default = "greeting")]
    pub greeting: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogConfig {
    #[serde(default = "log_level")]
    pub level: Option<String>,

    #[serde(default)]
    pub filters: Option<Vec<LogFilter>>,

    /// Logs go to stderr when no file is configured.
    #[serde(default)]
    pub file: Option<LogFile>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogFilter {
    #[serde(default)]
    pub module: Option<String>,

    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogFile {
    pub path: String,

    #[serde(default)]
    pub append: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct BackendConfig {
    #[serde(default)]
    pub alias: Option<String>,

    #[serde(default = "endpoint")]
    pub endpoint: String,

    /// Sent as a bearer token. `${VAR}` references are expanded.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Upper bound for receiving the response headers.
    #[serde(default)]
    pub timeout_secs: Option<u16>,

    /// Upper bound for the gap between two body chunks.
    #[serde(default = "idle_timeout_secs")]
    pub idle_timeout_secs: Option<u16>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub enum StorageConfig {
    #[serde(rename = "sqlite")]
    Sqlite(SqliteStorage),
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SqliteStorage {
    pub path: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SessionConfig {
    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub email: Option<String>,
}

impl BackendConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .map(|secs| Duration::from_secs(secs as u64))
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs
            .filter(|secs| *secs > 0)
            .map(|secs| Duration::from_secs(secs as u64))
    }
}

impl SqliteStorage {
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            greeting: Some(GREETING.to_string()),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Some("warn".to_string()),
            filters: None,
            file: None,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            alias: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            timeout_secs: None,
            idle_timeout_secs: Some(DEFAULT_IDLE_TIMEOUT_SECS),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Sqlite(SqliteStorage::default())
    }
}
