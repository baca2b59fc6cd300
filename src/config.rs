use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const ENV_API_URL: &str = "KWIZ_API_URL";
pub const ENV_TOKEN: &str = "KWIZ_TOKEN";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub token: Option<String>,
    /// `None` waits for the server indefinitely
    pub request_timeout_secs: Option<u64>,
    pub outbox_enabled: bool,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub history_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token: None,
            request_timeout_secs: None,
            outbox_enabled: true,
            retry_max_attempts: 3,
            retry_base_delay_ms: 500,
            history_enabled: true,
        }
    }
}

impl Config {
    /// Apply `KWIZ_API_URL` / `KWIZ_TOKEN` on top of the stored values
    pub fn with_env(self) -> Self {
        self.with_overrides(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_TOKEN).ok(),
        )
    }

    pub fn with_overrides(mut self, api_base_url: Option<String>, token: Option<String>) -> Self {
        if let Some(url) = api_base_url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.token = Some(token);
        }
        self
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "kwiz") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("kwiz_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => tracing::warn!(path = %self.path.display(), "ignoring unreadable config: {e}"),
            }
        }
        Config::default()
    }
}
