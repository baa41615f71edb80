/// Configuration for the Kanban client.
/// Reads client.json from ~/.config/kanban/client.json (or platform equivalent).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use kanban_core::types::ANONYMOUS_USER;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_host_api")]
    pub host_api: String,
    /// Sent as `userName` on scoped endpoints. Falls back to the user id, then "anonymous".
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_host_api() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host_api: default_host_api(),
            user_name: None,
            user_id: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn effective_user_name(&self) -> &str {
        self.user_id
            .as_deref()
            .or(self.user_name.as_deref())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(ANONYMOUS_USER)
    }
}

/// Default config path: ~/.config/kanban/client.json
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kanban")
        .join("client.json")
}

/// Load config from path. Returns default if file doesn't exist or doesn't parse.
pub fn load_config(path: &Path) -> ClientConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!(
                target: "kanban.client.config",
                "Failed to parse config {}: {}",
                path.display(),
                e
            );
            ClientConfig::default()
        }),
        Err(_) => {
            log::info!(
                target: "kanban.client.config",
                "No config at {}, using defaults",
                path.display()
            );
            ClientConfig::default()
        }
    }
}
