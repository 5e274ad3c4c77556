//! Client configuration.
//!
//! Layered resolution, lowest priority first:
//! 1. built-in defaults
//! 2. `config.toml` in the lanes config directory (or an explicit path)
//! 3. `LANES_*` environment variables
//! 4. CLI flags (applied by the caller via [`ClientConfig::with_server`])
//!
//! # File format
//!
//! ```toml
//! server_url = "http://localhost:5000"
//! # Derived from server_url when omitted:
//! # ws_url = "ws://localhost:5000/push"
//! timeout_secs = 30
//! message_page_size = 50
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MESSAGE_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Push-channel endpoint; derived from `server_url` when absent.
    #[serde(default)]
    pub ws_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_message_page_size")]
    pub message_page_size: u32,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_message_page_size() -> u32 {
    DEFAULT_MESSAGE_PAGE_SIZE
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            ws_url: None,
            timeout_secs: default_timeout_secs(),
            message_page_size: default_message_page_size(),
        }
    }
}

impl ClientConfig {
    /// Resolve the configuration: file (explicit path or the default
    /// location) layered under environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    /// `<user config dir>/lanes/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lanes").join("config.toml"))
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("LANES_SERVER_URL") {
            if !url.is_empty() {
                self.server_url = url;
            }
        }
        if let Ok(url) = std::env::var("LANES_WS_URL") {
            if !url.is_empty() {
                self.ws_url = Some(url);
            }
        }
        if let Ok(secs) = std::env::var("LANES_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                self.timeout_secs = secs;
            }
        }
    }

    /// CLI-flag override, the topmost layer.
    pub fn with_server(mut self, server_url: Option<&str>) -> Self {
        if let Some(url) = server_url {
            self.server_url = url.trim_end_matches('/').to_string();
            self.ws_url = None;
        }
        self
    }

    /// Base for HTTP API routes, e.g. `http://host:5000/api`.
    pub fn api_base(&self) -> String {
        format!("{}/api", self.server_url.trim_end_matches('/'))
    }

    /// Push-channel endpoint, derived from the server URL when not set
    /// explicitly (`http(s)://` becomes `ws(s)://`).
    pub fn ws_endpoint(&self) -> String {
        if let Some(url) = &self.ws_url {
            return url.clone();
        }
        let base = self.server_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            format!("ws://{base}")
        };
        format!("{ws_base}/push")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base(), "http://localhost:5000/api");
        assert_eq!(config.ws_endpoint(), "ws://localhost:5000/push");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "server_url = \"https://board.example.com\"\ntimeout_secs = 5\n",
        )
        .unwrap();
        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.api_base(), "https://board.example.com/api");
        assert_eq!(config.ws_endpoint(), "wss://board.example.com/push");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.message_page_size, 50);
    }

    #[test]
    fn explicit_ws_url_wins() {
        let config = ClientConfig {
            ws_url: Some("wss://push.example.com/socket".to_string()),
            ..Default::default()
        };
        assert_eq!(config.ws_endpoint(), "wss://push.example.com/socket");
    }

    #[test]
    fn cli_server_flag_is_topmost_and_resets_ws() {
        let config = ClientConfig {
            ws_url: Some("wss://push.example.com/socket".to_string()),
            ..Default::default()
        }
        .with_server(Some("http://10.0.0.2:8000/"));
        assert_eq!(config.api_base(), "http://10.0.0.2:8000/api");
        assert_eq!(config.ws_endpoint(), "ws://10.0.0.2:8000/push");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "server_url = [1, 2]").unwrap();
        assert!(ClientConfig::from_file(&path).is_err());
    }
}
